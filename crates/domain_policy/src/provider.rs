//! Underwriting provider request and response types
//!
//! The provider wraps every answer in a status envelope. Adapters decode that
//! envelope once into [`ProviderResponse`], so services match on a typed
//! value instead of probing fields.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::Money;

use crate::coverage::{CoverageCode, CoverageSelection, DocumentHandles};
use crate::error::PolicyError;
use crate::normalize::{phone_digits, provider_date, provider_datetime, region_name};
use crate::renter::RenterDetails;
use crate::trip::TripDetails;

/// Decoded provider envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProviderResponse<T> {
    /// The provider accepted the request
    Ok { data: T },
    /// The provider answered but rejected the request
    ProviderError { code: i64, message: String },
}

impl<T> ProviderResponse<T> {
    pub fn ok(data: T) -> Self {
        ProviderResponse::Ok { data }
    }

    pub fn rejected(code: i64, message: impl Into<String>) -> Self {
        ProviderResponse::ProviderError {
            code,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ProviderResponse::Ok { .. })
    }

    pub fn into_result(self) -> Result<T, ProviderRejection> {
        match self {
            ProviderResponse::Ok { data } => Ok(data),
            ProviderResponse::ProviderError { code, message } => {
                Err(ProviderRejection { code, message })
            }
        }
    }
}

/// Provider rejection carried out of a [`ProviderResponse`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRejection {
    pub code: i64,
    pub message: String,
}

/// Result of a credential exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthGrant {
    /// Absent when the provider answers "success" without a token
    pub token: Option<String>,
}

/// Renter fields in the provider's expected shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRenter {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub email: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub license_number: String,
    pub license_state: String,
}

/// A finalized quote request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteSubmission {
    /// Asks the provider to create the payment handle in the same call
    pub finalize: bool,
    pub coverages: Vec<CoverageCode>,
    pub trip_start: String,
    pub trip_end: String,
    pub pickup_state: String,
    pub renter: ProviderRenter,
}

impl QuoteSubmission {
    /// Normalizes a trip, selection, and renter snapshot into a submission
    ///
    /// # Errors
    ///
    /// Fails with a validation error when the renter lacks a street, ZIP, or
    /// phone; recovery callers apply
    /// [`RenterDetails::with_recovery_defaults`] first.
    pub fn finalized(
        trip: &TripDetails,
        selection: &CoverageSelection,
        renter: &RenterDetails,
    ) -> Result<Self, PolicyError> {
        let street = required(renter.address.street.as_deref(), "address.street")?;
        let zip = required(renter.address.zip.as_deref(), "address.zip")?;
        let phone = required(renter.phone.as_deref(), "phone")?;

        Ok(Self {
            finalize: true,
            coverages: selection.selected(),
            trip_start: provider_datetime(trip.start),
            trip_end: provider_datetime(trip.end),
            pickup_state: region_name(&trip.pickup_state),
            renter: ProviderRenter {
                first_name: renter.first_name.trim().to_string(),
                last_name: renter.last_name.trim().to_string(),
                date_of_birth: provider_date(renter.date_of_birth),
                email: renter.email.trim().to_string(),
                phone: phone_digits(phone),
                street: street.to_string(),
                city: renter.address.city.trim().to_string(),
                state: region_name(&renter.address.state),
                zip: zip.to_string(),
                country: renter.address.country.clone(),
                license_number: renter.license.number.trim().to_string(),
                license_state: region_name(&renter.license.state),
            },
        })
    }
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, PolicyError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| PolicyError::validation(format!("missing renter field: {}", field)))
}

/// Handles returned by a finalized quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteOutcome {
    pub quote_id: String,
    pub payment_id: Option<String>,
    /// Provider-priced premium, when it returned one
    pub total_amount: Option<Decimal>,
    /// Document handles some coverages carry from quote time
    #[serde(default)]
    pub documents: DocumentHandles,
}

/// Payment capture request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSubmission {
    pub payment_id: String,
    /// Two-decimal string, never a float
    pub amount: String,
}

impl PaymentSubmission {
    pub fn new(payment_id: impl Into<String>, amount: &Money) -> Self {
        Self {
            payment_id: payment_id.into(),
            amount: amount.round_to_currency().to_fixed_string(),
        }
    }
}

/// Issuance handles returned by a successful payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOutcome {
    pub policy_no: Option<String>,
    pub policy_id: Option<String>,
    #[serde(default)]
    pub documents: DocumentHandles,
}

/// Provider account funds for a tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceOutcome {
    pub balance: Decimal,
}

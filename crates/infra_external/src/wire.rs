//! Provider wire format
//!
//! Every provider answer is `{"status": <int>, "txt": <string>, "data": ...}`
//! where `status == 0` means success. Identifiers arrive as strings or
//! numbers depending on the endpoint, and amounts as strings or numbers.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::PortError;
use domain_policy::{
    AuthGrant, BalanceOutcome, CoverageCode, DocumentHandles, PaymentOutcome, PaymentSubmission,
    ProviderRenter, ProviderResponse, QuoteOutcome, QuoteSubmission,
};

/// Envelope status the provider uses for success
pub const STATUS_OK: i64 = 0;

#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub status: i64,
    #[serde(default)]
    pub txt: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Decodes the envelope into a typed response, mapping a success payload
    /// with `map`
    pub fn decode<U>(
        self,
        map: impl FnOnce(Option<T>) -> Result<U, PortError>,
    ) -> Result<ProviderResponse<U>, PortError> {
        if self.status == STATUS_OK {
            Ok(ProviderResponse::ok(map(self.data)?))
        } else {
            let message = self
                .txt
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| format!("provider returned status {}", self.status));
            Ok(ProviderResponse::rejected(self.status, message))
        }
    }
}

/// Identifier sent as either a JSON string or number
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Text(String),
    Number(i64),
}

impl WireId {
    fn into_string(self) -> Option<String> {
        match self {
            WireId::Text(s) if s.trim().is_empty() => None,
            WireId::Text(s) => Some(s),
            WireId::Number(n) => Some(n.to_string()),
        }
    }
}

fn documents(pdfs: BTreeMap<String, String>) -> DocumentHandles {
    pdfs.into_iter()
        .filter_map(|(code, handle)| {
            CoverageCode::ALL
                .into_iter()
                .find(|c| c.code().eq_ignore_ascii_case(code.trim()))
                .map(|c| (c, handle))
        })
        .collect()
}

fn missing_data(operation: &str) -> PortError {
    PortError::transformation(format!("{} succeeded without a data payload", operation))
}

// ============================================================================
// Authentication
// ============================================================================

#[derive(Debug, Serialize)]
pub struct WireCredentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct WireAuthData {
    #[serde(default)]
    pub token: Option<String>,
}

/// A success without `data` or without a token decodes to an empty grant;
/// the session decides that is an authentication failure.
pub fn auth_grant(data: Option<WireAuthData>) -> Result<AuthGrant, PortError> {
    Ok(AuthGrant {
        token: data.and_then(|d| d.token).filter(|t| !t.trim().is_empty()),
    })
}

// ============================================================================
// Quotes
// ============================================================================

#[derive(Debug, Serialize)]
pub struct WireTrip<'a> {
    pub start: &'a str,
    pub end: &'a str,
    pub pickup_state: &'a str,
}

#[derive(Debug, Serialize)]
pub struct WireQuoteRequest<'a> {
    /// 1 asks the provider to create the payment handle in the same call
    pub finalize: u8,
    pub products: Vec<&'static str>,
    pub trip: WireTrip<'a>,
    pub renter: &'a ProviderRenter,
}

impl<'a> From<&'a QuoteSubmission> for WireQuoteRequest<'a> {
    fn from(submission: &'a QuoteSubmission) -> Self {
        Self {
            finalize: u8::from(submission.finalize),
            products: submission.coverages.iter().map(|c| c.code()).collect(),
            trip: WireTrip {
                start: &submission.trip_start,
                end: &submission.trip_end,
                pickup_state: &submission.pickup_state,
            },
            renter: &submission.renter,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireQuoteData {
    pub quote_id: Option<WireId>,
    #[serde(default)]
    pub payment_id: Option<WireId>,
    #[serde(default)]
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub pdfs: BTreeMap<String, String>,
}

pub fn quote_outcome(data: Option<WireQuoteData>) -> Result<QuoteOutcome, PortError> {
    let data = data.ok_or_else(|| missing_data("create_quote"))?;
    Ok(QuoteOutcome {
        quote_id: data.quote_id.and_then(WireId::into_string).unwrap_or_default(),
        payment_id: data.payment_id.and_then(WireId::into_string),
        total_amount: data.total_amount,
        documents: documents(data.pdfs),
    })
}

// ============================================================================
// Payments
// ============================================================================

#[derive(Debug, Serialize)]
pub struct WirePaymentRequest<'a> {
    pub payment_id: &'a str,
    pub amount: &'a str,
}

impl<'a> From<&'a PaymentSubmission> for WirePaymentRequest<'a> {
    fn from(submission: &'a PaymentSubmission) -> Self {
        Self {
            payment_id: &submission.payment_id,
            amount: &submission.amount,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WirePaymentData {
    #[serde(default)]
    pub policy_no: Option<WireId>,
    #[serde(default)]
    pub policy_id: Option<WireId>,
    #[serde(default)]
    pub pdfs: BTreeMap<String, String>,
}

pub fn payment_outcome(data: Option<WirePaymentData>) -> Result<PaymentOutcome, PortError> {
    let data = data.ok_or_else(|| missing_data("submit_payment"))?;
    Ok(PaymentOutcome {
        policy_no: data.policy_no.and_then(WireId::into_string),
        policy_id: data.policy_id.and_then(WireId::into_string),
        documents: documents(data.pdfs),
    })
}

// ============================================================================
// Balance
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct WireBalanceData {
    pub balance: Decimal,
}

pub fn balance_outcome(data: Option<WireBalanceData>) -> Result<BalanceOutcome, PortError> {
    let data = data.ok_or_else(|| missing_data("balance"))?;
    Ok(BalanceOutcome { balance: data.balance })
}

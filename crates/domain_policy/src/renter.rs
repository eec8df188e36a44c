//! Renter identity snapshot
//!
//! The booking wizard supplies the renter's identity once. The pipeline
//! stores it on the policy record as an immutable snapshot so a lost
//! payment handle can be recovered by replaying the original quote request,
//! without re-reading customer tables that may have changed since.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::PolicyError;

/// Street used when an older snapshot has no street line
pub const FALLBACK_STREET: &str = "Address not provided";
/// ZIP used when an older snapshot has no postal code
pub const FALLBACK_ZIP: &str = "00000";
/// Phone used when an older snapshot has no phone number
pub const FALLBACK_PHONE: &str = "0000000000";

fn default_country() -> String {
    "US".to_string()
}

/// Postal address of the renter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PostalAddress {
    #[validate(length(min = 1, message = "street is required"))]
    pub street: Option<String>,
    #[validate(length(min = 1, message = "city is required"))]
    pub city: String,
    /// Two-letter region code or full region name
    #[validate(length(min = 1, message = "state is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "zip is required"))]
    pub zip: Option<String>,
    #[serde(default = "default_country")]
    pub country: String,
}

/// Driver license of the renter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct DriverLicense {
    #[validate(length(min = 1, message = "license number is required"))]
    pub number: String,
    #[validate(length(min = 1, message = "license state is required"))]
    pub state: String,
}

/// Renter identity bundle captured at quote time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RenterDetails {
    #[validate(length(min = 1, message = "first name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "last name is required"))]
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: Option<String>,
    #[validate(nested)]
    pub address: PostalAddress,
    #[validate(nested)]
    pub license: DriverLicense,
}

impl RenterDetails {
    /// Full name in "First Last" format
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }

    /// Lists required fields that are absent or blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.first_name) {
            missing.push("first_name");
        }
        if is_blank(&self.last_name) {
            missing.push("last_name");
        }
        if is_blank(&self.email) {
            missing.push("email");
        }
        if is_blank_opt(&self.phone) {
            missing.push("phone");
        }
        if is_blank_opt(&self.address.street) {
            missing.push("address.street");
        }
        if is_blank(&self.address.city) {
            missing.push("address.city");
        }
        if is_blank(&self.address.state) {
            missing.push("address.state");
        }
        if is_blank_opt(&self.address.zip) {
            missing.push("address.zip");
        }
        if is_blank(&self.license.number) {
            missing.push("license.number");
        }
        if is_blank(&self.license.state) {
            missing.push("license.state");
        }
        missing
    }

    /// Presence checks performed before a quote is requested
    pub fn validate_for_quote(&self) -> Result<(), PolicyError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(PolicyError::validation(format!(
                "missing renter fields: {}",
                missing.join(", ")
            )));
        }
        self.validate()
            .map_err(|e| PolicyError::validation(format!("invalid renter details: {}", e)))
    }

    /// Returns a copy with placeholders for the optional fields older
    /// snapshots may lack, so a replayed quote can still be finalized
    pub fn with_recovery_defaults(&self) -> RenterDetails {
        let mut renter = self.clone();
        if is_blank_opt(&renter.address.street) {
            renter.address.street = Some(FALLBACK_STREET.to_string());
        }
        if is_blank_opt(&renter.address.zip) {
            renter.address.zip = Some(FALLBACK_ZIP.to_string());
        }
        if is_blank_opt(&renter.phone) {
            renter.phone = Some(FALLBACK_PHONE.to_string());
        }
        renter
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn is_blank_opt(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, is_blank)
}

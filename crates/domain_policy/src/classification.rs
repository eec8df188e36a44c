//! Payment failure classification
//!
//! The underwriting provider reports every rejection as free text. Funding
//! problems are told apart from hard failures by keyword, and this module is
//! the only place that keyword list lives.

use serde::{Deserialize, Serialize};

use crate::aggregate::PolicyStatus;

/// Keywords that mark a provider message as a funding problem
pub const BALANCE_KEYWORDS: [&str; 5] = ["insufficient", "balance", "fund", "credit", "allocate"];

/// Outcome of classifying a failure message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// The tenant's provider account lacks funds; retryable after top-up
    InsufficientBalance,
    /// Any other failure; needs manual intervention
    Other,
}

impl FailureClass {
    /// Record status a failure of this class leaves behind
    pub fn status(&self) -> PolicyStatus {
        match self {
            FailureClass::InsufficientBalance => PolicyStatus::InsufficientBalance,
            FailureClass::Other => PolicyStatus::Failed,
        }
    }
}

/// Classifies a provider or transport failure message
///
/// Matching is case-insensitive and substring-based, so "Insufficient funds"
/// and "credit limit exceeded" both classify as a balance problem.
pub fn classify(message: &str) -> FailureClass {
    let lowered = message.to_lowercase();
    if BALANCE_KEYWORDS.iter().any(|keyword| lowered.contains(keyword)) {
        FailureClass::InsufficientBalance
    } else {
        FailureClass::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_table() {
        let cases = [
            ("insufficient funds", FailureClass::InsufficientBalance),
            ("Insufficient Funds in account", FailureClass::InsufficientBalance),
            ("account balance too low", FailureClass::InsufficientBalance),
            ("Unable to fund policy", FailureClass::InsufficientBalance),
            ("credit limit exceeded", FailureClass::InsufficientBalance),
            ("could not allocate payment", FailureClass::InsufficientBalance),
            ("BALANCE", FailureClass::InsufficientBalance),
            ("invalid license", FailureClass::Other),
            ("quote expired", FailureClass::Other),
            ("Timeout after 8000ms: submit_payment", FailureClass::Other),
            ("", FailureClass::Other),
        ];

        for (message, expected) in cases {
            assert_eq!(classify(message), expected, "message: {:?}", message);
        }
    }

    #[test]
    fn test_class_maps_to_status() {
        assert_eq!(FailureClass::InsufficientBalance.status(), PolicyStatus::InsufficientBalance);
        assert_eq!(FailureClass::Other.status(), PolicyStatus::Failed);
    }
}

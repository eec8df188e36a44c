//! Custom Test Assertions
//!
//! Assertion helpers with messages that name the domain values involved.

use rust_decimal::Decimal;

use core_kernel::Money;
use domain_policy::{PolicyError, PolicyRecord, PolicyStatus};

/// Asserts a Money value against its two-decimal string form
///
/// # Panics
///
/// Panics if the rounded amount differs from `expected`
pub fn assert_money_eq(actual: &Money, expected: &str) {
    assert_eq!(
        actual.to_fixed_string(),
        expected,
        "Expected {} {}, got {}",
        expected,
        actual.currency(),
        actual
    );
}

/// Asserts that a Money value has at most the currency's decimal places
pub fn assert_money_rounded(money: &Money) {
    assert!(
        money.amount().scale() <= money.currency().decimal_places(),
        "Expected at most {} decimal places, got {}",
        money.currency().decimal_places(),
        money.amount()
    );
}

/// Asserts a record's status, printing its failure reason on mismatch
pub fn assert_status(record: &PolicyRecord, expected: PolicyStatus) {
    assert_eq!(
        record.status(),
        expected,
        "Policy record {} is {} (failure_reason: {:?}), expected {}",
        record.id(),
        record.status(),
        record.failure_reason(),
        expected
    );
}

/// Asserts an InsufficientBalance error and returns its observed balance
pub fn assert_insufficient_balance(error: &PolicyError, required: Decimal) -> Option<Decimal> {
    match error {
        PolicyError::InsufficientBalance {
            observed_balance,
            required: actual_required,
            ..
        } => {
            assert_eq!(*actual_required, required, "required premium mismatch");
            *observed_balance
        }
        other => panic!("Expected InsufficientBalance, got {:?}", other),
    }
}

/// Asserts a PaymentFailed error whose message contains `needle`
pub fn assert_payment_failed(error: &PolicyError, needle: &str) {
    match error {
        PolicyError::PaymentFailed(message) => assert!(
            message.to_lowercase().contains(&needle.to_lowercase()),
            "Expected payment failure mentioning '{}', got '{}'",
            needle,
            message
        ),
        other => panic!("Expected PaymentFailed, got {:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    #[test]
    fn test_assert_money_eq() {
        assert_money_eq(&Money::new(dec!(141.39), Currency::USD), "141.39");
    }

    #[test]
    #[should_panic(expected = "Expected InsufficientBalance")]
    fn test_assert_insufficient_balance_rejects_other_errors() {
        assert_insufficient_balance(&PolicyError::PaymentFailed("declined".to_string()), dec!(1));
    }

    #[test]
    fn test_assert_payment_failed_is_case_insensitive() {
        assert_payment_failed(&PolicyError::PaymentFailed("Invalid License".to_string()), "invalid license");
    }
}

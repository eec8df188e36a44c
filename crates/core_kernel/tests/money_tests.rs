//! Money Tests
//!
//! # Test Organization
//!
//! - `creation` - constructors and provider string parsing
//! - `predicates` - zero and sign checks
//! - `arithmetic` - same-currency addition and daily-rate scaling
//! - `rounding_and_display` - cents rounding and the fixed-point form
//! - `currency` - ISO code parsing and serialization

use core_kernel::{Money, Currency, MoneyError};
use rust_decimal_macros::dec;

mod creation {
    use super::*;

    #[test]
    fn test_new_rounds_to_four_decimal_places() {
        let m = Money::new(dec!(100.123456789), Currency::USD);
        assert_eq!(m.amount(), dec!(100.1235));
    }

    #[test]
    fn test_from_minor_converts_cents_correctly() {
        let m = Money::from_minor(8085, Currency::USD);
        assert_eq!(m.amount(), dec!(80.85));
    }

    #[test]
    fn test_zero_creates_zero_amount() {
        let m = Money::zero(Currency::CAD);
        assert!(m.is_zero());
        assert_eq!(m.currency(), Currency::CAD);
    }

    #[test]
    fn test_parse_accepts_provider_amounts() {
        let m = Money::parse(" 141.39 ", Currency::USD).unwrap();
        assert_eq!(m.amount(), dec!(141.39));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let result = Money::parse("12,00", Currency::USD);
        assert!(matches!(result, Err(MoneyError::InvalidAmount(_))));
    }
}

mod predicates {
    use super::*;

    #[test]
    fn test_is_negative_true_for_negative_amount() {
        assert!(Money::new(dec!(-0.01), Currency::USD).is_negative());
    }

    #[test]
    fn test_zero_is_not_negative() {
        let m = Money::zero(Currency::USD);
        assert!(m.is_zero());
        assert!(!m.is_negative());
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_checked_add_same_currency() {
        let a = Money::new(dec!(80.85), Currency::USD);
        let b = Money::new(dec!(60.54), Currency::USD);
        assert_eq!(a.checked_add(&b).unwrap().amount(), dec!(141.39));
    }

    #[test]
    fn test_checked_add_currency_mismatch() {
        let premium = Money::new(dec!(141.39), Currency::USD);
        let fee = Money::new(dec!(1), Currency::CAD);
        assert!(matches!(premium.checked_add(&fee), Err(MoneyError::CurrencyMismatch(_, _))));
    }

    #[test]
    fn test_multiply_daily_rate_by_days() {
        let rate = Money::new(dec!(20.18), Currency::USD);
        assert_eq!(rate.multiply(dec!(3)).amount(), dec!(60.54));
    }
}

mod rounding_and_display {
    use super::*;

    #[test]
    fn test_round_to_currency_half_up() {
        let m = Money::new(dec!(2.345), Currency::USD).round_to_currency();
        assert_eq!(m.amount(), dec!(2.35));
    }

    #[test]
    fn test_fixed_string_has_two_places() {
        assert_eq!(Money::new(dec!(50), Currency::USD).to_fixed_string(), "50.00");
        assert_eq!(Money::new(dec!(141.391), Currency::USD).to_fixed_string(), "141.39");
    }

    #[test]
    fn test_display_includes_symbol() {
        let m = Money::new(dec!(141.39), Currency::USD);
        assert_eq!(m.to_string(), "$141.39");
    }
}

mod currency {
    use super::*;

    #[test]
    fn test_currency_parses_case_insensitively() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::USD);
        assert!(matches!("XYZ".parse::<Currency>(), Err(MoneyError::UnknownCurrency(_))));
    }

    #[test]
    fn test_currency_json_roundtrip() {
        let json = serde_json::to_string(&Currency::CAD).unwrap();
        assert_eq!(json, "\"CAD\"");
    }
}

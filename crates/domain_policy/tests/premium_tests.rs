//! Premium Calculator Tests
//!
//! # Test Organization
//!
//! - `rate_table_tests` - fixed scenarios against the standard table
//! - `property_tests` - invariants over arbitrary selections and durations

use domain_policy::{CoverageCode, CoverageSelection, PremiumCalculator, RateTable};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ============================================================================
// RATE TABLE
// ============================================================================

mod rate_table_tests {
    use super::*;

    #[test]
    fn test_single_day_of_everything() {
        let calculator = PremiumCalculator::default();
        let premium = calculator.calculate(&CoverageSelection::of(&CoverageCode::ALL), 1);

        assert_eq!(premium.total.amount(), dec!(68.03));
        assert_eq!(premium.breakdown.len(), 4);
    }

    #[test]
    fn test_zero_days_bills_one_day() {
        let calculator = PremiumCalculator::default();
        let premium = calculator.calculate(&CoverageSelection::of(&[CoverageCode::Sli]), 0);

        assert_eq!(premium.days, 1);
        assert_eq!(premium.total.amount(), dec!(13.95));
    }

    #[test]
    fn test_unselected_line_is_zero() {
        let calculator = PremiumCalculator::default();
        let premium = calculator.calculate(&CoverageSelection::of(&[CoverageCode::Cdw]), 3);

        assert_eq!(premium.line(CoverageCode::Cdw).amount(), dec!(80.85));
        assert!(premium.line(CoverageCode::Pai).is_zero());
    }

    #[test]
    fn test_fractional_rates_round_per_line() {
        let rates = RateTable::standard()
            .with_rate(CoverageCode::Cdw, dec!(10.005))
            .with_rate(CoverageCode::Rcli, dec!(10.005));
        let calculator = PremiumCalculator::new(rates);

        let premium = calculator.calculate(
            &CoverageSelection::of(&[CoverageCode::Cdw, CoverageCode::Rcli]),
            1,
        );

        assert_eq!(premium.line(CoverageCode::Cdw).amount(), dec!(10.01));
        assert_eq!(premium.total.amount(), dec!(20.02));
    }
}

// ============================================================================
// PROPERTIES
// ============================================================================

mod property_tests {
    use super::*;

    fn selection_strategy() -> impl Strategy<Value = CoverageSelection> {
        (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
            |(cdw, rcli, sli, pai)| CoverageSelection { cdw, rcli, sli, pai },
        )
    }

    proptest! {
        #[test]
        fn total_equals_sum_of_breakdown(selection in selection_strategy(), days in 1u32..400) {
            let premium = PremiumCalculator::default().calculate(&selection, days);
            let sum: Decimal = premium.breakdown.values().map(|m| m.amount()).sum();
            prop_assert_eq!(premium.total.amount(), sum);
        }

        #[test]
        fn total_has_at_most_two_decimals(selection in selection_strategy(), days in 1u32..400) {
            let premium = PremiumCalculator::default().calculate(&selection, days);
            prop_assert_eq!(premium.total.amount(), premium.total.amount().round_dp(2));
        }

        #[test]
        fn calculation_is_deterministic(selection in selection_strategy(), days in 0u32..400) {
            let calculator = PremiumCalculator::default();
            prop_assert_eq!(calculator.calculate(&selection, days), calculator.calculate(&selection, days));
        }

        #[test]
        fn no_coverage_is_free(days in 0u32..400) {
            let premium = PremiumCalculator::default().calculate(&CoverageSelection::default(), days);
            prop_assert!(premium.total.is_zero());
            prop_assert!(premium.breakdown.is_empty());
        }

        #[test]
        fn longer_rentals_never_cost_less(selection in selection_strategy(), days in 1u32..400) {
            let calculator = PremiumCalculator::default();
            let shorter = calculator.calculate(&selection, days).total.amount();
            let longer = calculator.calculate(&selection, days + 1).total.amount();
            prop_assert!(longer >= shorter);
        }
    }
}

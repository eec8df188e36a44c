//! Property-Based Test Generators
//!
//! Proptest strategies that respect the pipeline's invariants: selections
//! have at least one coverage, trips end after they start, and premiums are
//! never negative.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::{Currency, Money};
use domain_policy::{CoverageCode, CoverageSelection, TripDetails};

/// Any coverage code
pub fn coverage_code_strategy() -> impl Strategy<Value = CoverageCode> {
    prop::sample::select(CoverageCode::ALL.to_vec())
}

/// Any of the 16 coverage combinations, including the empty one
pub fn any_selection_strategy() -> impl Strategy<Value = CoverageSelection> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(cdw, rcli, sli, pai)| {
        CoverageSelection { cdw, rcli, sli, pai }
    })
}

/// A selection with at least one coverage
pub fn selection_strategy() -> impl Strategy<Value = CoverageSelection> {
    any_selection_strategy().prop_filter("at least one coverage", CoverageSelection::any)
}

/// Billable rental days from one day to a quarter year
pub fn rental_days_strategy() -> impl Strategy<Value = u32> {
    1u32..=90
}

/// A valid trip: any pickup hour in 2024, any length up to 90 days in minutes
pub fn trip_strategy() -> impl Strategy<Value = TripDetails> {
    (0i64..(366 * 24), 1i64..(90 * 24 * 60), prop::sample::select(vec!["FL", "CA", "NY", "Texas"]))
        .prop_map(|(start_hour, minutes, state)| {
            let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(start_hour);
            TripDetails::new(start, start + Duration::minutes(minutes), state)
        })
}

/// A daily rate between 0.01 and 500.00 with up to three decimals
pub fn daily_rate_strategy() -> impl Strategy<Value = Decimal> {
    (10u32..500_000u32).prop_map(|n| Decimal::new(n as i64, 3))
}

/// A non-negative USD amount
pub fn usd_money_strategy() -> impl Strategy<Value = Money> {
    (0i64..10_000_000i64).prop_map(|minor| Money::from_minor(minor, Currency::USD))
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn test_selection_strategy_never_empty(selection in selection_strategy()) {
            prop_assert!(selection.any());
        }

        #[test]
        fn test_trip_strategy_is_valid(trip in trip_strategy()) {
            prop_assert!(trip.validate().is_ok());
            prop_assert!(trip.rental_days() >= 1);
        }
    }
}

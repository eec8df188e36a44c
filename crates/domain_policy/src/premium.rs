//! Fallback premium rating
//!
//! The provider normally prices the quote itself. This calculator produces
//! the premium from a fixed per-coverage daily rate table when the provider
//! returns no usable amount, and serves as the sanity fallback when a quote
//! has to be replayed during payment recovery.
//!
//! Rounding happens per coverage line (to the currency's minor unit), then
//! the rounded lines are summed and the sum is rounded again, so the total
//! always equals the sum of the breakdown to the cent.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use core_kernel::{Currency, Money};

use crate::coverage::{CoverageCode, CoverageSelection};

/// Daily rates per coverage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTable {
    currency: Currency,
    daily: BTreeMap<CoverageCode, Decimal>,
}

impl RateTable {
    /// Standard USD daily rates
    pub fn standard() -> Self {
        let daily = BTreeMap::from([
            (CoverageCode::Cdw, dec!(26.95)),
            (CoverageCode::Rcli, dec!(20.18)),
            (CoverageCode::Sli, dec!(13.95)),
            (CoverageCode::Pai, dec!(6.95)),
        ]);
        Self {
            currency: Currency::USD,
            daily,
        }
    }

    /// Overrides the daily rate of one coverage
    pub fn with_rate(mut self, code: CoverageCode, daily_rate: Decimal) -> Self {
        self.daily.insert(code, daily_rate);
        self
    }

    /// Currency the table is denominated in
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Daily rate for a coverage; coverages missing from the table rate at zero
    pub fn daily_rate(&self, code: CoverageCode) -> Money {
        let rate = self.daily.get(&code).copied().unwrap_or(Decimal::ZERO);
        Money::new(rate, self.currency)
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Result of a premium calculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumCalculation {
    pub total: Money,
    /// One line per selected coverage
    pub breakdown: BTreeMap<CoverageCode, Money>,
    pub days: u32,
}

impl PremiumCalculation {
    /// Line amount for a coverage, zero when it was not selected
    pub fn line(&self, code: CoverageCode) -> Money {
        self.breakdown
            .get(&code)
            .copied()
            .unwrap_or_else(|| Money::zero(self.total.currency()))
    }
}

/// Deterministic premium calculator over a [`RateTable`]
#[derive(Debug, Clone, Default)]
pub struct PremiumCalculator {
    rates: RateTable,
}

impl PremiumCalculator {
    pub fn new(rates: RateTable) -> Self {
        Self { rates }
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    /// Calculates the premium for a selection over a number of whole days
    ///
    /// A selection with no coverage yields a zero total and an empty
    /// breakdown; "no insurance" is a valid outcome here. Day counts below
    /// one are billed as one day.
    pub fn calculate(&self, selection: &CoverageSelection, days: u32) -> PremiumCalculation {
        let days = days.max(1);
        let currency = self.rates.currency();

        let breakdown: BTreeMap<CoverageCode, Money> = selection
            .selected()
            .into_iter()
            .map(|code| {
                let line = self
                    .rates
                    .daily_rate(code)
                    .multiply(Decimal::from(days))
                    .round_to_currency();
                (code, line)
            })
            .collect();

        let sum: Decimal = breakdown.values().map(|line| line.amount()).sum();
        let total = Money::new(sum, currency).round_to_currency();

        PremiumCalculation {
            total,
            breakdown,
            days,
        }
    }
}

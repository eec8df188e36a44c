//! Money types with precise decimal arithmetic
//!
//! Premiums, balances, and payment amounts all travel as `Money` so that no
//! value ever passes through a binary floating-point type. Intermediate
//! amounts keep four decimal places; [`Money::round_to_currency`] settles
//! them to cents before they are persisted or sent to the provider.

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scale kept for intermediate amounts
const WORKING_SCALE: u32 = 4;

/// Currencies rental tenants bill in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    USD,
    CAD,
}

impl Currency {
    /// Digits after the decimal point of the minor unit
    pub fn decimal_places(&self) -> u32 {
        2
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "$",
            Currency::CAD => "C$",
        }
    }

    /// ISO 4217 code, as stored in `policy_records.currency`
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::CAD => "CAD",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.eq_ignore_ascii_case("USD") {
            Ok(Currency::USD)
        } else if code.eq_ignore_ascii_case("CAD") {
            Ok(Currency::CAD)
        } else {
            Err(MoneyError::UnknownCurrency(code.to_string()))
        }
    }
}

/// Errors from money construction and arithmetic
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Currency mismatch: cannot combine {0} with {1}")]
    CurrencyMismatch(Currency, Currency),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),
}

/// A monetary amount in one currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: amount.round_dp(WORKING_SCALE),
            currency,
        }
    }

    /// Builds an amount from cents (or the currency's minor unit)
    pub fn from_minor(minor_units: i64, currency: Currency) -> Self {
        Self::new(Decimal::new(minor_units, currency.decimal_places()), currency)
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    /// Parses a decimal string such as the provider's `"141.39"`
    pub fn parse(amount: &str, currency: Currency) -> Result<Self, MoneyError> {
        Decimal::from_str(amount.trim())
            .map(|value| Self::new(value, currency))
            .map_err(|_| MoneyError::InvalidAmount(amount.to_string()))
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    /// Rounds to the minor unit, half away from zero (2.345 becomes 2.35)
    pub fn round_to_currency(&self) -> Self {
        let cents = self.amount.round_dp_with_strategy(
            self.currency.decimal_places(),
            RoundingStrategy::MidpointAwayFromZero,
        );
        Self::new(cents, self.currency)
    }

    /// Adds two amounts of the same currency
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(self.currency, other.currency));
        }
        Ok(Self::new(self.amount + other.amount, self.currency))
    }

    /// Scales the amount, e.g. a daily rate by a day count
    pub fn multiply(&self, factor: Decimal) -> Self {
        Self::new(self.amount * factor, self.currency)
    }

    /// Rounded amount with exactly the currency's decimal places
    ///
    /// This is the string form the underwriting provider and the API
    /// exchange: `50` becomes `"50.00"`.
    pub fn to_fixed_string(&self) -> String {
        let places = self.currency.decimal_places() as usize;
        format!("{:.*}", places, self.round_to_currency().amount)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.currency.symbol(), self.to_fixed_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_minor() {
        assert_eq!(Money::from_minor(14139, Currency::USD).amount(), dec!(141.39));
    }

    #[test]
    fn test_mismatch_names_both_currencies() {
        let usd = Money::new(dec!(1), Currency::USD);
        let cad = Money::new(dec!(1), Currency::CAD);

        let err = usd.checked_add(&cad).unwrap_err();
        assert_eq!(err, MoneyError::CurrencyMismatch(Currency::USD, Currency::CAD));
        assert_eq!(err.to_string(), "Currency mismatch: cannot combine USD with CAD");
    }

    #[test]
    fn test_fixed_string_pads_decimals() {
        assert_eq!(Money::new(dec!(141.4), Currency::USD).to_fixed_string(), "141.40");
        assert_eq!(Money::zero(Currency::USD).to_fixed_string(), "0.00");
    }

    #[test]
    fn test_rounding_midpoint() {
        let m = Money::new(dec!(10.005), Currency::USD).round_to_currency();
        assert_eq!(m.amount(), dec!(10.01));
    }
}

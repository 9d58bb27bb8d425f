//! Integer minor-unit money and the two rounding boundaries.
//!
//! Every stored or compared monetary amount is a whole number of pence.
//! Decimals appear only at the edges: parsing pounds-denominated user input
//! and applying a fractional commission rate. Both edges round half-up.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use thiserror::Error;

/// A monetary amount in pence.
///
/// Serializes to a plain JSON integer.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Pence(pub i64);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("amount {0} is not representable in whole pence")]
    NotRepresentable(Decimal),
    #[error("rate must be between 0 and 1, got {0}")]
    RateOutOfRange(Decimal),
    #[error("invalid rate: {0}")]
    InvalidRate(String),
}

impl Pence {
    pub const ZERO: Pence = Pence(0);

    pub fn new(pence: i64) -> Self {
        Pence(pence)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// Convert a pounds-denominated decimal amount to whole pence.
    ///
    /// Multiplies by 100 and rounds half-up (ties away from zero). User input
    /// carries at most two decimal places, so rounding only fires on
    /// sub-penny fractions.
    ///
    /// # Errors
    /// Returns an error if the scaled amount does not fit in an `i64`.
    pub fn from_pounds(pounds: Decimal) -> Result<Self, MoneyError> {
        let scaled = (pounds * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        scaled
            .to_i64()
            .map(Pence)
            .ok_or(MoneyError::NotRepresentable(pounds))
    }

    /// Convert back to pounds. Exact, no rounding.
    pub fn to_pounds(&self) -> Decimal {
        Decimal::from(self.0) / Decimal::ONE_HUNDRED
    }

    /// Multiply by a fractional rate, rounding half-up to whole pence.
    ///
    /// This is the only place a stored amount meets a decimal rate: the 10%
    /// telesales split and the BDM excess payout.
    pub fn apply_rate(&self, rate: Rate) -> Pence {
        let product = (Decimal::from(self.0) * rate.0)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        // |rate| <= 1, so the product magnitude never exceeds the input.
        let pence = product
            .to_i64()
            .expect("rate-scaled pence fits in i64 because rate <= 1");
        Pence(pence)
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for Pence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}p", self.0)
    }
}

impl std::ops::Add for Pence {
    type Output = Pence;

    fn add(self, rhs: Pence) -> Pence {
        Pence(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Pence {
    type Output = Pence;

    fn sub(self, rhs: Pence) -> Pence {
        Pence(self.0 - rhs.0)
    }
}

impl Sum for Pence {
    fn sum<I: Iterator<Item = Pence>>(iter: I) -> Pence {
        Pence(iter.map(|p| p.0).sum())
    }
}

/// A commission rate as a decimal fraction in `[0, 1]`.
///
/// Serializes to a JSON number (e.g. `0.1`), persisted as a canonical
/// decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rate(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Rate {
    /// The 100% rate.
    pub const ONE: Rate = Rate(Decimal::ONE);

    /// Validate a decimal fraction into a rate.
    ///
    /// # Errors
    /// Returns an error if the value falls outside `[0, 1]`.
    pub fn try_new(value: Decimal) -> Result<Self, MoneyError> {
        if value < Decimal::ZERO || value > Decimal::ONE {
            return Err(MoneyError::RateOutOfRange(value));
        }
        Ok(Rate(value))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Format as a canonical string (no exponent, no trailing zeros).
    pub fn to_canonical_string(&self) -> String {
        format!("{}", self.0.normalize())
    }

    /// Parse a rate from its canonical string form.
    ///
    /// # Errors
    /// Returns an error if the string is not a decimal in `[0, 1]`.
    pub fn from_str_canonical(s: &str) -> Result<Self, MoneyError> {
        use std::str::FromStr;
        let value = Decimal::from_str(s).map_err(|_| MoneyError::InvalidRate(s.to_string()))?;
        Rate::try_new(value)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

//! Exact monetary amounts.
//!
//! Amounts are held as [Decimal] values with two decimal places and stored in
//! the database as whole cents, so that sums and comparisons in SQL are exact.

use std::{fmt::Display, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Error;

/// The number of decimal places an amount is stored with.
pub const AMOUNT_SCALE: u32 = 2;

/// The maximum number of significant digits (including the decimal places) an amount may have.
pub const MAX_AMOUNT_DIGITS: u32 = 12;

/// A strictly positive amount of money with at most two decimal places and
/// at most twelve significant digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    /// Create a validated amount.
    ///
    /// # Errors
    ///
    /// Returns an [Error::NonPositiveAmount] if `value` is zero or negative, or
    /// an [Error::InvalidAmount] if `value` has more than two decimal places or
    /// more than twelve significant digits.
    pub fn new(value: Decimal) -> Result<Self, Error> {
        if value <= Decimal::ZERO {
            return Err(Error::NonPositiveAmount);
        }

        if value.normalize().scale() > AMOUNT_SCALE {
            return Err(Error::InvalidAmount(format!(
                "{value} has more than {AMOUNT_SCALE} decimal places"
            )));
        }

        let mut rescaled = value;
        rescaled.rescale(AMOUNT_SCALE);

        if count_digits(rescaled.mantissa()) > MAX_AMOUNT_DIGITS {
            return Err(Error::InvalidAmount(format!(
                "{value} has more than {MAX_AMOUNT_DIGITS} digits"
            )));
        }

        Ok(Self(rescaled))
    }

    /// Create an amount from a whole number of cents without validation.
    ///
    /// The caller should ensure `cents` is positive, e.g. because it was read
    /// from a row that was validated on insert.
    pub fn from_cents(cents: i64) -> Self {
        Self(decimal_from_cents(cents))
    }

    /// The amount as a whole number of cents.
    pub fn cents(&self) -> i64 {
        // The mantissa fits in an i64 since it has at most twelve digits.
        self.0.mantissa() as i64
    }

    /// The amount as a decimal number.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = parse_decimal(s).ok_or_else(|| Error::InvalidAmount(s.to_owned()))?;

        Amount::new(value)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Convert a sum of cents from the database into a decimal amount.
pub fn decimal_from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, AMOUNT_SCALE)
}

/// Convert a decimal with at most two decimal places into whole cents.
///
/// # Errors
///
/// Returns an [Error::InvalidAmount] if `value` has more than two decimal
/// places or does not fit in an `i64`.
pub fn decimal_to_cents(value: Decimal) -> Result<i64, Error> {
    if value.normalize().scale() > AMOUNT_SCALE {
        return Err(Error::InvalidAmount(value.to_string()));
    }

    let mut rescaled = value;
    rescaled.rescale(AMOUNT_SCALE);

    i64::try_from(rescaled.mantissa()).map_err(|_| Error::InvalidAmount(value.to_string()))
}

/// Parse a user supplied decimal number, e.g. "12.50" or "1,200".
///
/// Thousands separators and surrounding whitespace are ignored. Returns
/// `None` if the string is not a plain decimal number.
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let cleaned = text.trim().replace(',', "");

    if cleaned.is_empty() {
        return None;
    }

    Decimal::from_str_exact(&cleaned).ok()
}

fn count_digits(mantissa: i128) -> u32 {
    let mut remaining = mantissa.unsigned_abs();
    let mut digits = 1;

    while remaining >= 10 {
        remaining /= 10;
        digits += 1;
    }

    digits
}

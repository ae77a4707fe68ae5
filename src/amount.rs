//! Monetary amounts stored as whole cents.
//!
//! ACH amounts are unsigned integers of cents on the wire. `rust_decimal`
//! renders and parses the human-facing dollar form so that no floating-point
//! arithmetic is ever involved.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

/// A non-negative amount of money in cents.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use nacha::Amount;
///
/// let amount = Amount::from_str("124.9").unwrap();
/// assert_eq!(amount.cents(), 12490);
/// assert_eq!(amount.to_string(), "124.90");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(u64);

impl Amount {
    /// Number of decimal places in the dollar form.
    pub const SCALE: u32 = 2;

    pub const ZERO: Self = Amount(0);

    pub const fn from_cents(cents: u64) -> Self {
        Amount(cents)
    }

    pub const fn cents(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Dollar value as a decimal with exactly two places.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::from_i128_with_scale(self.0 as i128, Self::SCALE)
    }
}

/// Reasons a dollar string cannot become an [`Amount`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AmountError {
    #[error("invalid decimal: {0}")]
    Decimal(#[from] rust_decimal::Error),
    #[error("amount must not be negative")]
    Negative,
    #[error("amount has fractions of a cent")]
    SubCent,
    #[error("amount is too large")]
    Overflow,
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let dollars = Decimal::from_str(s.trim())?;
        if dollars.is_sign_negative() && !dollars.is_zero() {
            return Err(AmountError::Negative);
        }
        let cents = dollars
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or(AmountError::Overflow)?;
        if !cents.fract().is_zero() {
            return Err(AmountError::SubCent);
        }
        cents.to_u64().map(Amount).ok_or(AmountError::Overflow)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.to_decimal())
    }
}

impl From<u64> for Amount {
    fn from(cents: u64) -> Self {
        Amount(cents)
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

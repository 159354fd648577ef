use crate::error::ScanPayError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// A wallet balance.
///
/// Thin wrapper around `rust_decimal::Decimal` so balances and prices cannot be
/// mixed up by accident. The wallet guarantees it never goes negative; the type
/// itself does not, since it is also used for differences in reporting.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Balance(pub Decimal);

/// A non-negative monetary amount: a product price or a debit.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Number of decimal places an amount may carry.
    pub const CENT_SCALE: u32 = 2;

    /// Accepts non-negative values in whole cents, so that displayed amounts
    /// always add up to displayed totals.
    pub fn new(value: Decimal) -> Result<Self, ScanPayError> {
        if value < Decimal::ZERO {
            return Err(ScanPayError::ValidationError(format!(
                "Amount must not be negative, got {}",
                value
            )));
        }
        if value.normalize().scale() > Self::CENT_SCALE {
            return Err(ScanPayError::ValidationError(format!(
                "Amount must be in whole cents, got {}",
                value
            )));
        }
        Ok(Self(value))
    }

    /// For compile-time literals that are known to be valid amounts.
    pub(crate) fn from_literal(value: Decimal) -> Self {
        debug_assert!(value >= Decimal::ZERO);
        debug_assert!(value.normalize().scale() <= Self::CENT_SCALE);
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = ScanPayError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, amount| acc + amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Whether `amount` can be taken from this balance without going negative.
    pub fn covers(&self, amount: Amount) -> bool {
        self.0 >= amount.value()
    }
}

impl Add for Balance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Balance {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Balance {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Balance {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

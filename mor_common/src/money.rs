use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// Tolerance used when comparing two monetary amounts.
pub const MONEY_EPSILON: f64 = 1e-6;

//--------------------------------------        Money        ---------------------------------------------------------
/// A monetary amount in the major unit of whatever currency it is associated with.
///
/// Amounts are stored as `REAL` in the database and travel as plain JSON numbers, matching the wallet service's
/// representation. Comparisons for equality use [`MONEY_EPSILON`].
#[derive(Debug, Clone, Copy, Default, Type, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Money(f64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<f64> for Money {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be used as a monetary amount: {0}")]
pub struct MoneyConversionError(String);

impl TryFrom<f64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value.is_finite() {
            Ok(Self(value))
        } else {
            Err(MoneyConversionError(format!("{value} is not a finite number")))
        }
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        #[allow(clippy::cast_precision_loss)]
        Self(value as f64)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        (self.0 - other.0).abs() < MONEY_EPSILON
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Money {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.0.is_finite()
    }
}

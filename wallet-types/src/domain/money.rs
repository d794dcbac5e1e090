//! Non-negative monetary value.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Type-safe money representation.
///
/// Amount is stored in minor units (cents) to avoid floating-point precision
/// issues. A `Money` is never negative; every arithmetic operation is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Money(i64);

impl Money {
    /// Creates a new Money value.
    pub fn new(amount: i64) -> Result<Self, DomainError> {
        if amount < 0 {
            return Err(DomainError::NegativeAmount);
        }
        Ok(Self(amount))
    }

    /// Zero.
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in minor units.
    pub fn amount(&self) -> i64 {
        self.0
    }

    /// Checked addition - errors on overflow.
    pub fn checked_add(&self, other: Money) -> Result<Money, DomainError> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or(DomainError::AmountOverflow)
    }

    /// Checked subtraction - errors if the result would be negative.
    pub fn checked_sub(&self, other: Money) -> Result<Money, DomainError> {
        if self.0 < other.0 {
            return Err(DomainError::InsufficientBalance {
                available: self.0,
                requested: other.0,
            });
        }
        Ok(Money(self.0 - other.0))
    }

    /// Unit price times a quantity.
    pub fn checked_mul(&self, quantity: i64) -> Result<Money, DomainError> {
        if quantity < 0 {
            return Err(DomainError::ValidationError(
                "Quantity cannot be negative".into(),
            ));
        }
        self.0
            .checked_mul(quantity)
            .map(Money)
            .ok_or(DomainError::AmountOverflow)
    }
}

impl TryFrom<i64> for Money {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Money::new(value)
    }
}

impl From<Money> for i64 {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_creation() {
        let money = Money::new(1000).unwrap();
        assert_eq!(money.amount(), 1000);
    }

    #[test]
    fn test_negative_money_fails() {
        let result = Money::new(-100);
        assert!(matches!(result, Err(DomainError::NegativeAmount)));
    }

    #[test]
    fn test_money_addition() {
        let sum = Money::new(100)
            .unwrap()
            .checked_add(Money::new(50).unwrap())
            .unwrap();
        assert_eq!(sum.amount(), 150);
    }

    #[test]
    fn test_money_addition_overflow() {
        let result = Money::new(i64::MAX).unwrap().checked_add(Money::new(1).unwrap());
        assert!(matches!(result, Err(DomainError::AmountOverflow)));
    }

    #[test]
    fn test_money_subtraction_below_zero() {
        let result = Money::new(50).unwrap().checked_sub(Money::new(100).unwrap());
        assert!(matches!(
            result,
            Err(DomainError::InsufficientBalance {
                available: 50,
                requested: 100
            })
        ));
    }

    #[test]
    fn test_money_multiplication() {
        let total = Money::new(100).unwrap().checked_mul(3).unwrap();
        assert_eq!(total.amount(), 300);
        assert!(Money::new(i64::MAX).unwrap().checked_mul(2).is_err());
    }

    #[test]
    fn test_money_deserialize_rejects_negative() {
        assert!(serde_json::from_str::<Money>("-5").is_err());
        assert_eq!(serde_json::from_str::<Money>("250").unwrap().amount(), 250);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(format!("{}", Money::new(1050).unwrap()), "10.50");
    }
}

//! Fixed-point money representation.
//!
//! Stage costs are accumulated dozens of times per run; binary floating
//! point would drift. All amounts are stored as integer cents.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A monetary amount in USD cents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
    JsonSchema,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Create from an integer number of cents.
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Create from whole dollars and cents (`Money::from_dollars(1, 25)` == $1.25).
    pub const fn from_dollars(dollars: i64, cents: i64) -> Self {
        Self(dollars * 100 + cents)
    }

    /// Amount in cents.
    pub const fn cents(&self) -> i64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Mul<u32> for Money {
    type Output = Money;

    fn mul(self, rhs: u32) -> Money {
        Money(self.0 * i64::from(rhs))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}${}.{:02}", sign, abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addition_is_exact() {
        // 0.01 added 1000 times must be exactly 10.00
        let mut total = Money::ZERO;
        for _ in 0..1000 {
            total += Money::from_cents(1);
        }
        assert_eq!(total, Money::from_dollars(10, 0));
    }

    #[test]
    fn test_per_scene_scaling() {
        let per_scene = Money::from_cents(8);
        assert_eq!(per_scene * 4, Money::from_cents(32));
        assert_eq!(per_scene * 0, Money::ZERO);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(8).to_string(), "$0.08");
        assert_eq!(Money::from_dollars(1, 25).to_string(), "$1.25");
        assert_eq!(Money::ZERO.to_string(), "$0.00");
        assert_eq!(Money::from_cents(-5).to_string(), "-$0.05");
    }

    #[test]
    fn test_sum() {
        let total: Money = [Money::from_cents(1), Money::from_cents(8), Money::from_cents(10)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_cents(19));
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&Money::from_cents(42)).unwrap();
        assert_eq!(json, "42");
        let back: Money = serde_json::from_str("42").unwrap();
        assert_eq!(back, Money::from_cents(42));
    }
}

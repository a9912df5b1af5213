use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};
use std::str::FromStr;

/// internal precision for every monetary value
pub const MONEY_DP: u32 = 8;

/// Money type backed by a fixed-point decimal, rounded to 8 places on every operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);
    pub const ONE: Money = Money(Decimal::ONE);

    /// create from decimal
    pub fn from_decimal(d: Decimal) -> Self {
        Money(d.round_dp(MONEY_DP))
    }

    /// create from string with exact parsing
    pub fn from_str_exact(s: &str) -> Result<Self, rust_decimal::Error> {
        Ok(Money(Decimal::from_str(s)?.round_dp(MONEY_DP)))
    }

    /// create from integer amount (rupiah, dollars, ...)
    pub fn from_major(amount: i64) -> Self {
        Money(Decimal::from(amount))
    }

    /// create from minor amount (cents etc)
    pub fn from_minor(amount: i64, scale: u32) -> Self {
        let d = Decimal::from(amount) / Decimal::from(10_u64.pow(scale));
        Money(d.round_dp(MONEY_DP))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn round_dp(&self, dp: u32) -> Self {
        Money(self.0.round_dp(dp))
    }

    /// number of significant fractional digits (trailing zeros ignored)
    pub fn fractional_digits(&self) -> u32 {
        self.0.normalize().scale()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// strictly greater than zero
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// multiply by a whole count (e.g. installment amount x installments)
    pub fn times(self, count: u32) -> Self {
        self * Decimal::from(count)
    }

    /// apply a flat rate once: self x (1 + rate)
    pub fn with_flat_interest(&self, rate: Rate) -> Self {
        Money((self.0 * (Decimal::ONE + rate.as_decimal())).round_dp(MONEY_DP))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::from_str_exact(s)
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Money::from_decimal(d)
    }
}

impl From<i64> for Money {
    fn from(i: i64) -> Self {
        Money::from_major(i)
    }
}

impl From<u32> for Money {
    fn from(i: u32) -> Self {
        Money::from_major(i as i64)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money((self.0 + other.0).round_dp(MONEY_DP))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 = (self.0 + other.0).round_dp(MONEY_DP);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money((self.0 - other.0).round_dp(MONEY_DP))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Money) {
        self.0 = (self.0 - other.0).round_dp(MONEY_DP);
    }
}

impl Mul<Decimal> for Money {
    type Output = Money;

    fn mul(self, other: Decimal) -> Money {
        Money((self.0 * other).round_dp(MONEY_DP))
    }
}

impl Div<Decimal> for Money {
    type Output = Money;

    fn div(self, other: Decimal) -> Money {
        Money((self.0 / other).round_dp(MONEY_DP))
    }
}

/// rate type for flat interest rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Rate(Decimal);

impl Rate {
    pub const ZERO: Rate = Rate(Decimal::ZERO);

    /// create from decimal (e.g., 0.10 for 10%)
    pub fn from_decimal(d: Decimal) -> Self {
        Rate(d)
    }

    /// create from percentage (e.g., 10 for 10%)
    pub fn from_percentage(p: u32) -> Self {
        Rate(Decimal::from(p) / Decimal::from(100))
    }

    /// create from basis points (e.g., 1000 for 10%)
    pub fn from_bps(bps: u32) -> Self {
        Rate(Decimal::from(bps) / Decimal::from(10000))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn as_percentage(&self) -> Decimal {
        self.0 * Decimal::from(100)
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage())
    }
}

impl From<Decimal> for Rate {
    fn from(d: Decimal) -> Self {
        Rate::from_decimal(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_precision() {
        let m = Money::from_str_exact("100.123456789").unwrap();
        assert_eq!(m.to_string(), "100.12345679"); // rounded to 8 places
    }

    #[test]
    fn test_equality_ignores_scale() {
        assert_eq!(Money::from_str_exact("110000.00").unwrap(), Money::from_major(110_000));
        assert_eq!(Money::from_minor(11_000_000, 2), Money::from_major(110_000));
    }

    #[test]
    fn test_fractional_digits() {
        assert_eq!(Money::from_major(5_000_000).fractional_digits(), 0);
        assert_eq!(Money::from_str_exact("12.50").unwrap().fractional_digits(), 1);
        assert_eq!(Money::from_str_exact("12.345").unwrap().fractional_digits(), 3);
    }

    #[test]
    fn test_flat_interest() {
        let principal = Money::from_major(5_000_000);
        let total = principal.with_flat_interest(Rate::from_percentage(10));
        assert_eq!(total, Money::from_major(5_500_000));

        // one tenth of a cent survives the flat markup exactly
        let odd = Money::from_str_exact("1234.57").unwrap();
        assert_eq!(odd.with_flat_interest(Rate::from_bps(1000)).as_decimal(), dec!(1358.027));
    }

    #[test]
    fn test_times_and_division() {
        let installment = Money::from_major(5_500_000) / Decimal::from(50);
        assert_eq!(installment, Money::from_major(110_000));
        assert_eq!(installment.times(3), Money::from_major(330_000));
    }

    #[test]
    fn test_rate_conversions() {
        assert_eq!(Rate::from_percentage(10), Rate::from_bps(1000));
        assert_eq!(Rate::from_percentage(10).as_percentage(), dec!(10));
        assert!(!Rate::from_percentage(10).is_negative());
    }
}

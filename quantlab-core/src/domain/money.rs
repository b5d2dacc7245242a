//! Fixed-point monetary value.
//!
//! All cash, price, margin, and PnL arithmetic happens in signed 64-bit
//! micro-units (1 unit = 10⁻⁶ of the base currency). Floating point is
//! crossed only outward, when producing a ratio or a metric, and is never
//! read back into the ledger.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;
use thiserror::Error;

/// Micro-units per whole currency unit.
pub const MICROS_PER_UNIT: i64 = 1_000_000;

const FRACTION_DIGITS: usize = 6;

/// A signed monetary amount in micro-units.
///
/// Supports addition and subtraction with other `Money` values and
/// multiplication/division by dimensionless scalars (`i64` or `f64`).
/// Scalar products round half-to-even back to micro-units; integer products
/// widen to 128 bits so intermediate values cannot overflow. Multiplying two
/// `Money` values has no meaning and no impl.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_micros(micros: i64) -> Self {
        Money(micros)
    }

    /// Whole currency units, exact.
    pub const fn from_units(units: i64) -> Self {
        Money(units * MICROS_PER_UNIT)
    }

    /// Nearest micro-unit (ties to even).
    pub fn from_f64(value: f64) -> Self {
        Money((value * MICROS_PER_UNIT as f64).round_ties_even() as i64)
    }

    pub const fn micros(self) -> i64 {
        self.0
    }

    /// Crossing to floating point. Only for ratios and display-adjacent math.
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / MICROS_PER_UNIT as f64
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn abs(self) -> Self {
        Money(self.0.abs())
    }

    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }
}

/// `n / d` rounded half-to-even, in 128-bit space.
fn div_round_half_even(n: i128, d: i128) -> i128 {
    debug_assert!(d > 0);
    let q = n.div_euclid(d);
    let r = n.rem_euclid(d);
    let twice = 2 * r;
    if twice > d || (twice == d && q % 2 != 0) {
        q + 1
    } else {
        q
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;
    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Mul<i64> for Money {
    type Output = Money;
    fn mul(self, rhs: i64) -> Money {
        Money((self.0 as i128 * rhs as i128) as i64)
    }
}

impl Mul<f64> for Money {
    type Output = Money;
    fn mul(self, rhs: f64) -> Money {
        Money((self.0 as f64 * rhs).round_ties_even() as i64)
    }
}

impl Div<i64> for Money {
    type Output = Money;
    fn div(self, rhs: i64) -> Money {
        let sign = if (self.0 < 0) != (rhs < 0) { -1 } else { 1 };
        let q = div_round_half_even(self.0.unsigned_abs() as i128, rhs.unsigned_abs() as i128);
        Money((sign * q) as i64)
    }
}

impl Div<f64> for Money {
    type Output = Money;
    fn div(self, rhs: f64) -> Money {
        Money((self.0 as f64 / rhs).round_ties_even() as i64)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = abs / MICROS_PER_UNIT as u64;
        let frac = abs % MICROS_PER_UNIT as u64;
        if frac == 0 {
            return write!(f, "{sign}{units}");
        }
        let frac_str = format!("{frac:06}");
        write!(f, "{sign}{units}.{}", frac_str.trim_end_matches('0'))
    }
}

/// Errors from parsing a decimal money string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseMoneyError {
    #[error("empty money string")]
    Empty,
    #[error("invalid character in money string: {0:?}")]
    InvalidCharacter(char),
    #[error("money value out of range")]
    OutOfRange,
}

impl FromStr for Money {
    type Err = ParseMoneyError;

    /// Parse a decimal string such as `"123.45"` or `"-0.000001"`.
    ///
    /// The fractional part is padded or truncated to exactly six digits, so
    /// sub-micro precision is dropped rather than rounded.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseMoneyError::Empty);
        }

        let (negative, rest) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        if rest.is_empty() {
            return Err(ParseMoneyError::Empty);
        }

        let (int_part, frac_part) = match rest.split_once('.') {
            Some((i, f)) => (i, f),
            None => (rest, ""),
        };

        for c in int_part.chars().chain(frac_part.chars()) {
            if !c.is_ascii_digit() {
                return Err(ParseMoneyError::InvalidCharacter(c));
            }
        }

        let units: i64 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| ParseMoneyError::OutOfRange)?
        };

        let mut frac = frac_part.to_string();
        frac.truncate(FRACTION_DIGITS);
        while frac.len() < FRACTION_DIGITS {
            frac.push('0');
        }
        let frac: i64 = frac.parse().map_err(|_| ParseMoneyError::OutOfRange)?;

        let micros = units
            .checked_mul(MICROS_PER_UNIT)
            .and_then(|m| m.checked_add(frac))
            .ok_or(ParseMoneyError::OutOfRange)?;

        Ok(Money(if negative { -micros } else { micros }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_decimal() {
        assert_eq!("123.45".parse::<Money>().unwrap(), Money::from_micros(123_450_000));
        assert_eq!("0.000001".parse::<Money>().unwrap(), Money::from_micros(1));
        assert_eq!("-1.5".parse::<Money>().unwrap(), Money::from_micros(-1_500_000));
        assert_eq!("100".parse::<Money>().unwrap(), Money::from_units(100));
    }

    #[test]
    fn parse_pads_and_truncates_fraction() {
        // Pad: "1.5" -> 1.500000
        assert_eq!("1.5".parse::<Money>().unwrap().micros(), 1_500_000);
        // Truncate: sub-micro digits are dropped, not rounded
        assert_eq!("1.0000019".parse::<Money>().unwrap().micros(), 1_000_001);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!("".parse::<Money>(), Err(ParseMoneyError::Empty));
        assert_eq!("-".parse::<Money>(), Err(ParseMoneyError::Empty));
        assert!(matches!(
            "12a.3".parse::<Money>(),
            Err(ParseMoneyError::InvalidCharacter('a'))
        ));
    }

    #[test]
    fn display_trims_trailing_zeros() {
        assert_eq!(Money::from_micros(123_450_000).to_string(), "123.45");
        assert_eq!(Money::from_units(7).to_string(), "7");
        assert_eq!(Money::from_micros(-1_500_000).to_string(), "-1.5");
        assert_eq!(Money::from_micros(1).to_string(), "0.000001");
    }

    #[test]
    fn parse_format_roundtrip() {
        for micros in [0, 1, -1, 999_999, 1_000_000, -123_456_789, 10i64.pow(12) * 1_000_000] {
            let m = Money::from_micros(micros);
            assert_eq!(m.to_string().parse::<Money>().unwrap(), m, "value {micros}");
        }
    }

    #[test]
    fn scalar_multiply_rounds_half_to_even() {
        // 0.25 micro-units * 2 = 0.5 -> rounds to 0 (even), not 1
        let m = Money::from_micros(1);
        assert_eq!((m * 0.5).micros(), 0);
        let m = Money::from_micros(3);
        assert_eq!((m * 0.5).micros(), 2); // 1.5 -> 2 (even)
        let m = Money::from_micros(5);
        assert_eq!((m * 0.5).micros(), 2); // 2.5 -> 2 (even)
    }

    #[test]
    fn integer_multiply_widens() {
        let m = Money::from_units(1_000_000_000); // 10^9 units = 10^15 micros
        let doubled = m * 2i64;
        assert_eq!(doubled.micros(), 2_000_000_000_000_000);
    }

    #[test]
    fn integer_divide_rounds_half_to_even() {
        assert_eq!((Money::from_micros(5) / 2i64).micros(), 2);
        assert_eq!((Money::from_micros(7) / 2i64).micros(), 4); // 3.5 -> 4
        assert_eq!((Money::from_micros(-5) / 2i64).micros(), -2);
    }

    #[test]
    fn sum_and_sign_helpers() {
        let total: Money = [Money::from_units(1), Money::from_units(2)].into_iter().sum();
        assert_eq!(total, Money::from_units(3));
        assert!(Money::from_micros(-1).is_negative());
        assert!(Money::ZERO.is_zero());
        assert_eq!(Money::from_micros(-7).abs().micros(), 7);
    }
}

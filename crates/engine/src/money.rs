use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::{EngineError, Rate, ResultEngine};

/// Signed money amount represented as **integer minor units** (cents).
///
/// Use this type for **all** monetary values in the engine (loan amounts,
/// split principal, payments, balances) to avoid floating-point drift. Two
/// fractional digits are kept, matching a `numeric(18,2)` column.
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let amount = Money::new(12_34);
/// assert_eq!(amount.minor(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator; rejects >
/// 2 decimals):
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!("10".parse::<Money>().unwrap().minor(), 1000);
/// assert_eq!("10,5".parse::<Money>().unwrap().minor(), 1050);
/// assert!("12.345".parse::<Money>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new amount from integer minor units.
    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns `true` if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[must_use]
    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Sums amounts, failing instead of wrapping on overflow.
    pub fn checked_sum<I>(amounts: I) -> ResultEngine<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts.into_iter().try_fold(Money::ZERO, |acc, amount| {
            acc.checked_add(amount)
                .ok_or_else(|| EngineError::InvalidAmount("amount too large".to_string()))
        })
    }

    /// Returns `rate` percent of the amount, rounded half up to the cent.
    pub fn apply_rate(self, rate: Rate) -> ResultEngine<Money> {
        self.scale(rate.as_decimal(), Decimal::ONE_HUNDRED)
    }

    /// Returns one month of interest at the yearly `rate`, rounded half up to
    /// the cent.
    pub fn monthly_interest(self, rate: Rate) -> ResultEngine<Money> {
        self.scale(rate.as_decimal(), Decimal::from(1200))
    }

    fn scale(self, numerator: Decimal, denominator: Decimal) -> ResultEngine<Money> {
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());
        let scaled = Decimal::from(self.0)
            .checked_mul(numerator)
            .and_then(|value| value.checked_div(denominator))
            .ok_or_else(overflow)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        scaled.to_i64().map(Money).ok_or_else(overflow)
    }

    /// Fraction `self / total` as a decimal clamped to `[0, 1]` and rounded to
    /// four places. A non-positive `total` yields 0.
    #[must_use]
    pub fn ratio_of(self, total: Money) -> Decimal {
        if total.0 <= 0 {
            return Decimal::ZERO;
        }
        let ratio = Decimal::from(self.0) / Decimal::from(total.0);
        ratio
            .clamp(Decimal::ZERO, Decimal::ONE)
            .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Distributes the amount proportionally to `weights`.
    ///
    /// Every part gets the floor of its exact share; the cents left over go
    /// one each to the parts with the largest remainders, earlier parts
    /// winning ties. The parts always add up to `self` exactly. Zero or
    /// negative weights receive nothing.
    pub fn distribute(self, weights: &[Money]) -> ResultEngine<Vec<Money>> {
        if self.is_negative() {
            return Err(EngineError::InvalidAmount(
                "cannot distribute a negative amount".to_string(),
            ));
        }
        let total: i128 = weights
            .iter()
            .filter(|weight| weight.is_positive())
            .map(|weight| i128::from(weight.0))
            .sum();
        if total == 0 {
            if self.is_zero() {
                return Ok(vec![Money::ZERO; weights.len()]);
            }
            return Err(EngineError::InvalidAmount(
                "cannot distribute over empty weights".to_string(),
            ));
        }

        let amount = i128::from(self.0);
        let mut parts = Vec::with_capacity(weights.len());
        let mut remainders = Vec::with_capacity(weights.len());
        let mut assigned: i128 = 0;
        for (index, weight) in weights.iter().enumerate() {
            let weight = if weight.is_positive() {
                i128::from(weight.0)
            } else {
                0
            };
            let exact = amount * weight;
            let part = exact / total;
            assigned += part;
            parts.push(part);
            if weight > 0 {
                remainders.push((exact % total, index));
            }
        }

        remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        let leftover = amount - assigned;
        for (_, index) in remainders.into_iter().take(leftover as usize) {
            parts[index] += 1;
        }

        parts
            .into_iter()
            .map(|part| {
                i64::try_from(part)
                    .map(Money)
                    .map_err(|_| EngineError::InvalidAmount("amount too large".to_string()))
            })
            .collect()
    }

    /// Splits the amount into `parts` shares that differ by at most one cent.
    ///
    /// ```rust
    /// use engine::Money;
    ///
    /// let parts = Money::new(1000).split_evenly(3).unwrap();
    /// assert_eq!(parts, vec![Money::new(334), Money::new(333), Money::new(333)]);
    /// ```
    pub fn split_evenly(self, parts: usize) -> ResultEngine<Vec<Money>> {
        if parts == 0 {
            return Err(EngineError::InvalidSplit(
                "at least one part is required".to_string(),
            ));
        }
        self.distribute(&vec![Money(1); parts])
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = abs / 100;
        let cents = abs % 100;
        write!(f, "{sign}{units}.{cents:02}")
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses a decimal string into minor units.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
    ///
    /// Validation rules:
    /// - max 2 fractional digits (rejects `12.345`)
    /// - rejects empty/invalid strings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || EngineError::InvalidAmount("empty amount".to_string());
        let invalid = || EngineError::InvalidAmount(format!("invalid amount: {s}"));
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }

        let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (true, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (false, stripped)
        } else {
            (false, trimmed)
        };

        let rest = rest.trim();
        if rest.is_empty() {
            return Err(empty());
        }

        let rest = rest.replace(',', ".");
        let (units_str, frac_str) = match rest.split_once('.') {
            Some((units, frac)) => (units, Some(frac)),
            None => (rest.as_str(), None),
        };

        if units_str.is_empty() || !units_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let units: i64 = units_str.parse().map_err(|_| overflow())?;

        let cents: i64 = match frac_str {
            None | Some("") => 0,
            Some(frac) => {
                if !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                match frac.len() {
                    1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
                    2 => frac.parse::<i64>().map_err(|_| invalid())?,
                    _ => return Err(EngineError::InvalidAmount("too many decimals".to_string())),
                }
            }
        };

        let total = units
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .ok_or_else(overflow)?;

        Ok(Money(if negative { -total } else { total }))
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn display_formats_two_decimals() {
        assert_eq!(Money::new(0).to_string(), "0.00");
        assert_eq!(Money::new(1).to_string(), "0.01");
        assert_eq!(Money::new(10).to_string(), "0.10");
        assert_eq!(Money::new(100_000).to_string(), "1000.00");
        assert_eq!(Money::new(-1050).to_string(), "-10.50");
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!("10".parse::<Money>().unwrap().minor(), 1000);
        assert_eq!("10.5".parse::<Money>().unwrap().minor(), 1050);
        assert_eq!("10,50".parse::<Money>().unwrap().minor(), 1050);
        assert_eq!("-0.01".parse::<Money>().unwrap().minor(), -1);
        assert_eq!("+1.00".parse::<Money>().unwrap().minor(), 100);
        assert_eq!("  2.30 ".parse::<Money>().unwrap().minor(), 230);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("12.345".parse::<Money>().is_err());
        assert!("0.001".parse::<Money>().is_err());
        assert!("1.2.3".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!("-".parse::<Money>().is_err());
        assert!("".parse::<Money>().is_err());
    }

    #[test]
    fn json_uses_decimal_strings() {
        let json = serde_json::to_string(&Money::new(123_45)).unwrap();
        assert_eq!(json, "\"123.45\"");
        let back: Money = serde_json::from_str("\"600.00\"").unwrap();
        assert_eq!(back, Money::new(600_00));
        assert!(serde_json::from_str::<Money>("\"1.001\"").is_err());
    }

    #[test]
    fn apply_rate_rounds_half_up() {
        let rate: Rate = "12.50".parse().unwrap();
        assert_eq!(Money::new(100_00).apply_rate(rate).unwrap(), Money::new(12_50));
        // 0.05 * 10% = 0.005 -> 0.01
        let ten: Rate = "10".parse().unwrap();
        assert_eq!(Money::new(5).apply_rate(ten).unwrap(), Money::new(1));
        assert_eq!(Money::new(4).apply_rate(ten).unwrap(), Money::ZERO);
    }

    #[test]
    fn monthly_interest_divides_yearly_rate() {
        let rate: Rate = "12.00".parse().unwrap();
        assert_eq!(
            Money::new(600_00).monthly_interest(rate).unwrap(),
            Money::new(6_00)
        );
        let rate: Rate = "10.00".parse().unwrap();
        // 350.00 * 10% / 12 = 2.91666.. -> 2.92
        assert_eq!(
            Money::new(350_00).monthly_interest(rate).unwrap(),
            Money::new(2_92)
        );
    }

    #[test]
    fn ratio_is_clamped() {
        assert_eq!(Money::new(250).ratio_of(Money::new(1000)), dec!(0.25));
        assert_eq!(Money::new(2000).ratio_of(Money::new(1000)), Decimal::ONE);
        assert_eq!(Money::new(-5).ratio_of(Money::new(1000)), Decimal::ZERO);
        assert_eq!(Money::new(5).ratio_of(Money::ZERO), Decimal::ZERO);
        assert_eq!(Money::new(1).ratio_of(Money::new(3)), dec!(0.3333));
    }

    #[test]
    fn split_evenly_gives_extra_cents_to_first_parts() {
        let parts = Money::new(100_00).split_evenly(3).unwrap();
        assert_eq!(parts, vec![Money::new(33_34), Money::new(33_33), Money::new(33_33)]);
        assert_eq!(parts.iter().sum::<Money>(), Money::new(100_00));

        let parts = Money::new(5).split_evenly(3).unwrap();
        assert_eq!(parts, vec![Money::new(2), Money::new(2), Money::new(1)]);

        assert!(Money::new(5).split_evenly(0).is_err());
    }

    #[test]
    fn distribute_follows_weights() {
        let parts = Money::new(100)
            .distribute(&[Money::new(600), Money::new(400)])
            .unwrap();
        assert_eq!(parts, vec![Money::new(60), Money::new(40)]);

        let parts = Money::new(10)
            .distribute(&[Money::new(1), Money::ZERO, Money::new(2)])
            .unwrap();
        assert_eq!(parts, vec![Money::new(3), Money::ZERO, Money::new(7)]);
        assert_eq!(parts.iter().sum::<Money>(), Money::new(10));

        assert!(Money::new(10).distribute(&[Money::ZERO]).is_err());
        assert_eq!(
            Money::ZERO.distribute(&[Money::ZERO]).unwrap(),
            vec![Money::ZERO]
        );
    }

    #[test]
    fn checked_sum_detects_overflow() {
        assert_eq!(
            Money::checked_sum([Money::new(1), Money::new(2)]).unwrap(),
            Money::new(3)
        );
        assert!(Money::checked_sum([Money::new(i64::MAX), Money::new(1)]).is_err());
    }
}

//! Yearly interest rate expressed in percent with two decimals.

use std::{fmt, str::FromStr};

use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::EngineError;

const MAX_BASIS_POINTS: i64 = 99_999;

/// Interest rate in percent, `12.50` meaning 12.50 %.
///
/// Same range as a `numeric(5,2)` column: `0.00..=999.99`. Stored as basis
/// points (hundredths of a percent).
///
/// ```rust
/// use engine::Rate;
///
/// let rate: Rate = "12.5".parse().unwrap();
/// assert_eq!(rate.basis_points(), 1250);
/// assert_eq!(rate.to_string(), "12.50");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rate(Decimal);

impl Rate {
    pub const ZERO: Rate = Rate(Decimal::ZERO);

    pub fn from_basis_points(bps: i64) -> Result<Self, EngineError> {
        if !(0..=MAX_BASIS_POINTS).contains(&bps) {
            return Err(EngineError::InvalidAmount(format!(
                "interest rate out of range: {bps} bps"
            )));
        }
        Ok(Self(Decimal::new(bps, 2)))
    }

    #[must_use]
    pub fn basis_points(self) -> i64 {
        (self.0 * Decimal::ONE_HUNDRED).to_i64().unwrap_or_default()
    }

    #[must_use]
    pub fn as_decimal(self) -> Decimal {
        self.0
    }
}

impl Default for Rate {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut value = self.0;
        value.rescale(2);
        write!(f, "{value}")
    }
}

impl FromStr for Rate {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().replace(',', ".");
        let value = Decimal::from_str(&trimmed)
            .map_err(|_| EngineError::InvalidAmount(format!("invalid interest rate: {s}")))?;
        if value.scale() > 2 {
            return Err(EngineError::InvalidAmount(
                "interest rate allows at most 2 decimals".to_string(),
            ));
        }
        let bps = (value * Decimal::ONE_HUNDRED)
            .to_i64()
            .ok_or_else(|| EngineError::InvalidAmount(format!("invalid interest rate: {s}")))?;
        Self::from_basis_points(bps)
    }
}

impl Serialize for Rate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_formats_two_decimals() {
        assert_eq!("12.50".parse::<Rate>().unwrap().basis_points(), 1250);
        assert_eq!("7".parse::<Rate>().unwrap().to_string(), "7.00");
        assert_eq!("0,5".parse::<Rate>().unwrap().to_string(), "0.50");
        assert_eq!(Rate::default().to_string(), "0.00");
    }

    #[test]
    fn rejects_out_of_range() {
        assert!("12.345".parse::<Rate>().is_err());
        assert!("-1".parse::<Rate>().is_err());
        assert!("1000".parse::<Rate>().is_err());
        assert!("abc".parse::<Rate>().is_err());
        assert!(Rate::from_basis_points(100_000).is_err());
        assert_eq!(Rate::from_basis_points(99_999).unwrap().to_string(), "999.99");
    }
}

use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// `DECIMAL(10, 2)`: sales revenue.
pub const REVENUE_MAX_DIGITS: u32 = 10;
/// `DECIMAL(5, 2)`: market share percentage.
pub const MARKET_SHARE_MAX_DIGITS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecimalError {
    #[error("`{0}` is not a decimal number")]
    Invalid(String),
    #[error("`{value}` does not fit in {max_digits} digits with 2 decimal places")]
    OutOfRange { value: String, max_digits: u32 },
}

/// Two-place fixed-point number stored as integer hundredths.
///
/// Values are persisted as `INTEGER` minor units so sums and differences stay
/// exact inside SQLite, and rendered back as `"12.50"`-style strings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hundredths(i64);

impl Hundredths {
    pub const ZERO: Self = Self(0);

    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Parse decimal text, rounding to two places and rejecting values with
    /// more than `max_digits` significant digits in total.
    pub fn parse(raw: &str, max_digits: u32) -> Result<Self, DecimalError> {
        let trimmed = raw.trim();
        let value =
            BigDecimal::from_str(trimmed).map_err(|_| DecimalError::Invalid(trimmed.to_string()))?;
        let out_of_range = || DecimalError::OutOfRange {
            value: trimmed.to_string(),
            max_digits,
        };

        // `1e9000000` is a few bytes of text; check the integer digit count
        // before rounding or scaling materializes it.
        let (mantissa, scale) = value.as_bigint_and_exponent();
        if mantissa.is_zero() {
            return Ok(Self::ZERO);
        }
        let mantissa_digits = mantissa.magnitude().to_string().len() as i64;
        if mantissa_digits.saturating_sub(scale) > i64::from(max_digits) {
            return Err(out_of_range());
        }

        let minor = (value.round(2) * BigDecimal::from(100i64))
            .to_i64()
            .ok_or_else(out_of_range)?;
        let limit = 10u64.checked_pow(max_digits).ok_or_else(out_of_range)?;
        if minor.unsigned_abs() >= limit {
            return Err(out_of_range());
        }
        Ok(Self(minor))
    }
}

impl fmt::Display for Hundredths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Serialize for Hundredths {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::op;

pub const ZAR_CURRENCY_CODE: &str = "ZAR";
pub const ZAR_CURRENCY_CODE_LOWER: &str = "zar";

//--------------------------------------      Cents       ------------------------------------------------------------
/// A monetary amount in minor units (cents). All arithmetic in the gateway happens in cents so that fee
/// apportionment is exact; conversion to decimal strings only happens at the API boundary.
#[derive(Debug, Clone, Copy, Default, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Cents(i64);

op!(binary Cents, Add, add);
op!(binary Cents, Sub, sub);
op!(inplace Cents, SubAssign, sub_assign);
op!(unary Cents, Neg, neg);

impl Mul<i64> for Cents {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in cents: {0}")]
pub struct CentsConversionError(String);

impl From<i64> for Cents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Cents {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Cents {}

impl TryFrom<u64> for Cents {
    type Error = CentsConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(CentsConversionError(format!("Value {} is too large to convert to Cents", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rands = self.0 as f64 / 100.0;
        write!(f, "R{rands:0.2}")
    }
}

impl FromStr for Cents {
    type Err = CentsConversionError;

    /// Parses a decimal currency string ("123.45") into cents. A missing fractional part is taken as zero;
    /// more than two fractional digits is an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let negative = s.trim_start().starts_with('-');
        let mut parts = s.splitn(2, '.');
        let whole = parts
            .next()
            .ok_or_else(|| CentsConversionError(s.to_string()))?
            .parse::<i64>()
            .map_err(|e| CentsConversionError(format!("Invalid amount: {s}. {e}")))?;
        let frac = match parts.next() {
            None => 0,
            Some(frac) if frac.len() <= 2 => {
                let cents = frac.parse::<i64>().map_err(|e| CentsConversionError(format!("Invalid amount: {s}. {e}")))?;
                if frac.len() == 1 {
                    cents * 10
                } else {
                    cents
                }
            },
            Some(frac) => return Err(CentsConversionError(format!("Invalid amount: {s}. Too many digits in {frac}"))),
        };
        let sign = if negative { -1 } else { 1 };
        Ok(Self(whole * 100 + sign * frac))
    }
}

impl Cents {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub const fn from_rands(rands: i64) -> Self {
        Self(rands * 100)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Decimal string for the remote API ("1234.56"). The remote service deals in major units.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        format!("{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

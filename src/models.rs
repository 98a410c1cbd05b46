//! Data models for trade rules, quantities and route steps

use std::fmt;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::ToPrimitive;
use serde::Deserialize;

/// One directed exchange: `from_count` units of `from_item` trade for
/// `to_count` units of `to_item` at `location`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TradeRule {
    pub location: String,
    pub from_count: u64,
    pub from_item: String,
    pub to_count: u64,
    pub to_item: String,
}

impl TradeRule {
    pub fn new(location: &str, from_count: u64, from_item: &str, to_count: u64, to_item: &str) -> Self {
        Self {
            location: location.to_string(),
            from_count,
            from_item: from_item.to_string(),
            to_count,
            to_item: to_item.to_string(),
        }
    }
}

impl fmt::Display for TradeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {} {} at {}",
            self.from_count, self.from_item, self.to_count, self.to_item, self.location
        )
    }
}

/// Raw row from a trade data file, before validation.
///
/// Cells stay as text so that `Catalog::build` can report exactly which
/// field was missing or malformed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TradeRecord {
    #[serde(rename = "Location", default)]
    pub location: Option<String>,
    #[serde(rename = "FromCount", default)]
    pub from_count: Option<String>,
    #[serde(rename = "FromItem", default)]
    pub from_item: Option<String>,
    #[serde(rename = "ToCount", default)]
    pub to_count: Option<String>,
    #[serde(rename = "ToItem", default)]
    pub to_item: Option<String>,
}

impl TradeRecord {
    pub fn new(location: &str, from_count: &str, from_item: &str, to_count: &str, to_item: &str) -> Self {
        Self {
            location: Some(location.to_string()),
            from_count: Some(from_count.to_string()),
            from_item: Some(from_item.to_string()),
            to_count: Some(to_count.to_string()),
            to_item: Some(to_item.to_string()),
        }
    }
}

/// Exact amount of an item carried along a route.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(BigRational);

impl Quantity {
    pub fn from_count(count: u64) -> Self {
        Self(BigRational::from_integer(BigInt::from(count)))
    }

    pub fn from_ratio(numer: u64, denom: u64) -> Self {
        Self(BigRational::new(BigInt::from(numer), BigInt::from(denom)))
    }

    /// `self * mul / div`, kept exact.
    pub fn scale(&self, mul: u64, div: u64) -> Self {
        let mul = BigRational::from_integer(BigInt::from(mul));
        let div = BigRational::from_integer(BigInt::from(div));
        Self(&self.0 * mul / div)
    }

    pub fn is_integer(&self) -> bool {
        self.0.is_integer()
    }

    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::NAN)
    }
}

// Formats like C's `%g`: six significant digits, no trailing zeros, and
// scientific notation when the rounded exponent is below -4 or above 5.
impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.to_f64();

        // Rounding to six digits first fixes the exponent, e.g. 999999.5 -> 1e+06.
        let scientific = format!("{:.5e}", value);
        let Some((mantissa, exponent)) = scientific.split_once('e') else {
            return write!(f, "{}", scientific);
        };
        let exponent: i32 = exponent.parse().map_err(|_| fmt::Error)?;

        if !(-4..6).contains(&exponent) {
            let sign = if exponent < 0 { '-' } else { '+' };
            return write!(f, "{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs());
        }

        let decimals = (5 - exponent) as usize;
        write!(f, "{}", trim_fraction(&format!("{:.*}", decimals, value)))
    }
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// Which side of a step `Transaction::count` is measured on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Backward step: `count` is what must be given.
    From,
    /// Forward step: `count` is what is received.
    To,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::From => write!(f, "from"),
            Direction::To => write!(f, "to"),
        }
    }
}

/// A single step of a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub direction: Direction,
    pub count: Quantity,
    pub rule: TradeRule,
}

impl Transaction {
    pub fn new(direction: Direction, count: Quantity, rule: TradeRule) -> Self {
        Self { direction, count, rule }
    }

    /// Amount of `rule.from_item` given up in this step.
    pub fn from_quantity(&self) -> Quantity {
        match self.direction {
            Direction::From => self.count.clone(),
            Direction::To => self.count.scale(self.rule.from_count, self.rule.to_count),
        }
    }

    /// Amount of `rule.to_item` received in this step.
    pub fn to_quantity(&self) -> Quantity {
        match self.direction {
            Direction::From => self.count.scale(self.rule.to_count, self.rule.from_count),
            Direction::To => self.count.clone(),
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "From {} {} to {} {} at {}",
            self.from_quantity(),
            self.rule.from_item,
            self.to_quantity(),
            self.rule.to_item,
            self.rule.location
        )
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult};

/// Human-facing order number: `ORD-YYYYMMDD-NNNN`.
///
/// The date is the UTC creation date; the suffix is a zero-padded value in
/// `0..=9999`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber(String);

impl OrderNumber {
    pub const PREFIX: &'static str = "ORD";
    pub const MAX_SUFFIX: u16 = 9999;

    pub fn compose(date: NaiveDate, suffix: u16) -> DomainResult<Self> {
        if suffix > Self::MAX_SUFFIX {
            return Err(DomainError::invalid_id(format!(
                "order number suffix {suffix} exceeds {}",
                Self::MAX_SUFFIX
            )));
        }
        Ok(Self(format!(
            "{}-{}-{suffix:04}",
            Self::PREFIX,
            date.format("%Y%m%d")
        )))
    }

    /// Compose from the UTC calendar date of `at`.
    pub fn for_instant(at: DateTime<Utc>, suffix: u16) -> DomainResult<Self> {
        Self::compose(at.date_naive(), suffix)
    }

    pub fn parse(value: &str) -> DomainResult<Self> {
        let invalid = || DomainError::invalid_id(format!("order number '{value}' is malformed"));

        let mut parts = value.split('-');
        let (Some(prefix), Some(date), Some(suffix), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };
        if prefix != Self::PREFIX
            || date.len() != 8
            || suffix.len() != 4
            || !suffix.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        NaiveDate::parse_from_str(date, "%Y%m%d").map_err(|_| invalid())?;

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.0[4..12], "%Y%m%d").ok()
    }

    pub fn suffix(&self) -> u16 {
        self.0[13..].parse().unwrap_or_default()
    }
}

impl core::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OrderNumber> for String {
    fn from(value: OrderNumber) -> Self {
        value.0
    }
}

impl core::str::FromStr for OrderNumber {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Source of order-number suffixes.
///
/// Production uses a uniform random draw over `0..=9999`; tests inject a
/// deterministic sequence. Uniqueness is enforced by the store, not here.
pub trait OrderNumberGenerator: Send + Sync {
    fn next_suffix(&self) -> u16;
}

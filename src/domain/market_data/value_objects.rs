use chrono::{DateTime, NaiveDate, Utc};
use derive_more::{Constructor, Deref, Display, From, Into};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use strum::{AsRefStr, Display as StrumDisplay, EnumIter, EnumString};

use crate::domain::errors::DomainError;

/// Value Object - price
#[derive(Debug, Clone, Copy, PartialEq, From, Into, Deref, Constructor, Serialize, Deserialize)]
pub struct Price(f64);

impl Price {
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl PartialOrd for Price {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

/// Value Object - traded volume
#[derive(Debug, Clone, Copy, PartialEq, Default, From, Into, Deref, Constructor, Serialize, Deserialize)]
pub struct Volume(f64);

impl Volume {
    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Value Object - UTC unix timestamp in seconds.
///
/// Serializes as the integer the chart library expects. Deserializes from
/// either an integer or a `YYYY-MM-DD` business-day string (midnight UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into, Serialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.0, 0)
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp())
    }

    /// Parse a `YYYY-MM-DD` business day
    pub fn parse_business_day(value: &str) -> Result<Self, DomainError> {
        let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map_err(|e| DomainError::InvalidTimestamp(format!("{value}: {e}")))?;
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| DomainError::InvalidTimestamp(value.to_string()))?;
        Ok(Self(midnight.and_utc().timestamp()))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTime {
    Secs(i64),
    Float(f64),
    Day(String),
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawTime::deserialize(deserializer)? {
            RawTime::Secs(secs) => Ok(Timestamp(secs)),
            RawTime::Float(secs) => Ok(Timestamp(secs as i64)),
            RawTime::Day(day) => {
                Timestamp::parse_business_day(&day).map_err(serde::de::Error::custom)
            }
        }
    }
}

/// Value Object - instrument ticker
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deref, Display, Serialize, Deserialize)]
#[display(fmt = "{}", _0)]
pub struct Ticker(String);

impl Ticker {
    pub fn new(ticker: &str) -> Result<Self, DomainError> {
        let trimmed = ticker.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidTicker("Ticker cannot be empty".to_string()));
        }
        Ok(Self(trimmed.to_uppercase()))
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Ticker {
    fn from(value: &str) -> Self {
        Self(value.trim().to_uppercase())
    }
}

/// Value Object - history window requested from the backend
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, StrumDisplay, EnumIter, EnumString, AsRefStr,
    Serialize, Deserialize,
)]
pub enum HistoryPeriod {
    #[strum(serialize = "1mo")]
    #[serde(rename = "1mo")]
    OneMonth,

    #[strum(serialize = "3mo")]
    #[serde(rename = "3mo")]
    ThreeMonths,

    #[strum(serialize = "6mo")]
    #[serde(rename = "6mo")]
    SixMonths,

    #[default]
    #[strum(serialize = "1y")]
    #[serde(rename = "1y")]
    OneYear,

    #[strum(serialize = "2y")]
    #[serde(rename = "2y")]
    TwoYears,

    #[strum(serialize = "5y")]
    #[serde(rename = "5y")]
    FiveYears,

    #[strum(serialize = "max")]
    #[serde(rename = "max")]
    Max,
}

impl HistoryPeriod {
    /// Unknown periods fall back to one year, as the backend does
    pub fn parse_or_default(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }

    pub fn as_query(&self) -> &str {
        self.as_ref()
    }
}

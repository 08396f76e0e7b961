use chrono::{DateTime, NaiveDate, NaiveDateTime};
use derive_more::Display;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator};

use crate::domain::errors::AppError;

/// Value Object - time key shared by candles, indicator points and drawings.
///
/// Daily and coarser data is keyed by calendar date, intraday data by Unix
/// seconds. Every series consumed together uses the same representation, so
/// lookups compare keys by equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeKey {
    Day(NaiveDate),
    Unix(i64),
}

const SECONDS_PER_DAY: i64 = 86_400;

impl TimeKey {
    /// Parse an upstream date string for the given display resolution.
    pub fn parse(raw: &str, interval: TimeInterval) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if interval.is_daily() {
            let date_part = raw.split(|c: char| c == 'T' || c == ' ').next()?;
            return NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok().map(TimeKey::Day);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(TimeKey::Unix(dt.timestamp()));
        }
        if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
            return Some(TimeKey::Unix(dt.timestamp()));
        }
        for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
                return Some(TimeKey::Unix(dt.and_utc().timestamp()));
            }
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| TimeKey::Unix(dt.and_utc().timestamp()))
    }

    /// Key for an epoch value in milliseconds (pandas `index` columns).
    pub fn from_millis(ms: i64, interval: TimeInterval) -> Option<Self> {
        let seconds = ms.div_euclid(1000);
        if interval.is_daily() {
            DateTime::from_timestamp(seconds, 0).map(|dt| TimeKey::Day(dt.date_naive()))
        } else {
            Some(TimeKey::Unix(seconds))
        }
    }

    /// Seconds since the Unix epoch, dates at midnight UTC.
    pub fn unix_seconds(&self) -> i64 {
        match self {
            TimeKey::Unix(seconds) => *seconds,
            TimeKey::Day(date) => {
                let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
                date.signed_duration_since(epoch).num_days() * SECONDS_PER_DAY
            }
        }
    }

    pub fn as_f64(&self) -> f64 {
        self.unix_seconds() as f64
    }
}

impl std::fmt::Display for TimeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeKey::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            TimeKey::Unix(seconds) => write!(f, "{}", seconds),
        }
    }
}

impl Serialize for TimeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TimeKey::Day(date) => serializer.serialize_str(&date.format("%Y-%m-%d").to_string()),
            TimeKey::Unix(seconds) => serializer.serialize_i64(*seconds),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimeKey {
    Integer(i64),
    Float(f64),
    Text(String),
    BusinessDay { year: i32, month: u32, day: u32 },
}

impl<'de> Deserialize<'de> for TimeKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawTimeKey::deserialize(deserializer)? {
            RawTimeKey::Integer(seconds) => Ok(TimeKey::Unix(seconds)),
            RawTimeKey::Float(seconds) if seconds.is_finite() => Ok(TimeKey::Unix(seconds.floor() as i64)),
            RawTimeKey::Float(_) => Err(serde::de::Error::custom("non-finite time key")),
            RawTimeKey::Text(text) => {
                let date_part = text.split('T').next().unwrap_or_default();
                NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                    .map(TimeKey::Day)
                    .map_err(|e| serde::de::Error::custom(format!("invalid date key {}: {}", text, e)))
            }
            RawTimeKey::BusinessDay { year, month, day } => NaiveDate::from_ymd_opt(year, month, day)
                .map(TimeKey::Day)
                .ok_or_else(|| serde::de::Error::custom("invalid business day")),
        }
    }
}

/// Value Object - instrument symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[display(fmt = "{}", _0)]
pub struct Symbol(String);

/// Exchange suffix appended to bare local tickers.
pub const DEFAULT_EXCHANGE_SUFFIX: &str = ".IS";

impl Symbol {
    pub fn new(symbol: String) -> Result<Self, AppError> {
        let trimmed = symbol.trim();
        if trimmed.is_empty() {
            return Err(AppError::ValidationError("Symbol cannot be empty".to_string()));
        }
        Ok(Self(trimmed.to_uppercase()))
    }

    /// Bare tickers (no exchange suffix, at most five characters) are local listings.
    pub fn normalized(&self) -> Symbol {
        if !self.0.contains('.') && self.0.chars().count() <= 5 {
            Symbol(format!("{}{}", self.0, DEFAULT_EXCHANGE_SUFFIX))
        } else {
            self.clone()
        }
    }

    /// Ticker without the exchange suffix, for headers.
    pub fn display_name(&self) -> &str {
        self.0
            .strip_suffix(DEFAULT_EXCHANGE_SUFFIX)
            .or_else(|| self.0.strip_suffix("=X"))
            .unwrap_or(&self.0)
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self(value.trim().to_uppercase())
    }
}

/// Value Object - display resolution requested from the API
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, EnumString, AsRefStr, Serialize, Deserialize,
)]
pub enum TimeInterval {
    #[display(fmt = "1m")]
    #[strum(serialize = "1m")]
    #[serde(rename = "1m")]
    OneMinute,

    #[display(fmt = "5m")]
    #[strum(serialize = "5m")]
    #[serde(rename = "5m")]
    FiveMinutes,

    #[display(fmt = "15m")]
    #[strum(serialize = "15m")]
    #[serde(rename = "15m")]
    FifteenMinutes,

    #[display(fmt = "1h")]
    #[strum(serialize = "1h")]
    #[serde(rename = "1h")]
    OneHour,

    #[default]
    #[display(fmt = "1d")]
    #[strum(serialize = "1d")]
    #[serde(rename = "1d")]
    OneDay,

    #[display(fmt = "1wk")]
    #[strum(serialize = "1wk")]
    #[serde(rename = "1wk")]
    OneWeek,
}

impl TimeInterval {
    /// Query-string value understood by the API.
    pub fn as_query(&self) -> &str {
        self.as_ref()
    }

    /// Daily and coarser bars are keyed by calendar date.
    pub fn is_daily(&self) -> bool {
        matches!(self, TimeInterval::OneDay | TimeInterval::OneWeek)
    }

    pub fn all() -> Vec<TimeInterval> {
        TimeInterval::iter().collect()
    }

    /// Toolbar label
    pub fn label(&self) -> String {
        self.as_ref().to_uppercase()
    }
}

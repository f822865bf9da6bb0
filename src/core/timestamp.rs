//! Timestamp layouts for encoded records
//!
//! The default layout is the human-readable `2025-01-08 10:30:45` form. Named
//! layouts cover RFC 3339, ISO 8601 with milliseconds and numeric Unix times;
//! anything else is treated as a strftime pattern and validated up front so a
//! bad pattern fails logger construction instead of the first log call.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use std::str::FromStr;

pub const DEFAULT_TIME_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp layout used by both encoders
///
/// # Examples
///
/// ```
/// use tee_logger::TimestampFormat;
///
/// let format: TimestampFormat = "rfc3339".parse().unwrap();
/// assert_eq!(format, TimestampFormat::Rfc3339);
///
/// let custom: TimestampFormat = "%d/%b/%Y:%H:%M:%S %z".parse().unwrap();
/// assert!(matches!(custom, TimestampFormat::Custom(_)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimestampFormat {
    /// `2025-01-08 10:30:45`, local time
    #[default]
    Human,

    /// `2025-01-08T10:30:45.123+09:00`
    Iso8601,

    /// `2025-01-08T10:30:45.123456789+09:00`
    Rfc3339,

    /// Unix timestamp in seconds: `1736332245`
    Unix,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Validated strftime pattern
    Custom(String),
}

impl TimestampFormat {
    /// Build a custom layout, rejecting patterns chrono cannot render
    pub fn custom(pattern: &str) -> Result<Self, String> {
        let format = TimestampFormat::Custom(pattern.to_string());
        format.validate()?;
        Ok(format)
    }

    /// Check that chrono can render this layout. Only `Custom` can fail.
    pub fn validate(&self) -> Result<(), String> {
        let TimestampFormat::Custom(pattern) = self else {
            return Ok(());
        };
        if pattern.is_empty() {
            return Err("empty time layout".to_string());
        }
        if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            return Err(format!("invalid strftime pattern '{}'", pattern));
        }
        Ok(())
    }

    /// Render a timestamp. A pattern chrono cannot render yields `fmt::Error`
    /// instead of a panic.
    pub fn format(&self, datetime: &DateTime<Local>) -> Result<String, fmt::Error> {
        let mut out = String::new();
        match self {
            TimestampFormat::Human => write!(out, "{}", datetime.format(DEFAULT_TIME_LAYOUT))?,
            TimestampFormat::Iso8601 => {
                write!(out, "{}", datetime.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))?
            }
            TimestampFormat::Rfc3339 => out.push_str(&datetime.to_rfc3339()),
            TimestampFormat::Unix => write!(out, "{}", datetime.timestamp())?,
            TimestampFormat::UnixMillis => write!(out, "{}", datetime.timestamp_millis())?,
            TimestampFormat::Custom(pattern) => write!(out, "{}", datetime.format(pattern))?,
        }
        Ok(out)
    }

    /// Numeric layouts become JSON numbers, everything else a JSON string
    pub fn to_json(&self, datetime: &DateTime<Local>) -> Result<serde_json::Value, fmt::Error> {
        Ok(match self {
            TimestampFormat::Unix => serde_json::Value::Number(datetime.timestamp().into()),
            TimestampFormat::UnixMillis => {
                serde_json::Value::Number(datetime.timestamp_millis().into())
            }
            _ => serde_json::Value::String(self.format(datetime)?),
        })
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, TimestampFormat::Unix | TimestampFormat::UnixMillis)
    }

    fn name(&self) -> &str {
        match self {
            TimestampFormat::Human => "human",
            TimestampFormat::Iso8601 => "iso8601",
            TimestampFormat::Rfc3339 => "rfc3339",
            TimestampFormat::Unix => "unix",
            TimestampFormat::UnixMillis => "unix_millis",
            TimestampFormat::Custom(pattern) => pattern,
        }
    }
}

impl fmt::Display for TimestampFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TimestampFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "" | "human" | "default" => Ok(TimestampFormat::Human),
            "iso8601" => Ok(TimestampFormat::Iso8601),
            "rfc3339" => Ok(TimestampFormat::Rfc3339),
            "unix" => Ok(TimestampFormat::Unix),
            "unix_millis" | "unixmillis" => Ok(TimestampFormat::UnixMillis),
            _ => TimestampFormat::custom(s),
        }
    }
}

impl TryFrom<String> for TimestampFormat {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimestampFormat> for String {
    fn from(format: TimestampFormat) -> Self {
        format.name().to_string()
    }
}

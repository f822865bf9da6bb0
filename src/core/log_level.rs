//! Severity definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Record severity. The derived ordering is the one every filter uses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum LogLevel {
    Debug = 0,
    #[default]
    Info = 1,
    Warn = 2,
    Error = 3,
    /// Logged like `Error`; panics afterwards when the logger is in development mode.
    DPanic = 4,
    Panic = 5,
    Fatal = 6,
}

impl LogLevel {
    pub const ALL: [LogLevel; 7] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::DPanic,
        LogLevel::Panic,
        LogLevel::Fatal,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::DPanic => "DPANIC",
            LogLevel::Panic => "PANIC",
            LogLevel::Fatal => "FATAL",
        }
    }

    /// Name used by the JSON encoder
    pub fn as_lowercase(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::DPanic => "dpanic",
            LogLevel::Panic => "panic",
            LogLevel::Fatal => "fatal",
        }
    }

    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            LogLevel::Debug => Magenta,
            LogLevel::Info => Blue,
            LogLevel::Warn => Yellow,
            LogLevel::Error => Red,
            LogLevel::DPanic | LogLevel::Panic | LogLevel::Fatal => BrightRed,
        }
    }

    /// Records at or above `Error` belong to the high-priority band
    #[inline]
    pub fn is_high_priority(&self) -> bool {
        *self >= LogLevel::Error
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "dpanic" => Ok(LogLevel::DPanic),
            "panic" => Ok(LogLevel::Panic),
            "fatal" => Ok(LogLevel::Fatal),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}

/// Config files go through the same case-insensitive parser as `FromStr`
impl TryFrom<String> for LogLevel {
    type Error = String;

    // `Self::Error` collides with the `Error` variant
    fn try_from(value: String) -> Result<Self, String> {
        value.parse()
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.as_lowercase().to_string()
    }
}

//! The per-call record handed to encoders

use super::field::Fields;
use super::log_level::LogLevel;
use chrono::{DateTime, Local};
use std::backtrace::Backtrace;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Source location of the logging call site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub file: &'static str,
    pub line: u32,
}

impl Caller {
    pub fn from_location(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
        }
    }

    /// Trimmed form: the file and its parent directory only
    pub fn short(&self) -> String {
        let file = self.file.replace('\\', "/");
        let trimmed = match file.rmatch_indices('/').nth(1) {
            Some((idx, _)) => &file[idx + 1..],
            None => file.as_str(),
        };
        format!("{}:{}", trimmed, self.line)
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short())
    }
}

/// One log call. Lives only for the duration of encode + write.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Local>,
    pub caller: Option<Caller>,
    pub logger_name: Option<Arc<str>>,
    pub fields: Fields,
    /// Captured only for high-priority records
    pub stacktrace: Option<String>,
}

impl LogRecord {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Local::now(),
            caller: None,
            logger_name: None,
            fields: Fields::new(),
            stacktrace: None,
        }
    }

    pub fn with_caller(mut self, location: &'static Location<'static>) -> Self {
        self.caller = Some(Caller::from_location(location));
        self
    }

    pub fn with_fields(mut self, fields: Fields) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_logger_name(mut self, name: Option<Arc<str>>) -> Self {
        self.logger_name = name;
        self
    }

    /// Attach a stack trace when the level calls for one
    pub fn capture_stacktrace(mut self) -> Self {
        if self.level.is_high_priority() {
            self.stacktrace = Some(Backtrace::force_capture().to_string());
        }
        self
    }
}

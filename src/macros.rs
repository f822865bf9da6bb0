//! Logging macros mirroring the variadic `key, value, ...` call style.
//!
//! Every argument after the message is converted with `FieldValue::from`,
//! so keys and values may be any type with a `From` conversion. Pairing
//! follows [`Fields::from_key_values`](crate::Fields::from_key_values): a
//! dangling key is reported under `ignored`, a non-string key under
//! `invalid`.
//!
//! # Examples
//!
//! ```
//! use tee_logger::prelude::*;
//! use tee_logger::info;
//!
//! let logger = Logger::nop();
//!
//! // Message only
//! info!(logger, "Server started");
//!
//! // With structured fields
//! let port = 8080;
//! info!(logger, "Server listening", "port", port, "tls", false);
//! ```

/// Log at an explicit level.
///
/// # Examples
///
/// ```
/// # use tee_logger::prelude::*;
/// # let logger = Logger::nop();
/// use tee_logger::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Request failed", "status", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $msg:expr $(, $kv:expr)* $(,)?) => {
        $logger.log($level, $msg, &[$($crate::FieldValue::from($kv)),*])
    };
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use tee_logger::prelude::*;
/// # let logger = Logger::nop();
/// use tee_logger::debug;
/// debug!(logger, "Cache lookup", "key", "user:42", "hit", true);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $msg:expr $(, $kv:expr)* $(,)?) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $msg $(, $kv)*)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $msg:expr $(, $kv:expr)* $(,)?) => {
        $crate::log!($logger, $crate::LogLevel::Info, $msg $(, $kv)*)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $msg:expr $(, $kv:expr)* $(,)?) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $msg $(, $kv)*)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use tee_logger::prelude::*;
/// # let logger = Logger::nop();
/// use tee_logger::error;
/// use std::time::Duration;
/// error!(logger, "Upstream timed out", "upstream", "billing", "after", Duration::from_secs(3));
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $msg:expr $(, $kv:expr)* $(,)?) => {
        $crate::log!($logger, $crate::LogLevel::Error, $msg $(, $kv)*)
    };
}

//! Error types for the routing engine

use std::fmt;

pub type Result<T> = std::result::Result<T, LoggerError>;

/// A single writer that failed during [`crate::Logger::sync`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterFailure {
    pub writer: String,
    pub message: String,
}

impl fmt::Display for WriterFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.writer, self.message)
    }
}

fn join_failures(failures: &[WriterFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// File writer error with path
    #[error("File writer error for '{path}': {message}")]
    FileAppenderError { path: String, message: String },

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotationError { path: String, message: String },

    /// Remote collector could not be reached or written to
    #[error("Network writer error for '{address}': {message}")]
    NetworkError { address: String, message: String },

    /// One or more writers failed to flush
    #[error("Sync failed for {} writer(s): {}", .failures.len(), join_failures(.failures))]
    SyncFailed { failures: Vec<WriterFailure> },

    /// A record could not be rendered by an encoder
    #[error("{encoder} encoder failed: {message}")]
    EncodeError {
        encoder: &'static str,
        message: String,
    },
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a file writer error
    pub fn file_appender(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileAppenderError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotationError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn network(address: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::NetworkError {
            address: address.into(),
            message: message.into(),
        }
    }

    pub fn encode(encoder: &'static str, message: impl Into<String>) -> Self {
        LoggerError::EncodeError {
            encoder,
            message: message.into(),
        }
    }

    /// True for errors raised while assembling a logger rather than while writing
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            LoggerError::InvalidConfiguration { .. }
                | LoggerError::FileAppenderError { .. }
                | LoggerError::NetworkError { .. }
        )
    }
}

//! Core logger types and traits

pub mod config;
pub mod encoder;
pub mod error;
pub mod field;
pub mod log_level;
pub mod log_record;
pub mod logger;
pub mod metrics;
pub mod tee;
pub mod timestamp;
pub mod writer;

pub use config::{FileOptions, LoggerConfig, OutputKind};
pub use encoder::{Encoder, JsonEncoder, TextEncoder};
pub use error::{LoggerError, Result, WriterFailure};
pub use field::{FieldValue, Fields, IGNORED_KEY, INVALID_KEY};
pub use log_level::LogLevel;
pub use log_record::{Caller, LogRecord};
pub use logger::{Logger, LoggerBuilder};
pub use metrics::LoggerMetrics;
pub use tee::{LevelFilter, Route, Tee};
pub use timestamp::{TimestampFormat, DEFAULT_TIME_LAYOUT};
pub use writer::WriteSyncer;

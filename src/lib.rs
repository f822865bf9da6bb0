//! # Tee Logger
//!
//! A leveled, multi-sink log routing engine. Structured log calls are encoded
//! once per encoding and fanned out to console, rotating file and network
//! destinations, each with its own level filter.
//!
//! ## Features
//!
//! - **Severity Split**: console records at or above `Error` go to stderr,
//!   the rest to stdout; an optional error file collects high-severity records
//! - **Rotating Files**: size-based rotation with numbered, optionally gzipped
//!   backups and count/age retention
//! - **Structured Fields**: text (`key=value`) and line-delimited JSON encodings
//! - **Thread Safe**: every writer guards its own resource; records are never
//!   interleaved within a destination

pub mod core;
pub mod macros;
pub mod writers;

pub mod prelude {
    pub use crate::core::{
        FieldValue, Fields, FileOptions, LevelFilter, LogLevel, Logger, LoggerBuilder,
        LoggerConfig, LoggerError, LoggerMetrics, OutputKind, Result, TimestampFormat,
        WriteSyncer,
    };
    pub use crate::writers::{ConsoleTarget, RotationPolicy};
}

pub use crate::core::{
    Caller, Encoder, FieldValue, Fields, FileOptions, JsonEncoder, LevelFilter, LogLevel,
    LogRecord, Logger, LoggerBuilder, LoggerConfig, LoggerError, LoggerMetrics, OutputKind,
    Result, Route, Tee, TextEncoder, TimestampFormat, WriteSyncer, WriterFailure,
    DEFAULT_TIME_LAYOUT, IGNORED_KEY, INVALID_KEY,
};
pub use crate::writers::{RotationPolicy, Writer};

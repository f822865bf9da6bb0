//! Logger facade and programmatic builder

use super::{
    encoder::Encoder,
    error::{LoggerError, Result},
    field::{FieldValue, Fields},
    log_level::LogLevel,
    log_record::LogRecord,
    metrics::LoggerMetrics,
    tee::{LevelFilter, Route, Tee},
    timestamp::TimestampFormat,
};
use crate::writers::{
    ConsoleTarget, ConsoleWriter, NetworkWriter, RotatingFileWriter, RotationPolicy, Writer,
};
use std::panic::Location;
use std::path::PathBuf;
use std::sync::Arc;

struct LoggerCore {
    tee: Tee,
    level: LogLevel,
    development: bool,
}

/// Leveled, structured logger fanning out to every configured destination.
///
/// Cloning is cheap: clones and derived loggers ([`Logger::named`],
/// [`Logger::with_fields`]) share the same writers.
///
/// # Example
///
/// ```
/// use tee_logger::prelude::*;
/// use tee_logger::writers::CaptureBuffer;
///
/// let stdout = CaptureBuffer::new();
/// let stderr = CaptureBuffer::new();
/// let logger = Logger::builder()
///     .level(LogLevel::Info)
///     .console_to(
///         ConsoleTarget::Capture(stdout.clone()),
///         ConsoleTarget::Capture(stderr.clone()),
///     )
///     .build()
///     .unwrap();
///
/// logger.info("start", &["port".into(), 8081.into()]);
/// assert!(stdout.contents().contains("port=8081"));
/// assert!(stderr.is_empty());
/// ```
#[derive(Clone)]
pub struct Logger {
    core: Arc<LoggerCore>,
    name: Option<Arc<str>>,
    fields: Arc<Fields>,
}

impl Logger {
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Logger with no destinations; every call is a no-op
    #[must_use]
    pub fn nop() -> Self {
        Self::from_tee(Tee::new(Vec::new(), Arc::new(LoggerMetrics::new())), LogLevel::Info)
    }

    fn from_tee(tee: Tee, level: LogLevel) -> Self {
        Self {
            core: Arc::new(LoggerCore {
                tee,
                level,
                development: false,
            }),
            name: None,
            fields: Arc::new(Fields::new()),
        }
    }

    #[track_caller]
    pub fn debug(&self, message: impl Into<String>, key_values: &[FieldValue]) {
        self.log(LogLevel::Debug, message, key_values);
    }

    #[track_caller]
    pub fn info(&self, message: impl Into<String>, key_values: &[FieldValue]) {
        self.log(LogLevel::Info, message, key_values);
    }

    #[track_caller]
    pub fn warn(&self, message: impl Into<String>, key_values: &[FieldValue]) {
        self.log(LogLevel::Warn, message, key_values);
    }

    #[track_caller]
    pub fn error(&self, message: impl Into<String>, key_values: &[FieldValue]) {
        self.log(LogLevel::Error, message, key_values);
    }

    /// Log at `DPanic`; in development mode, sync and panic afterwards
    #[track_caller]
    pub fn dpanic(&self, message: impl Into<String>, key_values: &[FieldValue]) {
        let message = message.into();
        self.log(LogLevel::DPanic, message.as_str(), key_values);
        if self.core.development {
            self.sync_before_exit();
            panic!("{}", message);
        }
    }

    /// Log at `Panic`, sync every writer, then panic with `message`.
    ///
    /// A failed sync is reported on stderr and never suppresses the panic.
    #[track_caller]
    pub fn panic(&self, message: impl Into<String>, key_values: &[FieldValue]) -> ! {
        let message = message.into();
        self.log(LogLevel::Panic, message.as_str(), key_values);
        self.sync_before_exit();
        panic!("{}", message);
    }

    /// Log at `Fatal`, sync every writer, then exit the process with status 1
    #[track_caller]
    pub fn fatal(&self, message: impl Into<String>, key_values: &[FieldValue]) -> ! {
        self.log(LogLevel::Fatal, message, key_values);
        self.sync_before_exit();
        std::process::exit(1);
    }

    /// Log with a variadic `key, value, key, value, ...` sequence
    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl Into<String>, key_values: &[FieldValue]) {
        if !self.enabled(level) {
            return;
        }
        self.emit(
            level,
            message.into(),
            Fields::from_key_values(key_values),
            Location::caller(),
        );
    }

    /// Log with already-built fields
    #[track_caller]
    pub fn log_fields(&self, level: LogLevel, message: impl Into<String>, fields: Fields) {
        if !self.enabled(level) {
            return;
        }
        self.emit(level, message.into(), fields, Location::caller());
    }

    fn emit(
        &self,
        level: LogLevel,
        message: String,
        call_fields: Fields,
        location: &'static Location<'static>,
    ) {
        let fields = if self.fields.is_empty() {
            call_fields
        } else {
            let mut merged = (*self.fields).clone();
            merged.merge(&call_fields);
            merged
        };

        let record = LogRecord::new(level, message)
            .with_caller(location)
            .with_logger_name(self.name.clone())
            .with_fields(fields)
            .capture_stacktrace();

        self.core.tee.metrics().record_logged();
        self.core.tee.dispatch(&record);
    }

    fn sync_before_exit(&self) {
        if let Err(e) = self.sync() {
            eprintln!("[LOGGER ERROR] Failed to sync before exit: {}", e);
        }
    }

    /// Flush every distinct writer.
    ///
    /// All writers are attempted even when some fail.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::SyncFailed`] listing each writer that failed
    pub fn sync(&self) -> Result<()> {
        self.core.tee.sync()
    }

    /// Whether a record at `level` would reach any destination
    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.core.tee.enabled(level)
    }

    /// Threshold the logger was built with
    pub fn level(&self) -> LogLevel {
        self.core.level
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_development(&self) -> bool {
        self.core.development
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        self.core.tee.metrics()
    }

    /// Child logger adding static fields to every record.
    ///
    /// Fields passed at the call site win over these on duplicate keys.
    #[must_use]
    pub fn with_fields(&self, key_values: &[FieldValue]) -> Self {
        let mut fields = (*self.fields).clone();
        fields.merge(&Fields::from_key_values(key_values));
        Self {
            core: Arc::clone(&self.core),
            name: self.name.clone(),
            fields: Arc::new(fields),
        }
    }

    /// Child logger with `name` appended to this logger's name, dot-separated
    #[must_use]
    pub fn named(&self, name: &str) -> Self {
        let name: Arc<str> = match self.name {
            Some(ref parent) if !name.is_empty() => Arc::from(format!("{}.{}", parent, name)),
            Some(ref parent) => Arc::clone(parent),
            None => Arc::from(name),
        };
        Self {
            core: Arc::clone(&self.core),
            name: Some(name),
            fields: Arc::clone(&self.fields),
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.core.level)
            .field("name", &self.name)
            .field("routes", &self.core.tee.routes().len())
            .finish()
    }
}

#[derive(Debug, Clone)]
struct FileTarget {
    path: PathBuf,
    policy: RotationPolicy,
}

/// Builder for [`Logger`]
///
/// Console destinations use the text encoder and split at `Error`: lower
/// records go to the low stream (stdout), the rest to the high stream
/// (stderr). File and network destinations use JSON. A separate error file
/// additionally receives every record at or above `Error`.
///
/// # Example
/// ```no_run
/// use tee_logger::prelude::*;
///
/// let logger = Logger::builder()
///     .level(LogLevel::Debug)
///     .name("api")
///     .console()
///     .file("/var/log/api/app.log", RotationPolicy::new().with_max_size_mb(50))
///     .separate_error_file("/var/log/api/error.log", RotationPolicy::new())
///     .build()
///     .expect("Failed to build logger");
/// ```
pub struct LoggerBuilder {
    level: LogLevel,
    name: Option<String>,
    fields: Fields,
    time_format: TimestampFormat,
    colors: bool,
    development: bool,
    console: Option<(ConsoleTarget, ConsoleTarget)>,
    file: Option<FileTarget>,
    error_file: Option<FileTarget>,
    remote_addr: Option<String>,
    routes: Vec<Route>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            level: LogLevel::Info,
            name: None,
            fields: Fields::new(),
            time_format: TimestampFormat::default(),
            colors: true,
            development: false,
            console: None,
            file: None,
            error_file: None,
            remote_addr: None,
            routes: Vec::new(),
        }
    }

    /// Minimum severity for every threshold-based destination
    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Static field added to every record
    #[must_use = "builder methods return a new value"]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.add_field(key, value);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn fields(mut self, fields: Fields) -> Self {
        self.fields.merge(&fields);
        self
    }

    /// Timestamp layout for every encoder. A `Custom` pattern is checked by
    /// [`LoggerBuilder::build`].
    #[must_use = "builder methods return a new value"]
    pub fn time_format(mut self, format: TimestampFormat) -> Self {
        self.time_format = format;
        self
    }

    /// Color console levels when both streams are terminals (default: on)
    #[must_use = "builder methods return a new value"]
    pub fn colors(mut self, enabled: bool) -> Self {
        self.colors = enabled;
        self
    }

    /// Development mode makes `dpanic` panic
    #[must_use = "builder methods return a new value"]
    pub fn development(mut self, enabled: bool) -> Self {
        self.development = enabled;
        self
    }

    /// Console output split between stdout and stderr
    #[must_use = "builder methods return a new value"]
    pub fn console(self) -> Self {
        self.console_to(ConsoleTarget::Stdout, ConsoleTarget::Stderr)
    }

    /// Console output with explicit low and high band targets
    #[must_use = "builder methods return a new value"]
    pub fn console_to(mut self, low: ConsoleTarget, high: ConsoleTarget) -> Self {
        self.console = Some((low, high));
        self
    }

    /// Rotating JSON file receiving every record at or above the level
    #[must_use = "builder methods return a new value"]
    pub fn file(mut self, path: impl Into<PathBuf>, policy: RotationPolicy) -> Self {
        self.file = Some(FileTarget {
            path: path.into(),
            policy,
        });
        self
    }

    /// Second rotating JSON file receiving only records at or above `Error`.
    /// Requires [`LoggerBuilder::file`]. If `path` is the primary file's path,
    /// a single writer is kept with the primary file's policy and `policy` is
    /// ignored.
    #[must_use = "builder methods return a new value"]
    pub fn separate_error_file(mut self, path: impl Into<PathBuf>, policy: RotationPolicy) -> Self {
        self.error_file = Some(FileTarget {
            path: path.into(),
            policy,
        });
        self
    }

    /// JSON records streamed to a TCP collector
    #[must_use = "builder methods return a new value"]
    pub fn network(mut self, address: impl Into<String>) -> Self {
        self.remote_addr = Some(address.into());
        self
    }

    /// Extra route appended after the configured destinations
    #[must_use = "builder methods return a new value"]
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Open every destination and assemble the logger.
    ///
    /// # Errors
    ///
    /// Fails without a partial logger if any destination cannot be opened or
    /// the options are inconsistent
    pub fn build(self) -> Result<Logger> {
        self.time_format
            .validate()
            .map_err(|message| LoggerError::config("time_format", message))?;
        if self.error_file.is_some() && self.file.is_none() {
            return Err(LoggerError::config(
                "error_file",
                "a separate error file requires a primary file output",
            ));
        }

        let mut routes = Vec::new();
        let json = Arc::new(Encoder::json(self.time_format.clone()));

        if let Some((low, high)) = self.console {
            let low = ConsoleWriter::new(low);
            let high = ConsoleWriter::new(high);
            let use_colors = self.colors && low.is_terminal() && high.is_terminal();
            let text = Arc::new(Encoder::text(self.time_format.clone(), use_colors));

            let low_filter = LevelFilter::low_band(self.level);
            if !low_filter.is_empty() {
                routes.push(Route::new(
                    low_filter,
                    Arc::clone(&text),
                    Arc::new(Writer::from(low)),
                ));
            }
            routes.push(Route::new(
                LevelFilter::high_band(self.level),
                text,
                Arc::new(Writer::from(high)),
            ));
        }

        if let Some(file) = self.file {
            let primary = Arc::new(Writer::from(RotatingFileWriter::new(
                &file.path,
                file.policy,
            )?));
            routes.push(Route::new(
                LevelFilter::AtLeast(self.level),
                Arc::clone(&json),
                primary,
            ));

            match self.error_file {
                Some(ref error_file) if error_file.path == file.path => {
                    eprintln!(
                        "[LOGGER WARNING] Error file '{}' is the primary file; \
                         using a single destination with the primary rotation policy",
                        file.path.display()
                    );
                }
                Some(error_file) => {
                    let errors = Arc::new(Writer::from(RotatingFileWriter::new(
                        &error_file.path,
                        error_file.policy,
                    )?));
                    routes.push(Route::new(
                        LevelFilter::high_band(self.level),
                        Arc::clone(&json),
                        errors,
                    ));
                }
                None => {}
            }
        }

        if let Some(address) = self.remote_addr {
            let remote = Arc::new(Writer::from(NetworkWriter::connect(&address)?));
            routes.push(Route::new(LevelFilter::AtLeast(self.level), json, remote));
        }

        routes.extend(self.routes);

        let tee = Tee::new(routes, Arc::new(LoggerMetrics::new()));
        Ok(Logger {
            core: Arc::new(LoggerCore {
                tee,
                level: self.level,
                development: self.development,
            }),
            name: self.name.map(Arc::from),
            fields: Arc::new(self.fields),
        })
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

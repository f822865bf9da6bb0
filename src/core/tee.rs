//! Level-filtered fan-out of records to destinations
//!
//! A [`Tee`] holds an ordered list of [`Route`]s. Every route is evaluated
//! for every record, so one record may be delivered zero, one or many times.
//! Routes sharing an encoder (same `Arc`) reuse a single encoding of the
//! record, and routes sharing a writer are synced once.

use super::encoder::Encoder;
use super::error::{LoggerError, Result, WriterFailure};
use super::log_level::LogLevel;
use super::log_record::LogRecord;
use super::metrics::LoggerMetrics;
use super::writer::WriteSyncer;
use crate::writers::Writer;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Severity predicate attached to a route
///
/// # Examples
///
/// ```
/// use tee_logger::{LevelFilter, LogLevel};
///
/// let low = LevelFilter::low_band(LogLevel::Info);
/// let high = LevelFilter::high_band(LogLevel::Info);
///
/// assert!(low.accepts(LogLevel::Warn) && !high.accepts(LogLevel::Warn));
/// assert!(!low.accepts(LogLevel::Error) && high.accepts(LogLevel::Error));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelFilter {
    /// `level >= threshold`
    AtLeast(LogLevel),
    /// `min <= level < below`
    Band { min: LogLevel, below: LogLevel },
}

impl LevelFilter {
    /// Records below `Error`, starting at `threshold`
    pub fn low_band(threshold: LogLevel) -> Self {
        LevelFilter::Band {
            min: threshold,
            below: LogLevel::Error,
        }
    }

    /// Records at or above both `threshold` and `Error`
    pub fn high_band(threshold: LogLevel) -> Self {
        LevelFilter::AtLeast(threshold.max(LogLevel::Error))
    }

    #[inline]
    pub fn accepts(&self, level: LogLevel) -> bool {
        match *self {
            LevelFilter::AtLeast(threshold) => level >= threshold,
            LevelFilter::Band { min, below } => level >= min && level < below,
        }
    }

    /// True when no level can pass
    pub fn is_empty(&self) -> bool {
        match *self {
            LevelFilter::AtLeast(_) => false,
            LevelFilter::Band { min, below } => min >= below,
        }
    }
}

/// One (filter, encoder, writer) binding
#[derive(Debug, Clone)]
pub struct Route {
    pub filter: LevelFilter,
    pub encoder: Arc<Encoder>,
    pub writer: Arc<Writer>,
}

impl Route {
    pub fn new(filter: LevelFilter, encoder: Arc<Encoder>, writer: Arc<Writer>) -> Self {
        Self {
            filter,
            encoder,
            writer,
        }
    }
}

/// Router over an immutable set of routes
pub struct Tee {
    routes: Vec<Route>,
    metrics: Arc<LoggerMetrics>,
}

impl Tee {
    pub fn new(routes: Vec<Route>, metrics: Arc<LoggerMetrics>) -> Self {
        Self { routes, metrics }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    /// Whether any route would accept `level`
    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.routes.iter().any(|route| route.filter.accepts(level))
    }

    /// Deliver `record` to every accepting route, returning the number of
    /// successful deliveries.
    ///
    /// **Per-Route Isolation**: each write is wrapped in catch_unwind; an error
    /// or panic in one writer is reported on stderr and counted, and the
    /// remaining routes still receive the record.
    pub fn dispatch(&self, record: &LogRecord) -> usize {
        // (encoder, bytes) pairs; `None` marks an encoder that already failed
        let mut encoded: Vec<(&Arc<Encoder>, Option<Vec<u8>>)> = Vec::new();
        let mut delivered = 0;

        for route in &self.routes {
            if !route.filter.accepts(record.level) {
                continue;
            }

            let slot = match encoded
                .iter()
                .position(|(encoder, _)| Arc::ptr_eq(encoder, &route.encoder))
            {
                Some(slot) => slot,
                None => {
                    let result = catch_unwind(AssertUnwindSafe(|| route.encoder.encode(record)));
                    let bytes = match result {
                        Ok(Ok(bytes)) => Some(bytes),
                        Ok(Err(e)) => {
                            eprintln!("[LOGGER ERROR] {}", e);
                            self.metrics.record_encode_failure();
                            None
                        }
                        Err(panic_info) => {
                            eprintln!(
                                "[LOGGER CRITICAL] {} encoder panicked: {}",
                                route.encoder.name(),
                                panic_message(&*panic_info)
                            );
                            self.metrics.record_encode_failure();
                            None
                        }
                    };
                    encoded.push((&route.encoder, bytes));
                    encoded.len() - 1
                }
            };
            let Some(bytes) = encoded[slot].1.as_deref() else {
                continue;
            };

            let result = catch_unwind(AssertUnwindSafe(|| route.writer.write(bytes)));
            match result {
                Ok(Ok(_)) => {
                    delivered += 1;
                    self.metrics.record_delivered();
                }
                Ok(Err(e)) => {
                    eprintln!(
                        "[LOGGER ERROR] Writer '{}' failed: {}",
                        route.writer.name(),
                        e
                    );
                    self.metrics.record_write_failure();
                }
                Err(panic_info) => {
                    eprintln!(
                        "[LOGGER CRITICAL] Writer '{}' panicked: {}. \
                         Other writers continue to function.",
                        route.writer.name(),
                        panic_message(&*panic_info)
                    );
                    self.metrics.record_write_failure();
                }
            }
        }

        delivered
    }

    /// Flush every distinct writer once, continuing past failures
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::SyncFailed`] listing every writer that failed
    pub fn sync(&self) -> Result<()> {
        let mut seen: Vec<&Arc<Writer>> = Vec::with_capacity(self.routes.len());
        let mut failures = Vec::new();

        for route in &self.routes {
            if seen.iter().any(|w| Arc::ptr_eq(w, &route.writer)) {
                continue;
            }
            seen.push(&route.writer);

            let message = match catch_unwind(AssertUnwindSafe(|| route.writer.sync())) {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e.to_string(),
                Err(panic_info) => format!("panicked: {}", panic_message(&*panic_info)),
            };
            self.metrics.record_sync_failure();
            failures.push(WriterFailure {
                writer: route.writer.name().to_string(),
                message,
            });
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(LoggerError::SyncFailed { failures })
        }
    }
}

fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

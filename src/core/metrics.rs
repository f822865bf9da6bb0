//! Logger metrics for observability
//!
//! Counters for monitoring routing health: records accepted by the facade,
//! per-destination deliveries, and the write, encode and sync failures that
//! are otherwise only reported on stderr.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use tee_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_logged();
/// metrics.record_delivered();
/// metrics.record_write_failure();
///
/// assert_eq!(metrics.total_logged(), 1);
/// assert_eq!(metrics.write_failures(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Records that passed the logger threshold
    total_logged: AtomicU64,

    /// Successful (record, destination) writes
    delivered: AtomicU64,

    /// Writes that returned an error or panicked
    write_failures: AtomicU64,

    /// Records an encoder could not render
    encode_failures: AtomicU64,

    /// Writers whose sync failed
    sync_failures: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            total_logged: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            encode_failures: AtomicU64::new(0),
            sync_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn total_logged(&self) -> u64 {
        self.total_logged.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn encode_failures(&self) -> u64 {
        self.encode_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sync_failures(&self) -> u64 {
        self.sync_failures.load(Ordering::Relaxed)
    }

    /// Record an accepted log call; returns the previous count
    #[inline]
    pub fn record_logged(&self) -> u64 {
        self.total_logged.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_delivered(&self) -> u64 {
        self.delivered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_write_failure(&self) -> u64 {
        self.write_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_encode_failure(&self) -> u64 {
        self.encode_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_sync_failure(&self) -> u64 {
        self.sync_failures.fetch_add(1, Ordering::Relaxed)
    }

    /// Failed deliveries as a percentage of attempted deliveries (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been attempted.
    pub fn failure_rate(&self) -> f64 {
        let failed = (self.write_failures() + self.encode_failures()) as f64;
        let total = self.delivered() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.total_logged.store(0, Ordering::Relaxed);
        self.delivered.store(0, Ordering::Relaxed);
        self.write_failures.store(0, Ordering::Relaxed);
        self.encode_failures.store(0, Ordering::Relaxed);
        self.sync_failures.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            total_logged: AtomicU64::new(self.total_logged()),
            delivered: AtomicU64::new(self.delivered()),
            write_failures: AtomicU64::new(self.write_failures()),
            encode_failures: AtomicU64::new(self.encode_failures()),
            sync_failures: AtomicU64::new(self.sync_failures()),
        }
    }
}

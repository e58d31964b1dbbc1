//! Logger metrics for observability
//!
//! Counters cover the enabled path and reconfiguration only. Disabled calls
//! are never counted so that rejecting them stays a single atomic load.

use std::sync::atomic::{AtomicU64, Ordering};

/// Per-logger counters
///
/// # Example
///
/// ```
/// use logcore::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
/// metrics.record_dispatched();
/// metrics.record_format_error();
///
/// assert_eq!(metrics.dispatched(), 1);
/// assert_eq!(metrics.failure_rate(), 50.0);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Records handed to the dispatch sink
    dispatched: AtomicU64,

    /// Calls that failed while rendering their message
    format_errors: AtomicU64,

    /// Calls whose sink write returned an error
    dispatch_errors: AtomicU64,

    /// Calls that passed the flag check but whose snapshot no longer routed the level
    race_skipped: AtomicU64,

    /// Configurations applied
    reconfigurations: AtomicU64,

    /// Listener invocations that returned an error or panicked
    listener_failures: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            dispatched: AtomicU64::new(0),
            format_errors: AtomicU64::new(0),
            dispatch_errors: AtomicU64::new(0),
            race_skipped: AtomicU64::new(0),
            reconfigurations: AtomicU64::new(0),
            listener_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn format_errors(&self) -> u64 {
        self.format_errors.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dispatch_errors(&self) -> u64 {
        self.dispatch_errors.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn race_skipped(&self) -> u64 {
        self.race_skipped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn reconfigurations(&self) -> u64 {
        self.reconfigurations.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn listener_failures(&self) -> u64 {
        self.listener_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dispatched(&self) -> u64 {
        self.dispatched.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_format_error(&self) -> u64 {
        self.format_errors.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dispatch_error(&self) -> u64 {
        self.dispatch_errors.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_race_skipped(&self) -> u64 {
        self.race_skipped.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_reconfiguration(&self) -> u64 {
        self.reconfigurations.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_listener_failures(&self, count: u64) -> u64 {
        self.listener_failures.fetch_add(count, Ordering::Relaxed)
    }

    /// Failed enabled calls as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if no enabled call has completed.
    pub fn failure_rate(&self) -> f64 {
        let failed = (self.format_errors() + self.dispatch_errors()) as f64;
        let total = self.dispatched() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.dispatched.store(0, Ordering::Relaxed);
        self.format_errors.store(0, Ordering::Relaxed);
        self.dispatch_errors.store(0, Ordering::Relaxed);
        self.race_skipped.store(0, Ordering::Relaxed);
        self.reconfigurations.store(0, Ordering::Relaxed);
        self.listener_failures.store(0, Ordering::Relaxed);
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
            dispatched: AtomicU64::new(self.dispatched()),
            format_errors: AtomicU64::new(self.format_errors()),
            dispatch_errors: AtomicU64::new(self.dispatch_errors()),
            race_skipped: AtomicU64::new(self.race_skipped()),
            reconfigurations: AtomicU64::new(self.reconfigurations()),
            listener_failures: AtomicU64::new(self.listener_failures()),
        }
    }
}

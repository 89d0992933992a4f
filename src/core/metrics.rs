//! Logger metrics for observability
//!
//! Counters describing what happened to emitted entries: filtered out by the
//! level threshold, accepted into the pipeline, delivered to the appender
//! chain, or dropped on the emission path.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use rust_async_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
/// metrics.record_accepted();
/// metrics.record_delivered();
///
/// assert_eq!(metrics.accepted(), 1);
/// assert_eq!(metrics.delivered(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Entries below the level threshold
    filtered: AtomicU64,

    /// Entries built and handed to the pipeline
    accepted: AtomicU64,

    /// Entries passed to the appender chain
    delivered: AtomicU64,

    /// Entries lost on the emission path (pool or allocation failure)
    dropped: AtomicU64,

    /// Individual appender append/flush failures
    appender_failures: AtomicU64,

    /// Hook calls
    hook_invocations: AtomicU64,

    /// Non-empty generations drained
    drains: AtomicU64,

    /// Flushes let through the gate by the high-water mark
    high_water_flushes: AtomicU64,
}

impl LoggerMetrics {
    pub const fn new() -> Self {
        Self {
            filtered: AtomicU64::new(0),
            accepted: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            appender_failures: AtomicU64::new(0),
            hook_invocations: AtomicU64::new(0),
            drains: AtomicU64::new(0),
            high_water_flushes: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn filtered(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn appender_failures(&self) -> u64 {
        self.appender_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn hook_invocations(&self) -> u64 {
        self.hook_invocations.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn drains(&self) -> u64 {
        self.drains.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn high_water_flushes(&self) -> u64 {
        self.high_water_flushes.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_accepted(&self) -> u64 {
        self.accepted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_delivered(&self) -> u64 {
        self.delivered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_appender_failures(&self, count: usize) {
        if count > 0 {
            self.appender_failures
                .fetch_add(count as u64, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_hook(&self) -> u64 {
        self.hook_invocations.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_drain(&self) -> u64 {
        self.drains.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_high_water_flush(&self) -> u64 {
        self.high_water_flushes.fetch_add(1, Ordering::Relaxed)
    }

    /// Share of accepted-or-dropped entries that were dropped, in percent.
    ///
    /// Returns 0.0 if nothing has been emitted.
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.dropped() as f64;
        let total = self.accepted() as f64 + dropped;
        if total == 0.0 {
            0.0
        } else {
            (dropped / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        for counter in [
            &self.filtered,
            &self.accepted,
            &self.delivered,
            &self.dropped,
            &self.appender_failures,
            &self.hook_invocations,
            &self.drains,
            &self.high_water_flushes,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
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
            filtered: AtomicU64::new(self.filtered()),
            accepted: AtomicU64::new(self.accepted()),
            delivered: AtomicU64::new(self.delivered()),
            dropped: AtomicU64::new(self.dropped()),
            appender_failures: AtomicU64::new(self.appender_failures()),
            hook_invocations: AtomicU64::new(self.hook_invocations()),
            drains: AtomicU64::new(self.drains()),
            high_water_flushes: AtomicU64::new(self.high_water_flushes()),
        }
    }
}

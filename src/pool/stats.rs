//! Object pool statistics tracking

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Statistics snapshot for pool monitoring
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoolStats {
    /// Number of blocks in the pool
    pub capacity: usize,
    /// Number of blocks currently held by callers
    pub currently_in_use: usize,
    /// Peak number of blocks held simultaneously
    pub peak_usage: usize,
    /// Blocks handed out successfully
    pub total_acquisitions: u64,
    /// Blocks returned
    pub total_releases: u64,
    /// Acquire calls that found the pool exhausted
    pub acquisition_failures: u64,
}

impl PoolStats {
    /// Fraction of acquire calls that succeeded (0.0 to 1.0)
    pub fn success_rate(&self) -> f64 {
        let attempts = self.total_acquisitions + self.acquisition_failures;
        if attempts == 0 {
            return 1.0;
        }
        self.total_acquisitions as f64 / attempts as f64
    }

    /// Fraction of acquire calls that failed (0.0 to 1.0)
    pub fn failure_rate(&self) -> f64 {
        1.0 - self.success_rate()
    }

    /// Fraction of blocks in use (0.0 to 1.0)
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.currently_in_use as f64 / self.capacity as f64
    }

    /// Get a summary string of the statistics
    pub fn summary(&self) -> String {
        format!(
            "PoolStats {{ capacity: {}, in_use: {}, peak: {}, acquisitions: {}, \
             releases: {}, failures: {}, success_rate: {:.2}%, utilization: {:.2}% }}",
            self.capacity,
            self.currently_in_use,
            self.peak_usage,
            self.total_acquisitions,
            self.total_releases,
            self.acquisition_failures,
            self.success_rate() * 100.0,
            self.utilization() * 100.0
        )
    }
}

/// Thread-safe counters behind [`PoolStats`]
#[derive(Debug, Default)]
pub struct AtomicPoolStats {
    in_use: AtomicUsize,
    peak_usage: AtomicUsize,
    total_acquisitions: AtomicU64,
    total_releases: AtomicU64,
    acquisition_failures: AtomicU64,
}

impl AtomicPoolStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `count` blocks handed out
    pub fn record_acquisition(&self, count: usize) {
        self.total_acquisitions
            .fetch_add(count as u64, Ordering::Relaxed);
        let now_in_use = self.in_use.fetch_add(count, Ordering::Relaxed) + count;
        self.peak_usage.fetch_max(now_in_use, Ordering::Relaxed);
    }

    /// Record `count` blocks returned
    pub fn record_release(&self, count: usize) {
        self.total_releases
            .fetch_add(count as u64, Ordering::Relaxed);
        self.in_use.fetch_sub(count, Ordering::Relaxed);
    }

    /// Record an acquire that found the pool exhausted
    pub fn record_failure(&self) {
        self.acquisition_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current statistics snapshot
    pub fn snapshot(&self, capacity: usize) -> PoolStats {
        PoolStats {
            capacity,
            currently_in_use: self.in_use.load(Ordering::Relaxed),
            peak_usage: self.peak_usage.load(Ordering::Relaxed),
            total_acquisitions: self.total_acquisitions.load(Ordering::Relaxed),
            total_releases: self.total_releases.load(Ordering::Relaxed),
            acquisition_failures: self.acquisition_failures.load(Ordering::Relaxed),
        }
    }
}

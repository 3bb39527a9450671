//! Checkout metrics for the instance pool.
//!
//! Tracks key counters using lock-free atomics for zero-overhead recording
//! from concurrent tasks. Use [`MetricsSnapshot`] for human-readable output.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared, thread-safe counters recorded by the pool's checkout paths.
///
/// All fields are `AtomicU64`; incrementing from any task is safe and fast.
#[derive(Debug, Default)]
pub struct PoolMetrics {
    /// Total checkout attempts (blocking, bounded, and non-blocking).
    pub checkouts: AtomicU64,
    /// Checkouts served by reusing an idle tracked instance.
    pub reuses: AtomicU64,
    /// Checkouts served by building a fresh instance.
    pub builds: AtomicU64,
    /// First factory failures that triggered the single retry.
    pub build_retries: AtomicU64,
    /// Factories that failed on both attempts.
    pub build_failures: AtomicU64,
    /// Bounded checkouts that elapsed before a permit freed up.
    pub timeouts: AtomicU64,
    /// Non-blocking checkouts rejected on a saturated pool.
    pub rejections: AtomicU64,
    /// Leases returned to the pool.
    pub releases: AtomicU64,
}

/// A point-in-time snapshot of [`PoolMetrics`].
///
/// Use [`PoolMetrics::snapshot`] to obtain a copyable view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Total checkout attempts.
    pub checkouts: u64,
    /// Checkouts served from idle instances.
    pub reuses: u64,
    /// Checkouts that built fresh instances.
    pub builds: u64,
    /// Factory retries.
    pub build_retries: u64,
    /// Factories that failed twice.
    pub build_failures: u64,
    /// Bounded waits that elapsed.
    pub timeouts: u64,
    /// Non-blocking rejections.
    pub rejections: u64,
    /// Leases returned.
    pub releases: u64,
}

impl PoolMetrics {
    /// Creates a new zeroed metrics instance wrapped in an [`Arc`].
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Records one checkout attempt.
    pub fn record_checkout(&self) {
        self.checkouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a checkout served by an idle instance.
    pub fn record_reuse(&self) {
        self.reuses.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a checkout served by a fresh build.
    pub fn record_build(&self) {
        self.builds.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a factory failure that triggered the retry.
    pub fn record_build_retry(&self) {
        self.build_retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a factory that failed on both attempts.
    pub fn record_build_failure(&self) {
        self.build_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a bounded checkout that timed out.
    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a non-blocking checkout rejected for lack of permits.
    pub fn record_rejection(&self) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a lease returning to the pool.
    pub fn record_release(&self) {
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            checkouts: self.checkouts.load(Ordering::Relaxed),
            reuses: self.reuses.load(Ordering::Relaxed),
            builds: self.builds.load(Ordering::Relaxed),
            build_retries: self.build_retries.load(Ordering::Relaxed),
            build_failures: self.build_failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            rejections: self.rejections.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
        }
    }
}

//! Observability metrics for throttling and delivery.
//!
//! Provides counters about throttle decisions and webhook deliveries for
//! monitoring and debugging.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking throttle and delivery statistics.
///
/// All metrics use atomic operations for thread-safe updates and reads.
/// Clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    /// Records accepted by the throttle
    events_accepted: AtomicU64,
    /// Records denied by the throttle (non-error or duplicate)
    events_denied: AtomicU64,
    /// Throttle entries removed by opportunistic sweeps
    entries_swept: AtomicU64,
    /// Messages the webhook acknowledged
    messages_delivered: AtomicU64,
    /// Delivery attempts that failed
    deliveries_failed: AtomicU64,
    /// Records dropped because the worker had stopped
    events_dropped: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_accepted(&self) {
        self.inner.events_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_denied(&self) {
        self.inner.events_denied.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_swept(&self, count: u64) {
        self.inner.entries_swept.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_delivered(&self) {
        self.inner
            .messages_delivered
            .fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.inner.deliveries_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.inner.events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the total number of records accepted by the throttle.
    pub fn events_accepted(&self) -> u64 {
        self.inner.events_accepted.load(Ordering::Relaxed)
    }

    /// Get the total number of records denied by the throttle.
    pub fn events_denied(&self) -> u64 {
        self.inner.events_denied.load(Ordering::Relaxed)
    }

    /// Get the total number of throttle entries removed by sweeps.
    pub fn entries_swept(&self) -> u64 {
        self.inner.entries_swept.load(Ordering::Relaxed)
    }

    /// Get the total number of messages delivered.
    pub fn messages_delivered(&self) -> u64 {
        self.inner.messages_delivered.load(Ordering::Relaxed)
    }

    /// Get the total number of failed delivery attempts.
    pub fn deliveries_failed(&self) -> u64 {
        self.inner.deliveries_failed.load(Ordering::Relaxed)
    }

    /// Get the total number of records dropped after the worker stopped.
    pub fn events_dropped(&self) -> u64 {
        self.inner.events_dropped.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_accepted: self.events_accepted(),
            events_denied: self.events_denied(),
            entries_swept: self.entries_swept(),
            messages_delivered: self.messages_delivered(),
            deliveries_failed: self.deliveries_failed(),
            events_dropped: self.events_dropped(),
        }
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub events_accepted: u64,
    pub events_denied: u64,
    pub entries_swept: u64,
    pub messages_delivered: u64,
    pub deliveries_failed: u64,
    pub events_dropped: u64,
}

impl MetricsSnapshot {
    /// Fraction of throttle decisions that were denials (0.0 to 1.0).
    ///
    /// Returns 0.0 if no decisions have been made.
    pub fn denial_rate(&self) -> f64 {
        let total = self.events_accepted.saturating_add(self.events_denied);
        if total == 0 {
            0.0
        } else {
            self.events_denied as f64 / total as f64
        }
    }

    /// Total delivery attempts (delivered + failed).
    pub fn delivery_attempts(&self) -> u64 {
        self.messages_delivered
            .saturating_add(self.deliveries_failed)
    }
}

//! Time-windowed throttling of error records.
//!
//! The throttle keeps the last time each fingerprint was seen. An ERROR record
//! is accepted the first time its fingerprint shows up, and again once the
//! fingerprint has been quiet for longer than the window. Every duplicate seen
//! inside the window is denied and slides the window forward.
//!
//! Stale entries are not expired by a timer. When a decision observes the
//! entry count at or above the removal threshold, it first sweeps every entry
//! whose age has reached the window.

use crate::application::metrics::Metrics;
use crate::application::ports::{Clock, Storage};
use crate::domain::fingerprint::{FingerprintKey, MdcKeys};
use crate::domain::record::LogRecord;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Level;

/// Outcome of a throttle decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Let the record through
    Accept,
    /// Drop the record
    Deny,
}

/// Throttle settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Minimum time a fingerprint stays suppressed after it was last seen
    pub window: Duration,
    /// Entry count at which a decision sweeps expired entries first
    pub removal_threshold: usize,
    /// Context properties making up the fingerprint
    pub mdc_keys: MdcKeys,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            removal_threshold: 1_000,
            mdc_keys: MdcKeys::default(),
        }
    }
}

/// Accept/deny gate over recently seen fingerprints.
///
/// Generic over the storage implementation. In production, use
/// `Arc<ShardedStorage>`.
#[derive(Clone)]
pub struct Throttle<S>
where
    S: Storage<FingerprintKey, Instant> + Clone,
{
    storage: S,
    clock: Arc<dyn Clock>,
    config: Arc<ThrottleConfig>,
    metrics: Metrics,
}

impl<S> Throttle<S>
where
    S: Storage<FingerprintKey, Instant> + Clone,
{
    /// Create a new throttle.
    pub fn new(
        storage: S,
        clock: Arc<dyn Clock>,
        config: ThrottleConfig,
        metrics: Metrics,
    ) -> Self {
        Self {
            storage,
            clock,
            config: Arc::new(config),
            metrics,
        }
    }

    /// Decide whether `record` may pass.
    ///
    /// Records at any level other than ERROR are always denied.
    pub fn decide(&self, record: &LogRecord) -> Decision {
        if record.level() != Level::ERROR {
            self.metrics.record_denied();
            return Decision::Deny;
        }

        let now = self.clock.now();
        if self.storage.len() >= self.config.removal_threshold {
            self.sweep(now);
        }

        let key = FingerprintKey::of(record, &self.config.mdc_keys);
        let decision = match self.storage.insert(key, now) {
            Some(last_seen) if now.saturating_duration_since(last_seen) <= self.config.window => {
                Decision::Deny
            }
            _ => Decision::Accept,
        };

        match decision {
            Decision::Accept => self.metrics.record_accepted(),
            Decision::Deny => self.metrics.record_denied(),
        }
        decision
    }

    /// Remove every entry whose age has reached the window.
    fn sweep(&self, now: Instant) {
        let window = self.config.window;
        let mut removed = 0u64;
        self.storage.retain(|_, last_seen| {
            let keep = now.saturating_duration_since(*last_seen) < window;
            if !keep {
                removed += 1;
            }
            keep
        });
        // Must not emit events, this runs inside filter callbacks
        if removed > 0 {
            self.metrics.record_swept(removed);
        }
    }

    /// Get the throttle configuration.
    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Get the number of tracked fingerprints.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Forget every tracked fingerprint.
    pub fn clear(&self) {
        self.storage.clear();
    }
}

//! Per-layer `tracing` filter throttling ERROR events.
//!
//! [`ThrottleFilter`] wraps the application-level [`Throttle`] and plugs it
//! into `tracing-subscriber` as a per-layer filter. Attach it to the webhook
//! layer so only first occurrences of an error reach the chat:
//!
//! ```rust,no_run
//! use tracing_chat_alert::{ThrottleFilter, WebhookLayer};
//! use tracing_subscriber::prelude::*;
//! use std::time::Duration;
//!
//! # #[tokio::main] async fn main() {
//! let throttle = ThrottleFilter::builder()
//!     .with_window(Duration::from_secs(30))
//!     .with_mdc_keys("tenant,route")
//!     .build();
//!
//! let webhook = WebhookLayer::builder()
//!     .with_webhook_uri("https://chat.example.com/v1/spaces/AAA/messages?key=k")
//!     .build()
//!     .unwrap();
//!
//! tracing_subscriber::registry()
//!     .with(webhook.clone().with_filter(throttle))
//!     .init();
//! # }
//! ```
//!
//! Context properties include span fields. The webhook layer records them
//! itself; when the filter guards some other layer, register a clone of the
//! filter as a layer too so it can record them.

use crate::application::metrics::Metrics;
use crate::application::ports::{Clock, Storage};
use crate::application::throttle::{Decision, Throttle, ThrottleConfig};
use crate::domain::fingerprint::{FingerprintKey, MdcKeys};
use crate::domain::record::LogRecord;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::context::{
    capture_record, is_own_event, record_span_fields, store_span_fields,
};
use crate::infrastructure::storage::ShardedStorage;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{Level, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Filter};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Builder for constructing a [`ThrottleFilter`].
#[derive(Debug, Default)]
pub struct ThrottleFilterBuilder {
    config: ThrottleConfig,
    clock: Option<Arc<dyn Clock>>,
}

impl ThrottleFilterBuilder {
    /// Set how long a fingerprint stays suppressed after it was last seen.
    ///
    /// Default: 60 seconds
    pub fn with_window(mut self, window: Duration) -> Self {
        self.config.window = window;
        self
    }

    /// Set the window in milliseconds.
    pub fn with_throttle_time_millis(self, millis: u64) -> Self {
        self.with_window(Duration::from_millis(millis))
    }

    /// Set the entry count at which expired fingerprints are swept.
    ///
    /// Sweeping happens lazily, during the first decision that observes at
    /// least this many entries. Zero sweeps on every decision.
    ///
    /// Default: 1,000 entries
    pub fn with_removal_threshold(mut self, threshold: usize) -> Self {
        self.config.removal_threshold = threshold;
        self
    }

    /// Set the context properties that make up the fingerprint.
    ///
    /// Accepts a comma-separated list (`"tenant,route"`) or a `Vec<String>`.
    /// With no keys, all ERROR events share one fingerprint and at most one
    /// per window gets through.
    pub fn with_mdc_keys(mut self, keys: impl Into<MdcKeys>) -> Self {
        self.config.mdc_keys = keys.into();
        self
    }

    /// Set a custom clock (mainly for testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> ThrottleFilter {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock::new()));
        let throttle = Throttle::new(
            Arc::new(ShardedStorage::new()),
            clock,
            self.config,
            Metrics::new(),
        );
        ThrottleFilter { throttle }
    }
}

/// A per-layer filter passing each ERROR fingerprint once per window.
///
/// Clones share state.
#[derive(Clone)]
pub struct ThrottleFilter<S = Arc<ShardedStorage<FingerprintKey, Instant>>>
where
    S: Storage<FingerprintKey, Instant> + Clone,
{
    throttle: Throttle<S>,
}

impl ThrottleFilter {
    /// Create a builder for configuring the filter.
    ///
    /// Defaults:
    /// - Window: 60 seconds
    /// - Removal threshold: 1,000 entries
    /// - Fingerprint keys: none
    pub fn builder() -> ThrottleFilterBuilder {
        ThrottleFilterBuilder::default()
    }
}

impl Default for ThrottleFilter {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl<S> ThrottleFilter<S>
where
    S: Storage<FingerprintKey, Instant> + Clone,
{
    /// Create a filter around an existing throttle.
    pub fn from_throttle(throttle: Throttle<S>) -> Self {
        Self { throttle }
    }

    /// Decide on a record directly, outside of a subscriber.
    pub fn decide(&self, record: &LogRecord) -> Decision {
        self.throttle.decide(record)
    }

    pub fn throttle(&self) -> &Throttle<S> {
        &self.throttle
    }

    /// Get a reference to the metrics.
    pub fn metrics(&self) -> &Metrics {
        self.throttle.metrics()
    }

    /// Get the current number of tracked fingerprints.
    pub fn fingerprint_count(&self) -> usize {
        self.throttle.len()
    }
}

impl<S> std::fmt::Debug for ThrottleFilter<S>
where
    S: Storage<FingerprintKey, Instant> + Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThrottleFilter")
            .field("config", self.throttle.config())
            .field("fingerprints", &self.throttle.len())
            .finish()
    }
}

impl<S, Sub> Filter<Sub> for ThrottleFilter<S>
where
    S: Storage<FingerprintKey, Instant> + Clone,
    Sub: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn enabled(&self, meta: &Metadata<'_>, _cx: &Context<'_, Sub>) -> bool {
        // Spans stay enabled so their fields reach the filtered layer
        meta.is_span() || *meta.level() == Level::ERROR
    }

    fn event_enabled(&self, event: &tracing::Event<'_>, cx: &Context<'_, Sub>) -> bool {
        let metadata = event.metadata();
        if is_own_event(metadata.target()) {
            return false;
        }
        if *metadata.level() != Level::ERROR {
            self.throttle.metrics().record_denied();
            return false;
        }

        let record = capture_record(event, cx);
        self.throttle.decide(&record) == Decision::Accept
    }
}

impl<S, Sub> Layer<Sub> for ThrottleFilter<S>
where
    S: Storage<FingerprintKey, Instant> + Clone + 'static,
    Sub: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: Context<'_, Sub>,
    ) {
        store_span_fields(attrs, id, &ctx);
    }

    fn on_record(
        &self,
        id: &tracing::span::Id,
        values: &tracing::span::Record<'_>,
        ctx: Context<'_, Sub>,
    ) {
        record_span_fields(id, values, &ctx);
    }
}

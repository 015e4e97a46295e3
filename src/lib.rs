//! # tracing-chat-alert
//!
//! Forward ERROR events from the `tracing` ecosystem to a chat webhook, once
//! per fingerprint per time window.
//!
//! The crate is a log side-channel made of two pieces:
//! - [`ThrottleFilter`], a per-layer filter that lets an ERROR event through
//!   the first time its fingerprint is seen and denies repeats inside a
//!   sliding window,
//! - [`WebhookLayer`], a layer handing accepted events to a background worker
//!   that posts them to the webhook one at a time, in order.
//!
//! Logging call sites never wait on the network and never see delivery
//! failures; those are reported out-of-band.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tracing_chat_alert::{ThrottleFilter, WebhookLayer};
//! use tracing_subscriber::prelude::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let throttle = ThrottleFilter::builder()
//!         .with_window(Duration::from_secs(60))
//!         .with_mdc_keys("tenant,route")
//!         .build();
//!
//!     let webhook = WebhookLayer::builder()
//!         .with_webhook_uri("https://chat.example.com/v1/spaces/AAA/messages?key=k")
//!         .build()
//!         .expect("valid webhook configuration");
//!
//!     tracing_subscriber::registry()
//!         .with(tracing_subscriber::fmt::layer())
//!         .with(webhook.clone().with_filter(throttle))
//!         .init();
//!
//!     tracing::error!(tenant = "acme", route = "/checkout", "payment gateway timed out");
//!
//!     // Give queued messages a chance to go out before exit
//!     webhook.shutdown().await;
//! }
//! ```
//!
//! ## Fingerprints
//!
//! The fingerprint of an event is the concatenation of the values of the
//! configured context properties, in configured order, with no separator.
//! Context properties are the fields of the enclosing spans (innermost wins)
//! overlaid by the event's own fields. The message text is not part of the
//! fingerprint:
//!
//! ```rust,no_run
//! # use tracing::error;
//! // with_mdc_keys("tenant")
//! error!(tenant = "acme", "database unreachable");   // delivered
//! error!(tenant = "acme", "cache unreachable");      // throttled, same tenant
//! error!(tenant = "globex", "database unreachable"); // delivered
//! ```
//!
//! Without configured keys every ERROR shares one fingerprint, so at most one
//! ERROR per window is delivered.
//!
//! ## Delivery
//!
//! Each accepted event is rendered by a [`Layout`] (by default
//! `-- [LEVEL]target - message`, with continuation lines indented by a tab)
//! and posted as `{"text": "..."}`. Only status 200 counts as delivered.
//! There is no retry. By default the first failed delivery stops the worker
//! for the rest of the process; [`FailurePolicy::Continue`] keeps it running.
//!
//! Failures are reported through exactly one [`ErrorReporter`]: stderr by
//! default, or an ERROR event carrying a logger name when
//! `with_error_logger_name` is set. The layer forwards ERROR events only, and
//! never those emitted by this crate or by the HTTP client while a delivery
//! is in flight.
//!
//! ## Configuration
//!
//! [`AlertConfig`] mirrors the builder settings as a serde document with
//! camelCase keys (`webhookUri`, `throttleTimeMillis`, `removalSize`,
//! `mdcKeys`, ...).
//!
//! ## Observability
//!
//! ```rust,no_run
//! # use tracing_chat_alert::ThrottleFilter;
//! # let throttle = ThrottleFilter::default();
//! let snapshot = throttle.metrics().snapshot();
//! println!("Denial rate: {:.2}%", snapshot.denial_rate() * 100.0);
//! println!("Tracked fingerprints: {}", throttle.fingerprint_count());
//! ```

// Domain layer - pure business logic
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    fingerprint::{FingerprintKey, MdcKeys},
    layout::{DefaultLayout, Layout},
    record::LogRecord,
};

pub use application::{
    metrics::{Metrics, MetricsSnapshot},
    pipeline::{DeliveryPipeline, PipelineConfig},
    ports::{Clock, ErrorReporter, Notifier, Storage},
    queue::{delivery_queue, DeliveryQueue, DequeueError, QueueClosed, QueueReceiver},
    throttle::{Decision, Throttle, ThrottleConfig},
    worker::{FailurePolicy, NotificationWorker, ShutdownError, WorkerExit, WorkerHandle},
};

pub use infrastructure::{
    clock::SystemClock,
    config::AlertConfig,
    filter::{ThrottleFilter, ThrottleFilterBuilder},
    layer::{BuildError, WebhookLayer, WebhookLayerBuilder},
    reporter::{reporter_for, LoggerReporter, StatusReporter, REPORTER_TARGET},
    storage::ShardedStorage,
    webhook::{DeliveryError, WebhookClient},
};

//! Tracing integration layer.
//!
//! Provides a `tracing_subscriber::Layer` that forwards events to a chat
//! webhook through a background delivery pipeline. The layer only forwards
//! ERROR events, and never the ones emitted by this crate or by code running
//! inside a delivery (the HTTP client's own tracing). Pair it with a
//! [`ThrottleFilter`](crate::ThrottleFilter) so only fingerprints seen for the
//! first time in a window are delivered.

use crate::application::metrics::Metrics;
use crate::application::pipeline::{DeliveryPipeline, PipelineConfig};
use crate::application::ports::{ErrorReporter, Notifier};
use crate::application::worker::{FailurePolicy, WorkerExit};
use crate::domain::layout::{DefaultLayout, Layout};
use crate::infrastructure::context::{
    capture_record, is_own_event, record_span_fields, store_span_fields,
};
use crate::infrastructure::reporter::reporter_for;
use crate::infrastructure::webhook::WebhookClient;

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::{Handle, TryCurrentError};
use tracing::{Level, Subscriber};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::Context, Layer};
use url::Url;

/// Error returned when building a [`WebhookLayer`] fails.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The webhook URI is not a valid absolute URL
    #[error("invalid webhook URI {uri:?}: {source}")]
    InvalidWebhookUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },
    /// The webhook URI does not use http or https
    #[error("unsupported webhook URI scheme {scheme:?}, expected http or https")]
    UnsupportedScheme { scheme: String },
    /// Delivery is enabled but there is no Tokio runtime to run the worker on
    #[error(
        "no Tokio runtime available for the delivery worker; \
         build inside a runtime or call with_runtime"
    )]
    NoRuntime(#[from] TryCurrentError),
    /// The HTTP client could not be created
    #[error("failed to create HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Builder for constructing a [`WebhookLayer`].
pub struct WebhookLayerBuilder {
    webhook_uri: Option<String>,
    layout: Arc<dyn Layout>,
    error_logger_name: Option<String>,
    reporter: Option<Arc<dyn ErrorReporter>>,
    failure_policy: FailurePolicy,
    request_timeout: Duration,
    shutdown_timeout: Duration,
    runtime: Option<Handle>,
}

impl WebhookLayerBuilder {
    /// Set the webhook to post messages to.
    ///
    /// A blank URI disables delivery: the layer accepts events and drops them
    /// without any HTTP call.
    pub fn with_webhook_uri(mut self, uri: impl Into<String>) -> Self {
        self.webhook_uri = Some(uri.into());
        self
    }

    /// Set the layout used to render records into message text.
    ///
    /// Default: [`DefaultLayout`]
    pub fn with_layout(mut self, layout: impl Layout + 'static) -> Self {
        self.layout = Arc::new(layout);
        self
    }

    /// Report the crate's own failures as ERROR events carrying this logger
    /// name instead of writing them to stderr.
    ///
    /// `tracing` targets are fixed at compile time, so the events are always
    /// emitted under [`REPORTER_TARGET`](crate::REPORTER_TARGET) and the name
    /// travels in their `logger` field. Route or filter on that target (or the
    /// field); a target filter on the configured name matches nothing.
    ///
    /// A blank name is treated as unset.
    pub fn with_error_logger_name(mut self, name: impl Into<String>) -> Self {
        self.error_logger_name = Some(name.into());
        self
    }

    /// Set a custom error reporter. Takes precedence over the error logger name.
    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Set what the worker does after a failed delivery.
    ///
    /// Default: [`FailurePolicy::StopWorker`]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Set the timeout of a single HTTP request.
    ///
    /// Default: 10 seconds
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set how long [`WebhookLayer::shutdown`] waits for queued messages.
    ///
    /// Default: 5 seconds
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Run the delivery worker on this runtime instead of the current one.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build the layer and start its delivery worker.
    ///
    /// # Errors
    ///
    /// Returns an error if the webhook URI is malformed, if no runtime is
    /// available, or if the HTTP client cannot be created. With no webhook
    /// URI the build always succeeds.
    pub fn build(self) -> Result<WebhookLayer, BuildError> {
        let uri = match self.webhook_uri.as_deref().map(str::trim) {
            Some(uri) if !uri.is_empty() => parse_webhook_uri(uri)?,
            _ => {
                tracing::debug!("no webhook URI configured, chat delivery disabled");
                return Ok(WebhookLayer::disabled());
            }
        };

        let client =
            WebhookClient::new(uri, self.request_timeout).map_err(BuildError::HttpClient)?;
        self.build_with_notifier(client)
    }

    /// Build the layer around a custom notifier.
    ///
    /// Delivery is always enabled; the webhook URI and request timeout are
    /// not used.
    pub fn build_with_notifier<N>(self, notifier: N) -> Result<WebhookLayer, BuildError>
    where
        N: Notifier,
    {
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current()?,
        };
        let reporter = self
            .reporter
            .unwrap_or_else(|| reporter_for(self.error_logger_name.as_deref()));

        let pipeline = DeliveryPipeline::start(
            &runtime,
            notifier,
            self.layout,
            reporter,
            PipelineConfig {
                failure_policy: self.failure_policy,
                shutdown_timeout: self.shutdown_timeout,
            },
        );
        let metrics = pipeline.metrics().clone();

        Ok(WebhookLayer {
            pipeline: Some(Arc::new(pipeline)),
            metrics,
        })
    }
}

fn parse_webhook_uri(uri: &str) -> Result<Url, BuildError> {
    let url = Url::parse(uri).map_err(|source| BuildError::InvalidWebhookUri {
        uri: uri.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(BuildError::UnsupportedScheme {
            scheme: scheme.to_string(),
        }),
    }
}

/// Tracing layer delivering events to a chat webhook.
///
/// Clones share one delivery pipeline. Shutdown is explicit: call
/// [`WebhookLayer::shutdown`] before the runtime goes away so queued
/// messages get a chance to be delivered.
#[derive(Debug, Clone)]
pub struct WebhookLayer {
    pipeline: Option<Arc<DeliveryPipeline>>,
    metrics: Metrics,
}

impl WebhookLayer {
    /// Create a builder for configuring the layer.
    ///
    /// Defaults:
    /// - Webhook URI: none (delivery disabled)
    /// - Layout: `-- [LEVEL]target - message`
    /// - Error reporting: stderr
    /// - Failure policy: stop the worker
    /// - Request timeout: 10 seconds
    /// - Shutdown timeout: 5 seconds
    pub fn builder() -> WebhookLayerBuilder {
        WebhookLayerBuilder {
            webhook_uri: None,
            layout: Arc::new(DefaultLayout),
            error_logger_name: None,
            reporter: None,
            failure_policy: FailurePolicy::default(),
            request_timeout: Duration::from_secs(10),
            shutdown_timeout: Duration::from_secs(5),
            runtime: None,
        }
    }

    /// Create a layer that drops every event.
    pub fn disabled() -> Self {
        Self {
            pipeline: None,
            metrics: Metrics::new(),
        }
    }

    /// Whether events are forwarded to a webhook.
    pub fn is_enabled(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Whether the delivery worker is still accepting events.
    pub fn is_running(&self) -> bool {
        self.pipeline
            .as_ref()
            .is_some_and(|pipeline| pipeline.is_running())
    }

    /// Get a reference to the delivery metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Stop the delivery worker after it has attempted every queued event.
    ///
    /// Failures are reported, never returned. Returns how the worker ended,
    /// or `None` when delivery is disabled, already shut down, or the worker
    /// could not be stopped cleanly.
    pub async fn shutdown(&self) -> Option<WorkerExit> {
        match &self.pipeline {
            Some(pipeline) => pipeline.shutdown().await,
            None => None,
        }
    }
}

impl Default for WebhookLayer {
    fn default() -> Self {
        Self::disabled()
    }
}

impl<S> Layer<S> for WebhookLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: Context<'_, S>,
    ) {
        store_span_fields(attrs, id, &ctx);
    }

    fn on_record(
        &self,
        id: &tracing::span::Id,
        values: &tracing::span::Record<'_>,
        ctx: Context<'_, S>,
    ) {
        record_span_fields(id, values, &ctx);
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: Context<'_, S>) {
        let Some(pipeline) = &self.pipeline else {
            return;
        };
        let metadata = event.metadata();
        if *metadata.level() != Level::ERROR || is_own_event(metadata.target()) {
            return;
        }
        pipeline.submit(capture_record(event, &ctx));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::Notifier;
    use crate::infrastructure::mocks::{MockDeliveryError, MockErrorReporter, MockNotifier};
    use crate::infrastructure::reporter::REPORTER_TARGET;
    use tracing::{debug, error, info, info_span, warn};
    use tracing_subscriber::layer::SubscriberExt;

    /// Notifier that logs an error of its own on every delivery, like a
    /// transport reporting a reset connection.
    #[derive(Debug, Clone, Default)]
    struct NoisyNotifier {
        inner: MockNotifier,
    }

    impl Notifier for NoisyNotifier {
        type Error = MockDeliveryError;

        async fn notify(&self, text: &str) -> Result<(), MockDeliveryError> {
            error!(target: "http_client::pool", "connection reset, retrying checkout");
            self.inner.notify(text).await
        }
    }

    #[test]
    fn test_blank_uri_disables_delivery() {
        let layer = WebhookLayer::builder().build().unwrap();
        assert!(!layer.is_enabled());

        let layer = WebhookLayer::builder()
            .with_webhook_uri("   ")
            .build()
            .unwrap();
        assert!(!layer.is_enabled());
        assert!(!layer.is_running());
    }

    #[test]
    fn test_malformed_uri_rejected() {
        let err = WebhookLayer::builder()
            .with_webhook_uri("not a uri")
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::InvalidWebhookUri { .. }));

        let err = WebhookLayer::builder()
            .with_webhook_uri("ftp://chat.example.com/hook")
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::UnsupportedScheme { .. }));
    }

    #[test]
    fn test_requires_runtime_when_enabled() {
        let err = WebhookLayer::builder()
            .with_webhook_uri("https://chat.example.com/hook")
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::NoRuntime(_)));
    }

    #[test]
    fn test_explicit_runtime() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let layer = WebhookLayer::builder()
            .with_webhook_uri("https://chat.example.com/hook")
            .with_runtime(runtime.handle().clone())
            .build()
            .unwrap();
        assert!(layer.is_enabled());

        runtime.block_on(async {
            assert_eq!(layer.shutdown().await, Some(WorkerExit::Drained));
        });
    }

    #[tokio::test]
    async fn test_forwards_events_with_span_context() {
        let notifier = MockNotifier::new();
        let layer = WebhookLayer::builder()
            .with_layout(|record: &crate::LogRecord| {
                format!(
                    "{}|{}",
                    record.message(),
                    record.property("tenant").unwrap_or("-")
                )
            })
            .with_reporter(Arc::new(MockErrorReporter::new()))
            .build_with_notifier(notifier.clone())
            .unwrap();

        let subscriber = tracing_subscriber::registry().with(layer.clone());
        tracing::subscriber::with_default(subscriber, || {
            let span = info_span!("request", tenant = "acme");
            let _guard = span.enter();
            error!(target: "app", "checkout failed");
        });

        assert_eq!(layer.shutdown().await, Some(WorkerExit::Drained));
        assert_eq!(notifier.delivered(), vec!["checkout failed|acme"]);
    }

    #[tokio::test]
    async fn test_internal_events_not_forwarded() {
        let notifier = MockNotifier::new();
        let layer = WebhookLayer::builder()
            .build_with_notifier(notifier.clone())
            .unwrap();

        let subscriber = tracing_subscriber::registry().with(layer.clone());
        tracing::subscriber::with_default(subscriber, || {
            error!(target: REPORTER_TARGET, logger = "alerts", "Error sending message");
        });

        layer.shutdown().await;
        assert_eq!(notifier.attempts(), 0);
    }

    #[tokio::test]
    async fn test_non_error_events_not_forwarded() {
        let notifier = MockNotifier::new();
        let layer = WebhookLayer::builder()
            .build_with_notifier(notifier.clone())
            .unwrap();

        let subscriber = tracing_subscriber::registry().with(layer.clone());
        tracing::subscriber::with_default(subscriber, || {
            warn!(target: "app", "disk almost full");
            info!(target: "app", "request served");
            debug!(target: "app", "cache miss");
            error!(target: "app", "request failed");
        });

        assert_eq!(layer.shutdown().await, Some(WorkerExit::Drained));
        assert_eq!(notifier.delivered(), vec!["-- [ERROR]app - request failed"]);
    }

    #[tokio::test]
    async fn test_events_emitted_during_delivery_not_forwarded() {
        let notifier = NoisyNotifier::default();
        let layer = WebhookLayer::builder()
            .with_reporter(Arc::new(MockErrorReporter::new()))
            .build_with_notifier(notifier.clone())
            .unwrap();

        // The worker shares this thread, so its events reach the same subscriber
        let subscriber = tracing_subscriber::registry().with(layer.clone());
        let _default = tracing::subscriber::set_default(subscriber);

        error!(target: "app", "payment failed");
        tokio::task::yield_now().await;

        assert_eq!(layer.shutdown().await, Some(WorkerExit::Drained));
        assert_eq!(notifier.inner.delivered(), vec!["-- [ERROR]app - payment failed"]);
        assert_eq!(layer.metrics().messages_delivered(), 1);
    }

    #[tokio::test]
    async fn test_clones_share_pipeline() {
        let notifier = MockNotifier::new();
        let layer = WebhookLayer::builder()
            .build_with_notifier(notifier.clone())
            .unwrap();
        let clone = layer.clone();

        assert!(clone.shutdown().await.is_some());
        assert!(!layer.is_running());
        assert!(layer.shutdown().await.is_none());
    }
}

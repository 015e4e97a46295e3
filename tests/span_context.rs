//! Integration tests for context properties drawn from spans.
//!
//! Span fields act as the mapped diagnostic context of an event: every
//! enclosing span contributes its fields, the innermost span wins, and the
//! event's own fields override them all.

use tracing::{error, info_span};
use tracing_chat_alert::infrastructure::mocks::MockCaptureLayer;
use tracing_chat_alert::ThrottleFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Layer;

#[test]
fn test_nested_spans_innermost_wins() {
    let capture = MockCaptureLayer::new();
    let subscriber = tracing_subscriber::registry().with(capture.clone());

    tracing::subscriber::with_default(subscriber, || {
        let outer = info_span!("server", tenant = "acme", region = "eu");
        let _outer = outer.enter();
        let inner = info_span!("handler", tenant = "globex", route = "/pay");
        let _inner = inner.enter();
        error!("declined");
    });

    let record = &capture.get_captured()[0];
    assert_eq!(record.property("tenant"), Some("globex"));
    assert_eq!(record.property("region"), Some("eu"));
    assert_eq!(record.property("route"), Some("/pay"));
}

#[test]
fn test_event_fields_override_span_fields() {
    let capture = MockCaptureLayer::new();
    let subscriber = tracing_subscriber::registry().with(capture.clone());

    tracing::subscriber::with_default(subscriber, || {
        let span = info_span!("request", req = "from-span");
        let _guard = span.enter();
        error!(req = "from-event", "failed");
    });

    let record = &capture.get_captured()[0];
    assert_eq!(record.property("req"), Some("from-event"));
    assert_eq!(record.message(), "failed");
    assert_eq!(record.property("message"), None);
}

#[test]
fn test_fields_recorded_after_span_creation() {
    let capture = MockCaptureLayer::new();
    let subscriber = tracing_subscriber::registry().with(capture.clone());

    tracing::subscriber::with_default(subscriber, || {
        let span = info_span!("request", user = tracing::field::Empty);
        span.record("user", "alice");
        let _guard = span.enter();
        error!("failed");
    });

    assert_eq!(capture.get_captured()[0].property("user"), Some("alice"));
}

#[test]
fn test_fingerprint_from_span_context() {
    let filter = ThrottleFilter::builder().with_mdc_keys("user_id").build();
    let capture = MockCaptureLayer::new();

    // The filter also runs as a layer so it records span fields
    let subscriber = tracing_subscriber::registry()
        .with(filter.clone())
        .with(capture.clone().with_filter(filter.clone()));

    tracing::subscriber::with_default(subscriber, || {
        for user in ["alice", "bob"] {
            let span = info_span!("request", user_id = user);
            let _enter = span.enter();
            for _ in 0..3 {
                error!("lookup failed");
            }
        }
    });

    assert_eq!(capture.count(), 2, "one error per user should pass");
}

#[test]
fn test_events_outside_spans_share_empty_fingerprint() {
    let filter = ThrottleFilter::builder().with_mdc_keys("user_id").build();
    let capture = MockCaptureLayer::new();
    let subscriber = tracing_subscriber::registry()
        .with(filter.clone())
        .with(capture.clone().with_filter(filter.clone()));

    tracing::subscriber::with_default(subscriber, || {
        error!("no context");
        error!(request_id = "r-1", "still no user");
    });

    assert_eq!(capture.count(), 1);
    assert_eq!(filter.fingerprint_count(), 1);
}

//! Forward throttled errors to a chat webhook.
//!
//! Run with a webhook URL:
//!
//! ```text
//! CHAT_WEBHOOK_URI=https://chat.googleapis.com/v1/spaces/.../messages?key=... \
//!     cargo run --example webhook
//! ```
//!
//! Without `CHAT_WEBHOOK_URI` delivery is disabled and events only reach the
//! console. Press Ctrl-C to stop; queued messages are delivered first.

use std::time::Duration;
use tracing::{error, info, info_span, warn};
use tracing_chat_alert::{ThrottleFilter, WebhookLayer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let throttle = ThrottleFilter::builder()
        .with_window(Duration::from_secs(10))
        .with_mdc_keys("tenant")
        .build();

    let webhook = WebhookLayer::builder()
        .with_webhook_uri(std::env::var("CHAT_WEBHOOK_URI").unwrap_or_default())
        .with_error_logger_name("chat-alert")
        .build()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(EnvFilter::new("info")))
        .with(webhook.clone().with_filter(throttle.clone()))
        .init();

    info!(enabled = webhook.is_enabled(), "chat delivery configured");

    let work = async {
        let mut ticker = tokio::time::interval(Duration::from_secs(2));
        for round in 0u64.. {
            ticker.tick().await;
            for tenant in ["acme", "globex"] {
                let span = info_span!("request", tenant, round);
                let _guard = span.enter();
                warn!("upstream slow");
                error!("payment gateway timed out\ncaused by: connection reset");
            }
        }
    };

    tokio::select! {
        _ = work => {}
        _ = tokio::signal::ctrl_c() => {}
    }

    let snapshot = throttle.metrics().snapshot();
    info!(
        accepted = snapshot.events_accepted,
        denied = snapshot.events_denied,
        "shutting down"
    );
    webhook.shutdown().await;
    Ok(())
}

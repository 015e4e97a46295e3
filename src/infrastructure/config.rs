//! Declarative configuration for the filter and the layer.
//!
//! Keys are camelCase so the same document can be shared with other
//! deployments of the alerting side-channel:
//!
//! ```
//! use tracing_chat_alert::AlertConfig;
//!
//! let config = AlertConfig::from_json(r#"{
//!     "webhookUri": "https://chat.example.com/v1/spaces/AAA/messages",
//!     "throttleTimeMillis": 30000,
//!     "removalSize": 500,
//!     "mdcKeys": "tenant, route"
//! }"#).unwrap();
//!
//! let filter = config.throttle_filter().build();
//! assert_eq!(filter.throttle().config().removal_threshold, 500);
//! ```

use crate::application::worker::FailurePolicy;
use crate::domain::fingerprint::MdcKeys;
use crate::infrastructure::filter::{ThrottleFilter, ThrottleFilterBuilder};
use crate::infrastructure::layer::{WebhookLayer, WebhookLayerBuilder};
use serde::Deserialize;
use std::time::Duration;

/// Settings for a [`ThrottleFilter`] and a [`WebhookLayer`].
///
/// Every key is optional; missing keys take the builder defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertConfig {
    /// Webhook to post to. Absent or blank disables delivery.
    pub webhook_uri: Option<String>,
    /// Logger name used to report delivery failures as ERROR events.
    pub error_logger_name: Option<String>,
    /// Throttle window in milliseconds.
    pub throttle_time_millis: u64,
    /// Entry count that triggers a sweep of expired fingerprints.
    pub removal_size: usize,
    /// Comma-separated context property names forming the fingerprint.
    pub mdc_keys: String,
    pub request_timeout_millis: u64,
    pub shutdown_timeout_millis: u64,
    pub failure_policy: FailurePolicy,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            webhook_uri: None,
            error_logger_name: None,
            throttle_time_millis: 60_000,
            removal_size: 1_000,
            mdc_keys: String::new(),
            request_timeout_millis: 10_000,
            shutdown_timeout_millis: 5_000,
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl AlertConfig {
    /// Parse a configuration from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parsed fingerprint keys.
    pub fn mdc_keys(&self) -> MdcKeys {
        MdcKeys::parse(&self.mdc_keys)
    }

    /// A filter builder preloaded with the throttle settings.
    pub fn throttle_filter(&self) -> ThrottleFilterBuilder {
        ThrottleFilter::builder()
            .with_throttle_time_millis(self.throttle_time_millis)
            .with_removal_threshold(self.removal_size)
            .with_mdc_keys(self.mdc_keys())
    }

    /// A layer builder preloaded with the delivery settings.
    pub fn webhook_layer(&self) -> WebhookLayerBuilder {
        let mut builder = WebhookLayer::builder()
            .with_failure_policy(self.failure_policy)
            .with_request_timeout(Duration::from_millis(self.request_timeout_millis))
            .with_shutdown_timeout(Duration::from_millis(self.shutdown_timeout_millis));
        if let Some(uri) = &self.webhook_uri {
            builder = builder.with_webhook_uri(uri.as_str());
        }
        if let Some(name) = &self.error_logger_name {
            builder = builder.with_error_logger_name(name.as_str());
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = AlertConfig::from_json("{}").unwrap();
        assert_eq!(config, AlertConfig::default());
        assert!(config.mdc_keys().is_empty());
    }

    #[test]
    fn test_full_document() {
        let config = AlertConfig::from_json(
            r#"{
                "webhookUri": "https://chat.example.com/hook",
                "errorLoggerName": "alerts",
                "throttleTimeMillis": 1000,
                "removalSize": 100,
                "mdcKeys": "req, ,tenant",
                "requestTimeoutMillis": 2500,
                "shutdownTimeoutMillis": 750,
                "failurePolicy": "continue"
            }"#,
        )
        .unwrap();

        assert_eq!(config.webhook_uri.as_deref(), Some("https://chat.example.com/hook"));
        assert_eq!(config.error_logger_name.as_deref(), Some("alerts"));
        assert_eq!(config.throttle_time_millis, 1000);
        assert_eq!(config.removal_size, 100);
        assert_eq!(config.mdc_keys(), MdcKeys::new(["req", "tenant"]));
        assert_eq!(config.request_timeout_millis, 2500);
        assert_eq!(config.shutdown_timeout_millis, 750);
        assert_eq!(config.failure_policy, FailurePolicy::Continue);
    }

    #[test]
    fn test_throttle_filter_from_config() {
        let config = AlertConfig {
            throttle_time_millis: 1_000,
            removal_size: 100,
            mdc_keys: "req".to_string(),
            ..AlertConfig::default()
        };

        let filter = config.throttle_filter().build();
        let throttle = filter.throttle().config();
        assert_eq!(throttle.window, Duration::from_secs(1));
        assert_eq!(throttle.removal_threshold, 100);
        assert_eq!(throttle.mdc_keys, MdcKeys::new(["req"]));
    }

    #[test]
    fn test_webhook_layer_without_uri_is_disabled() {
        let layer = AlertConfig::default().webhook_layer().build().unwrap();
        assert!(!layer.is_enabled());
    }

    #[test]
    fn test_unknown_policy_rejected() {
        assert!(AlertConfig::from_json(r#"{"failurePolicy": "retry"}"#).is_err());
    }
}

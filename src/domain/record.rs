//! Log records consumed by the throttle filter and the webhook appender.
//!
//! A [`LogRecord`] is an owned snapshot of a `tracing` event: its level, the
//! target it was emitted under, the formatted message and the contextual
//! properties (span fields overlaid with event fields). It is immutable once
//! captured and is moved through the delivery queue to the worker.

use std::collections::BTreeMap;
use tracing::Level;

/// An owned snapshot of a single log event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    level: Level,
    logger_name: String,
    message: String,
    properties: BTreeMap<String, String>,
}

impl LogRecord {
    /// Create a record with no contextual properties.
    pub fn new(level: Level, logger_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            logger_name: logger_name.into(),
            message: message.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Attach a single contextual property, replacing any previous value.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Replace all contextual properties.
    pub fn with_properties(mut self, properties: BTreeMap<String, String>) -> Self {
        self.properties = properties;
        self
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// The name of the logger the record was emitted under (the `tracing` target).
    pub fn logger_name(&self) -> &str {
        &self.logger_name
    }

    /// The formatted message. May span several lines.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Look up a single contextual property.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_methods() {
        let record = LogRecord::new(Level::ERROR, "app::db", "connection refused")
            .with_property("req", "A")
            .with_property("req", "B")
            .with_property("user", "alice");

        assert_eq!(record.level(), Level::ERROR);
        assert_eq!(record.logger_name(), "app::db");
        assert_eq!(record.message(), "connection refused");
        assert_eq!(record.property("req"), Some("B"));
        assert_eq!(record.property("user"), Some("alice"));
        assert_eq!(record.property("missing"), None);
        assert_eq!(record.properties().len(), 2);
    }

    #[test]
    fn test_is_error() {
        assert!(LogRecord::new(Level::ERROR, "t", "m").is_error());
        assert!(!LogRecord::new(Level::WARN, "t", "m").is_error());
        assert!(!LogRecord::new(Level::TRACE, "t", "m").is_error());
    }
}

//! Field visitor for extracting span and event field values.
//!
//! Collects field name-value pairs from tracing events and spans as strings.
//! String values are stored verbatim (no quotes) so they can be concatenated
//! into fingerprints; other values use their `Display` or `Debug` form.
//!
//! The `message` field of an event is kept apart from the other fields: it
//! becomes the record's formatted message rather than a context property.

use std::collections::BTreeMap;
use std::fmt;
use tracing::field::{Field, Visit};

const MESSAGE_FIELD: &str = "message";

/// A visitor that extracts field values into a BTreeMap.
#[derive(Debug, Default)]
pub(crate) struct FieldVisitor {
    message: Option<String>,
    fields: BTreeMap<String, String>,
}

impl FieldVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the visitor and return the message and the remaining fields.
    pub fn into_parts(self) -> (Option<String>, BTreeMap<String, String>) {
        (self.message, self.fields)
    }

    /// Consume the visitor and return every field, including `message`.
    pub fn into_fields(self) -> BTreeMap<String, String> {
        let mut fields = self.fields;
        if let Some(message) = self.message {
            fields.insert(MESSAGE_FIELD.to_string(), message);
        }
        fields
    }

    fn insert(&mut self, field: &Field, value: String) {
        if field.name() == MESSAGE_FIELD {
            self.message = Some(value);
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for FieldVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, value.to_string());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, format!("{:?}", value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_visitor() {
        let (message, fields) = FieldVisitor::new().into_parts();
        assert!(message.is_none());
        assert!(fields.is_empty());
    }

    #[test]
    fn test_into_fields_keeps_message() {
        let mut visitor = FieldVisitor::new();
        visitor.message = Some("hello".to_string());
        visitor.fields.insert("user".to_string(), "alice".to_string());

        let fields = visitor.into_fields();
        assert_eq!(fields.get("message").map(String::as_str), Some("hello"));
        assert_eq!(fields.get("user").map(String::as_str), Some("alice"));
    }
}

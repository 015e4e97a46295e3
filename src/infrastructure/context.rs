//! Capture of log records from `tracing` events.
//!
//! Context properties play the role of a mapped diagnostic context: the
//! fields of every enclosing span, innermost first, overlaid by the event's
//! own fields. Span fields are stored in span extensions when the span is
//! created or recorded into, by whichever layer of this crate sees it first.

use crate::application::worker::in_delivery;
use crate::domain::record::LogRecord;
use crate::infrastructure::visitor::FieldVisitor;
use std::collections::BTreeMap;
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

/// Fields recorded on a span, stored in its extensions.
#[derive(Debug, Clone, Default)]
pub(crate) struct SpanFields(BTreeMap<String, String>);

/// Store the fields of a newly created span.
pub(crate) fn store_span_fields<S>(attrs: &Attributes<'_>, id: &Id, ctx: &Context<'_, S>)
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    let Some(span) = ctx.span(id) else {
        return;
    };
    let mut extensions = span.extensions_mut();
    if extensions.get_mut::<SpanFields>().is_some() {
        return;
    }

    let mut visitor = FieldVisitor::new();
    attrs.record(&mut visitor);
    extensions.insert(SpanFields(visitor.into_fields()));
}

/// Merge values recorded on a span after its creation.
pub(crate) fn record_span_fields<S>(id: &Id, values: &Record<'_>, ctx: &Context<'_, S>)
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    let Some(span) = ctx.span(id) else {
        return;
    };
    let mut visitor = FieldVisitor::new();
    values.record(&mut visitor);
    let recorded = visitor.into_fields();

    let mut extensions = span.extensions_mut();
    match extensions.get_mut::<SpanFields>() {
        Some(SpanFields(fields)) => fields.extend(recorded),
        None => extensions.insert(SpanFields(recorded)),
    }
}

/// Snapshot an event and its span context into an owned record.
pub(crate) fn capture_record<S>(event: &Event<'_>, ctx: &Context<'_, S>) -> LogRecord
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    let metadata = event.metadata();
    let mut properties = span_properties(event, ctx);

    let mut visitor = FieldVisitor::new();
    event.record(&mut visitor);
    let (message, fields) = visitor.into_parts();
    properties.extend(fields);

    LogRecord::new(
        *metadata.level(),
        metadata.target(),
        message.unwrap_or_else(|| metadata.name().to_string()),
    )
    .with_properties(properties)
}

fn span_properties<S>(event: &Event<'_>, ctx: &Context<'_, S>) -> BTreeMap<String, String>
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    let mut properties = BTreeMap::new();
    let Some(scope) = ctx.event_scope(event) else {
        return properties;
    };

    for span in scope {
        let extensions = span.extensions();
        if let Some(SpanFields(fields)) = extensions.get::<SpanFields>() {
            for (name, value) in fields {
                properties
                    .entry(name.clone())
                    .or_insert_with(|| value.clone());
            }
        }
    }
    properties
}

/// Whether `target` belongs to this crate's own events.
pub(crate) fn is_internal_target(target: &str) -> bool {
    target
        .strip_prefix(env!("CARGO_CRATE_NAME"))
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

/// Whether an event comes from this crate, either under one of its targets or
/// from code running inside a delivery attempt.
pub(crate) fn is_own_event(target: &str) -> bool {
    is_internal_target(target) || in_delivery()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_targets() {
        assert!(is_internal_target("tracing_chat_alert"));
        assert!(is_internal_target("tracing_chat_alert::reporter"));
        assert!(!is_internal_target("tracing_chat_alert_ext"));
        assert!(!is_internal_target("app::db"));
    }

    #[test]
    fn test_own_events_outside_delivery() {
        assert!(is_own_event("tracing_chat_alert::worker"));
        assert!(!is_own_event("hyper_util::client::legacy::pool"));
    }
}

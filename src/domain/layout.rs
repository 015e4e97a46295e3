//! Rendering of log records into chat message text.

use crate::domain::record::LogRecord;

/// Strategy turning a [`LogRecord`] into the plain text posted to the webhook.
///
/// Any `Fn(&LogRecord) -> String` closure is a layout:
///
/// ```
/// use tracing_chat_alert::{Layout, LogRecord};
///
/// let layout = |record: &LogRecord| format!("{}: {}", record.logger_name(), record.message());
/// let record = LogRecord::new(tracing::Level::ERROR, "billing", "card declined");
/// assert_eq!(layout.render(&record), "billing: card declined");
/// ```
pub trait Layout: Send + Sync {
    /// Render a record to text.
    fn render(&self, record: &LogRecord) -> String;
}

impl<F> Layout for F
where
    F: Fn(&LogRecord) -> String + Send + Sync,
{
    fn render(&self, record: &LogRecord) -> String {
        self(record)
    }
}

/// Default layout: `-- [LEVEL]logger - message`.
///
/// Every line after the first is indented by one tab so multi-line messages
/// such as backtraces render as a block under the header line.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLayout;

impl Layout for DefaultLayout {
    fn render(&self, record: &LogRecord) -> String {
        format!(
            "-- [{}]{} - {}",
            record.level(),
            record.logger_name(),
            record.message().replace('\n', "\n\t")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_default_layout_single_line() {
        let record = LogRecord::new(Level::ERROR, "app::db", "connection refused");
        assert_eq!(
            DefaultLayout.render(&record),
            "-- [ERROR]app::db - connection refused"
        );
    }

    #[test]
    fn test_default_layout_indents_continuation_lines() {
        let record = LogRecord::new(Level::ERROR, "app", "failed\nat foo\nat bar");
        assert_eq!(
            DefaultLayout.render(&record),
            "-- [ERROR]app - failed\n\tat foo\n\tat bar"
        );
    }

    #[test]
    fn test_closure_layout() {
        let layout = |record: &LogRecord| record.message().to_uppercase();
        let record = LogRecord::new(Level::ERROR, "app", "oops");
        assert_eq!(layout.render(&record), "OOPS");
    }
}

//! Error reporter adapters.
//!
//! Internal failures go to exactly one of two places: the crate's status
//! channel on stderr, or, when an error logger name is configured, an
//! ERROR event carrying that logger name.

use crate::application::ports::ErrorReporter;
use std::error::Error;
use std::fmt::Write as _;
use std::sync::Arc;

/// Target of the events emitted by [`LoggerReporter`].
///
/// Events under this crate's targets are never forwarded to the webhook.
pub const REPORTER_TARGET: &str = "tracing_chat_alert::reporter";

/// Reports failures on the status channel (stderr), with the cause chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusReporter;

impl StatusReporter {
    pub fn new() -> Self {
        Self
    }
}

impl ErrorReporter for StatusReporter {
    fn report(&self, message: &str, cause: &(dyn Error + 'static)) {
        eprintln!("tracing-chat-alert: {}", format_report(message, cause));
    }
}

/// Reports failures as ERROR events tagged with a logger name.
///
/// Events go to [`REPORTER_TARGET`] with the configured name in the `logger`
/// field, since a `tracing` target cannot be chosen at runtime.
#[derive(Debug, Clone)]
pub struct LoggerReporter {
    logger: String,
}

impl LoggerReporter {
    pub fn new(logger: impl Into<String>) -> Self {
        Self {
            logger: logger.into(),
        }
    }

    pub fn logger(&self) -> &str {
        &self.logger
    }
}

impl ErrorReporter for LoggerReporter {
    fn report(&self, message: &str, cause: &(dyn Error + 'static)) {
        tracing::error!(
            target: REPORTER_TARGET,
            logger = %self.logger,
            error = %cause,
            "{}",
            message
        );
    }
}

/// Pick the reporter for an optional error logger name.
///
/// A blank name counts as absent.
pub fn reporter_for(error_logger_name: Option<&str>) -> Arc<dyn ErrorReporter> {
    match error_logger_name.map(str::trim) {
        Some(name) if !name.is_empty() => Arc::new(LoggerReporter::new(name)),
        _ => Arc::new(StatusReporter::new()),
    }
}

/// Render `message: cause: source: ...`.
pub(crate) fn format_report(message: &str, cause: &(dyn Error + 'static)) -> String {
    let mut out = format!("{}: {}", message, cause);
    let mut source = cause.source();
    while let Some(err) = source {
        let _ = write!(out, ": {}", err);
        source = err.source();
    }
    out
}

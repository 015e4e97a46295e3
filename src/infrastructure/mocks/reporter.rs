//! Mock error reporter for testing.

use crate::application::ports::ErrorReporter;
use std::error::Error;
use std::sync::{Arc, Mutex, MutexGuard};

/// One reported failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub message: String,
    /// `Display` of the cause
    pub cause: String,
}

/// Reporter keeping every report in memory.
///
/// Clones share the recorded reports.
#[derive(Debug, Clone, Default)]
pub struct MockErrorReporter {
    reports: Arc<Mutex<Vec<Report>>>,
}

impl MockErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// All reports so far, oldest first.
    pub fn reports(&self) -> Vec<Report> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Report>> {
        self.reports
            .lock()
            .expect("MockErrorReporter mutex poisoned - a test thread panicked while holding the lock")
    }
}

impl ErrorReporter for MockErrorReporter {
    fn report(&self, message: &str, cause: &(dyn Error + 'static)) {
        self.lock().push(Report {
            message: message.to_string(),
            cause: cause.to_string(),
        });
    }
}

//! Mock notifier for testing.

use crate::application::ports::Notifier;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

/// Error returned by a failing [`MockNotifier`].
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct MockDeliveryError(pub String);

#[derive(Debug, Default)]
struct NotifierState {
    delivered: Vec<String>,
    attempts: usize,
}

/// Notifier recording what it was asked to deliver.
///
/// Clones share the recorded state.
#[derive(Debug, Clone, Default)]
pub struct MockNotifier {
    state: Arc<Mutex<NotifierState>>,
    failure: Option<String>,
    delay: Option<Duration>,
}

impl MockNotifier {
    /// A notifier whose deliveries all succeed.
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose deliveries all fail with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Wait this long inside every delivery.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Texts of the successful deliveries, in order.
    pub fn delivered(&self) -> Vec<String> {
        self.lock().delivered.clone()
    }

    /// Number of delivery attempts, successful or not.
    pub fn attempts(&self) -> usize {
        self.lock().attempts
    }

    fn lock(&self) -> MutexGuard<'_, NotifierState> {
        self.state
            .lock()
            .expect("MockNotifier mutex poisoned - a test thread panicked while holding the lock")
    }
}

impl Notifier for MockNotifier {
    type Error = MockDeliveryError;

    async fn notify(&self, text: &str) -> Result<(), MockDeliveryError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.lock();
        state.attempts += 1;
        match &self.failure {
            Some(message) => Err(MockDeliveryError(message.clone())),
            None => {
                state.delivered.push(text.to_string());
                Ok(())
            }
        }
    }
}

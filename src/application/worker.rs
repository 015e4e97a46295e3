//! Background delivery of queued log records.
//!
//! A single worker task drains the delivery queue, renders each record with
//! the configured layout and hands the text to a [`Notifier`]. Deliveries are
//! strictly sequential, so queue order is delivery order.
//!
//! The worker stops when:
//! - cancellation was signalled and the queue is empty (drained),
//! - every queue producer is gone (closed),
//! - a delivery failed under [`FailurePolicy::StopWorker`] (failed).
//!
//! A stopped worker is never restarted.

use crate::application::metrics::Metrics;
use crate::application::ports::{ErrorReporter, Notifier};
use crate::application::queue::{DequeueError, QueueReceiver};
use crate::domain::layout::Layout;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

/// Message reported when a delivery attempt fails.
pub const DELIVERY_FAILED: &str = "Error sending message to chat webhook";

tokio::task_local! {
    static DELIVERING: ();
}

/// Whether the current task is inside a delivery attempt.
///
/// Events emitted by the notifier itself (HTTP client internals and the like)
/// observe `true` and must not be queued again.
pub fn in_delivery() -> bool {
    DELIVERING.try_with(|_| ()).is_ok()
}

/// What the worker does after a failed delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum FailurePolicy {
    /// Report the failure and stop delivering for the rest of the process
    #[default]
    #[serde(rename = "stop")]
    StopWorker,
    /// Report the failure and move on to the next record
    #[serde(rename = "continue")]
    Continue,
}

/// Why the worker loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// Cancellation was signalled and the queue was empty
    Drained,
    /// All queue producers were dropped
    Closed,
    /// A delivery failed under `FailurePolicy::StopWorker`
    Failed,
}

/// Error returned when the worker does not stop cleanly.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// The worker was still busy when the join timeout elapsed; it was aborted
    #[error("notification worker did not stop within {0:?}")]
    Timeout(Duration),
    /// The worker task panicked or was cancelled by the runtime
    #[error("notification worker task failed: {0}")]
    Join(#[from] JoinError),
}

/// Drains the delivery queue and delivers each record.
pub struct NotificationWorker<N>
where
    N: Notifier,
{
    receiver: QueueReceiver,
    notifier: N,
    layout: Arc<dyn Layout>,
    reporter: Arc<dyn ErrorReporter>,
    policy: FailurePolicy,
    metrics: Metrics,
}

impl<N> NotificationWorker<N>
where
    N: Notifier,
{
    /// Create a worker consuming `receiver`.
    pub fn new(
        receiver: QueueReceiver,
        notifier: N,
        layout: Arc<dyn Layout>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            receiver,
            notifier,
            layout,
            reporter,
            policy: FailurePolicy::default(),
            metrics: Metrics::new(),
        }
    }

    /// Set the behavior after a failed delivery.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Record delivery outcomes into shared metrics.
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Start the worker on `runtime`.
    pub fn spawn(self, runtime: &Handle) -> WorkerHandle {
        let cancel = CancellationToken::new();
        let task = runtime.spawn(self.run(cancel.clone()));
        WorkerHandle { cancel, task }
    }

    /// Run the worker loop until one of the exit conditions is met.
    pub async fn run(mut self, cancel: CancellationToken) -> WorkerExit {
        tracing::debug!(policy = ?self.policy, "notification worker started");

        let exit = loop {
            let record = match self.receiver.dequeue(&cancel).await {
                Ok(record) => record,
                Err(DequeueError::Interrupted) => match self.receiver.try_dequeue() {
                    Some(record) => record,
                    None => break WorkerExit::Drained,
                },
                Err(DequeueError::Closed) => break WorkerExit::Closed,
            };

            let text = self.layout.render(&record);
            match DELIVERING.scope((), self.notifier.notify(&text)).await {
                Ok(()) => {
                    tracing::trace!(logger = record.logger_name(), "message delivered");
                    self.metrics.record_delivered();
                }
                Err(err) => {
                    self.metrics.record_failed();
                    self.reporter.report(DELIVERY_FAILED, &err);
                    if self.policy == FailurePolicy::StopWorker {
                        break WorkerExit::Failed;
                    }
                }
            }
        };

        tracing::debug!(
            ?exit,
            pending = self.receiver.len(),
            "notification worker stopped"
        );
        exit
    }
}

/// Handle to a running notification worker.
///
/// Dropping the handle does not stop the worker; call [`WorkerHandle::shutdown`].
#[derive(Debug)]
pub struct WorkerHandle {
    cancel: CancellationToken,
    task: JoinHandle<WorkerExit>,
}

impl WorkerHandle {
    /// Whether the worker loop has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal cancellation and wait for the worker to drain and stop.
    ///
    /// If the worker is still running after `timeout`, it is aborted and
    /// `ShutdownError::Timeout` is returned.
    pub async fn shutdown(mut self, timeout: Duration) -> Result<WorkerExit, ShutdownError> {
        self.cancel.cancel();

        match tokio::time::timeout(timeout, &mut self.task).await {
            Ok(joined) => Ok(joined?),
            Err(_) => {
                self.task.abort();
                Err(ShutdownError::Timeout(timeout))
            }
        }
    }
}

//! Delivery pipeline: the queue, its worker, and their orderly shutdown.
//!
//! The pipeline is an explicitly owned value. Components that should share
//! one worker share one `Arc<DeliveryPipeline>`; there is no process-wide
//! queue.

use crate::application::metrics::Metrics;
use crate::application::ports::{ErrorReporter, Notifier};
use crate::application::queue::{delivery_queue, DeliveryQueue};
use crate::application::worker::{FailurePolicy, NotificationWorker, WorkerExit, WorkerHandle};
use crate::domain::layout::Layout;
use crate::domain::record::LogRecord;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;

/// Message reported when a record is dropped because the worker has stopped.
pub const WORKER_STOPPED: &str = "Chat webhook worker has stopped; dropping log events";

/// Message reported when the worker does not shut down cleanly.
pub const SHUTDOWN_FAILED: &str = "Error stopping chat webhook worker";

/// Queue plus the single worker draining it.
#[derive(Debug)]
pub struct DeliveryPipeline {
    queue: DeliveryQueue,
    worker: Mutex<Option<WorkerHandle>>,
    reporter: Arc<dyn ErrorReporter>,
    shutdown_timeout: Duration,
    metrics: Metrics,
    stop_reported: AtomicBool,
}

/// Settings for starting a pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Behavior after a failed delivery
    pub failure_policy: FailurePolicy,
    /// How long `shutdown` waits for the worker before aborting it
    pub shutdown_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl DeliveryPipeline {
    /// Create the queue and spawn its worker on `runtime`.
    pub fn start<N>(
        runtime: &Handle,
        notifier: N,
        layout: Arc<dyn Layout>,
        reporter: Arc<dyn ErrorReporter>,
        config: PipelineConfig,
    ) -> Self
    where
        N: Notifier,
    {
        let metrics = Metrics::new();
        let (queue, receiver) = delivery_queue();
        let handle = NotificationWorker::new(receiver, notifier, layout, Arc::clone(&reporter))
            .with_failure_policy(config.failure_policy)
            .with_metrics(metrics.clone())
            .spawn(runtime);

        Self {
            queue,
            worker: Mutex::new(Some(handle)),
            reporter,
            shutdown_timeout: config.shutdown_timeout,
            metrics,
            stop_reported: AtomicBool::new(false),
        }
    }

    /// Hand a record to the worker. Never blocks.
    ///
    /// If the worker has already stopped, the record is dropped. The first such
    /// drop is reported; later ones are only counted.
    pub fn submit(&self, record: LogRecord) {
        if let Err(closed) = self.queue.enqueue(record) {
            self.metrics.record_dropped();
            if !self.stop_reported.swap(true, Ordering::Relaxed) {
                self.reporter.report(WORKER_STOPPED, &closed);
            }
        }
    }

    /// Whether the worker is still accepting records.
    pub fn is_running(&self) -> bool {
        !self.queue.is_closed()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Stop the worker after it has attempted every queued record.
    ///
    /// Failures are reported, never returned. Calling this more than once is a
    /// no-op. Returns how the worker ended when it could be observed.
    pub async fn shutdown(&self) -> Option<WorkerExit> {
        let handle = {
            let mut guard = self
                .worker
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            guard.take()
        };

        let handle = handle?;
        tracing::debug!("shutting down notification worker");
        match handle.shutdown(self.shutdown_timeout).await {
            Ok(exit) => Some(exit),
            Err(err) => {
                self.reporter.report(SHUTDOWN_FAILED, &err);
                None
            }
        }
    }
}

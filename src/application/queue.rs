//! Delivery queue between log call sites and the notification worker.
//!
//! The queue is an unbounded FIFO. Producers never wait: `enqueue` either
//! hands the record over immediately or reports that the consumer is gone.
//! The single consumer waits in `dequeue` until a record arrives or its
//! cancellation token fires.

use crate::domain::record::LogRecord;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

/// Returned by `enqueue` when the consumer has stopped.
///
/// The rejected record is handed back to the caller.
#[derive(Debug, Error)]
#[error("delivery queue is closed")]
pub struct QueueClosed(pub LogRecord);

/// Reasons `dequeue` returns without a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DequeueError {
    /// Cancellation was signalled while the queue was empty
    #[error("dequeue interrupted by cancellation")]
    Interrupted,
    /// Every producer handle has been dropped and the queue is drained
    #[error("delivery queue closed")]
    Closed,
}

/// Create a connected producer/consumer pair.
pub fn delivery_queue() -> (DeliveryQueue, QueueReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (DeliveryQueue { tx }, QueueReceiver { rx })
}

/// Producer side of the delivery queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DeliveryQueue {
    tx: UnboundedSender<LogRecord>,
}

impl DeliveryQueue {
    /// Append a record to the tail of the queue without blocking.
    pub fn enqueue(&self, record: LogRecord) -> Result<(), QueueClosed> {
        self.tx.send(record).map_err(|err| QueueClosed(err.0))
    }

    /// Whether the consumer has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side of the delivery queue.
#[derive(Debug)]
pub struct QueueReceiver {
    rx: UnboundedReceiver<LogRecord>,
}

impl QueueReceiver {
    /// Take the head of the queue, waiting until one is available.
    ///
    /// A record that is already queued is returned even if `cancel` has
    /// fired; `Interrupted` is only returned while the queue is empty.
    pub async fn dequeue(&mut self, cancel: &CancellationToken) -> Result<LogRecord, DequeueError> {
        tokio::select! {
            biased;
            record = self.rx.recv() => record.ok_or(DequeueError::Closed),
            _ = cancel.cancelled() => Err(DequeueError::Interrupted),
        }
    }

    /// Take the head of the queue if one is ready.
    pub fn try_dequeue(&mut self) -> Option<LogRecord> {
        match self.rx.try_recv() {
            Ok(record) => Some(record),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Number of records waiting.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

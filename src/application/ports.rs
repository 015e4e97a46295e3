//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports.

use std::error::Error;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::time::Instant;

/// Port for obtaining current time.
///
/// This abstraction allows the throttle to work with time without depending
/// on the system clock. Infrastructure provides concrete implementations
/// (SystemClock, MockClock).
pub trait Clock: Send + Sync + Debug {
    /// Get the current instant.
    fn now(&self) -> Instant;
}

/// Port for concurrent key-value storage of throttle entries.
///
/// Infrastructure provides the concrete implementation (ShardedStorage).
pub trait Storage<K, V>: Send + Sync + Debug
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Send + Sync,
{
    /// Store `value` under `key`, returning the value it replaced.
    ///
    /// The read of the previous value and the write happen atomically with
    /// respect to other calls for the same key.
    fn insert(&self, key: K, value: V) -> Option<V>;

    /// Get the number of entries in the storage.
    fn len(&self) -> usize;

    /// Check if the storage is empty.
    fn is_empty(&self) -> bool;

    /// Clear all entries from the storage.
    fn clear(&self);

    /// Remove entries for which the predicate returns false.
    fn retain<F>(&self, f: F)
    where
        F: FnMut(&K, &mut V) -> bool;
}

/// Port for delivering rendered messages to the outside world.
///
/// One call is one delivery attempt. Implementations must not retry.
/// Infrastructure provides the concrete implementation (WebhookClient).
pub trait Notifier: Send + Sync + 'static {
    /// Error describing why a delivery failed.
    type Error: Error + Send + Sync + 'static;

    /// Deliver a single rendered message.
    fn notify(&self, text: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Port for reporting the crate's own failures out-of-band.
///
/// Every internal failure is routed through exactly one reporter; it is never
/// propagated back into the code that emitted the original log event.
pub trait ErrorReporter: Send + Sync + Debug {
    /// Report a failure with its cause.
    fn report(&self, message: &str, cause: &(dyn Error + 'static));
}

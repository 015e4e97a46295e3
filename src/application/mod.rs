//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain logic and manages the runtime behavior:
//! - Throttle (accept/deny decisions over recent fingerprints)
//! - Delivery queue (hand-off from log call sites to the worker)
//! - Notification worker (renders and delivers queued records)
//! - Delivery pipeline (queue, worker and their shutdown)
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod metrics;
pub mod pipeline;
pub mod ports;
pub mod queue;
pub mod throttle;
pub mod worker;

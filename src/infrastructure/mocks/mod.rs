//! Mock implementations for testing.
//!
//! This module provides test doubles for infrastructure adapters,
//! enabling controlled testing of the throttle and the delivery worker.

pub mod clock;
pub mod layer;
pub mod notifier;
pub mod reporter;

pub use clock::MockClock;
pub use layer::MockCaptureLayer;
pub use notifier::{MockDeliveryError, MockNotifier};
pub use reporter::{MockErrorReporter, Report};

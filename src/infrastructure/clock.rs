//! Clock adapters for time operations.
//!
//! The throttle measures fingerprint age with a monotonic clock, so wall-clock
//! adjustments never reopen or extend a window.
//!
//! `MockClock` (in `crate::infrastructure::mocks`) is a controllable test clock,
//! available with the `test-helpers` feature or in test builds.

use crate::application::ports::Clock;
use std::time::Instant;

/// Monotonic system clock backed by `Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

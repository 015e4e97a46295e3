//! Infrastructure layer - external adapters and integrations.
//!
//! This layer provides adapters for:
//! - Clock abstraction (system time vs mock)
//! - Storage implementations (sharded maps)
//! - Tracing integration (per-layer filter and webhook layer)
//! - HTTP delivery to the chat webhook
//! - Error reporting and declarative configuration

pub mod clock;
pub mod config;
pub(crate) mod context;
pub mod filter;
pub mod layer;
pub mod reporter;
pub mod storage;
pub(crate) mod visitor;
pub mod webhook;

/// Mock implementations for testing.
///
/// This module is only available when the `test-helpers` feature is enabled,
/// or during test builds. It provides controllable test doubles for the
/// clock, the notifier, the error reporter and a capturing layer.
///
/// To use these mocks in integration tests, add to your `Cargo.toml`:
/// ```toml
/// [dev-dependencies]
/// tracing-chat-alert = { version = "*", features = ["test-helpers"] }
/// ```
#[cfg(any(test, feature = "test-helpers"))]
pub mod mocks;

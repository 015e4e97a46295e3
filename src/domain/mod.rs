//! Domain layer - pure business logic with no external dependencies.
//!
//! This layer contains the core concepts of the alerting side-channel:
//! - Log records as seen by the throttle and the webhook appender
//! - Fingerprint keys used to group "the same" error
//! - Layouts rendering a record into chat text
//!
//! All types in this layer are pure and easily testable.

pub mod fingerprint;
pub mod layout;
pub mod record;

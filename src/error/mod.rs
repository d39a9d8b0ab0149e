//! Error types for the engine.
//!
//! The engine provides two error types:
//! - [`Error`]: General failures (bad request, not found, configuration, etc.)
//! - [`PermissionDenied`]: A permission expression evaluated to deny
//!
//! ## Key Invariant
//!
//! Every failure maps onto one HTTP status through [`ErrorKind::http_status_code`],
//! and a failed request never leaves a partial mutation behind.

mod core;
mod kind;
mod permission_denied;

pub use core::Error;
pub use kind::ErrorKind;
pub use permission_denied::PermissionDenied;

/// A specialized `Result` type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

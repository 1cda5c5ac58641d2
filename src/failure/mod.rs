//! Failure taxonomy.
//!
//! # Data Flow
//! ```text
//! handler / pipeline stage
//!     → Failure (typed kind, or a foreign error wrapped as InternalServerError)
//!     → IntoResponse stashes it in the response extensions
//!     → http::errors classifies, logs and reports it
//!     → rendered as {"code", "message"}
//! ```
//!
//! # Design Decisions
//! - Closed set of kinds; each kind fixes its status
//! - Matching is by kind, never by message
//! - 5xx bodies carry the reason phrase only

pub mod kind;
pub mod types;

pub use kind::FailureKind;
pub use types::{Failure, Panicked, RequestOrigin, UnrecognizedStatus};

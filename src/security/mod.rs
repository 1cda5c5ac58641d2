//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (inside the pre-processing chain):
//!     → forwarded.rs (resolve client IP, proxy trust)
//!     → headers.rs (identification + hardening response headers)
//!     → cors.rs (cross-origin headers, preflight short-circuit)
//! ```
//!
//! # Design Decisions
//! - Headers are accumulated per request and applied to every response
//! - No trust in client-supplied forwarding headers by default

pub mod cors;
pub mod forwarded;
pub mod headers;

pub use cors::Cors;

//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! pipeline driver and error pipeline produce:
//!     → logging.rs (structured log events inside the request span)
//!     → metrics.rs (counters, histograms)
//! ```
//!
//! # Design Decisions
//! - Structured logging for machine parsing
//! - Request ID flows through every log line of a request
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;

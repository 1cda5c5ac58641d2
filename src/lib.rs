//! Cactus HTTP server library.
//!
//! An axum-based server core: an ordered pre-processing pipeline, a typed
//! failure taxonomy with a two-stage error pipeline, and a lifecycle
//! controller with single-fire graceful shutdown.

pub mod config;
pub mod failure;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod reporting;
pub mod security;

pub use config::ServerConfig;
pub use failure::{Failure, FailureKind};
pub use http::HttpServer;
pub use lifecycle::{LifecycleState, Shutdown, ShutdownOutcome};
pub use reporting::{ErrorSink, Reporter};

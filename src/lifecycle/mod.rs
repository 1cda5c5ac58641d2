//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Bind listener → Created → Listening
//!
//! Shutdown (shutdown.rs):
//!     Gate fires once → Draining → in-flight connections finish → Stopped
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → fire the gate
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop accept, drain, close
//! - The gate is an atomic flag, so concurrent shutdowns drain exactly once
//! - Drain is unbounded unless `shutdown.drain_timeout_secs` is set

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod state;

pub use shutdown::Shutdown;
pub use state::{LifecycleState, ShutdownOutcome};

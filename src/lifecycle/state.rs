//! Lifecycle states of the server.

use std::fmt;

/// Where the server is in its lifecycle.
///
/// ```text
/// Created ──listen──▶ Listening ──shutdown──▶ Draining ──closed──▶ Stopped
///    └──────────────────────shutdown─────────────────────────────────▲
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Listening,
    Draining,
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Created => "created",
            LifecycleState::Listening => "listening",
            LifecycleState::Draining => "draining",
            LifecycleState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// What a call to `shutdown` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// This call ran the drain.
    Drained,
    /// Another call had already started it; this one waited for it.
    AlreadyStopping,
}

//! Shutdown coordination for the server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

/// Single-fire shutdown gate.
///
/// Cloned handles share one gate. Only the first [`trigger`](Shutdown::trigger)
/// wins; every waiter wakes once it has fired.
#[derive(Debug, Clone)]
pub struct Shutdown {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    fired: AtomicBool,
    tx: watch::Sender<bool>,
}

impl Shutdown {
    /// Create a new shutdown gate.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                fired: AtomicBool::new(false),
                tx,
            }),
        }
    }

    /// Fire the gate. Returns `true` only for the call that fired it.
    pub fn trigger(&self) -> bool {
        let first = self
            .inner
            .fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if first {
            self.inner.tx.send_replace(true);
        }
        first
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.fired.load(Ordering::Acquire)
    }

    /// Resolve once the gate has fired.
    pub async fn wait(&self) {
        let mut rx = self.inner.tx.subscribe();
        let _ = rx.wait_for(|fired| *fired).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

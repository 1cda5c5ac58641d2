//! Error-reporting sink abstraction.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use thiserror::Error;

use crate::failure::Failure;

/// Error type for reporting operations.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("sink rejected the report with status {status}")]
    Rejected { status: u16 },

    #[error("sink panicked: {0}")]
    Panicked(String),
}

/// Receives server-class failures annotated with their request origin.
///
/// Implementations return a `'static` future so the reporter can run it
/// detached from the response that triggered it.
pub trait ErrorSink: Send + Sync + 'static {
    fn report(&self, failure: Failure) -> BoxFuture<'static, Result<(), ReportError>>;
}

/// A sink that drops every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSink;

impl ErrorSink for DisabledSink {
    fn report(&self, _failure: Failure) -> BoxFuture<'static, Result<(), ReportError>> {
        futures_util::future::ready(Ok(())).boxed()
    }
}

/// Fire-and-forget front of an [`ErrorSink`].
#[derive(Clone)]
pub struct Reporter {
    sink: Arc<dyn ErrorSink>,
}

impl Reporter {
    pub fn new(sink: Arc<dyn ErrorSink>) -> Self {
        Self { sink }
    }

    pub fn disabled() -> Self {
        Self::new(Arc::new(DisabledSink))
    }

    /// Hand `failure` to the sink on a detached task.
    ///
    /// Sink errors and panics are logged and never reach the caller.
    pub fn dispatch(&self, failure: Failure) {
        let sink = Arc::clone(&self.sink);
        let code = failure.kind().code();
        tokio::spawn(async move {
            let outcome = std::panic::AssertUnwindSafe(async move { sink.report(failure).await })
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| {
                    let failure = Failure::panicked(payload);
                    Err(ReportError::Panicked(failure.message().to_string()))
                });

            if let Err(e) = outcome {
                tracing::warn!(error = %e, failure = code, "Error report could not be delivered");
            }
        });
    }
}

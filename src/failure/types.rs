//! The `Failure` value carried through the error pipeline.

use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::failure::kind::FailureKind;

type Cause = Arc<dyn StdError + Send + Sync + 'static>;

/// Request metadata attached to server-class failures before reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    pub method: Method,
    pub url: String,
}

/// Cause recorded when a status outside the taxonomy is coerced.
#[derive(Debug, Error)]
#[error("unrecognized status {status}: {message}")]
pub struct UnrecognizedStatus {
    pub status: StatusCode,
    pub message: String,
}

/// Cause recorded when a handler panics.
#[derive(Debug, Error)]
#[error("handler panicked: {0}")]
pub struct Panicked(pub String);

/// A typed request failure.
///
/// `Failure` does not implement [`std::error::Error`], so the blanket
/// `From<E: Error>` conversion applies: `?` on any foreign error inside a
/// handler yields an `InternalServerError` that keeps the original as its
/// cause.
#[derive(Debug, Clone)]
pub struct Failure {
    kind: FailureKind,
    message: String,
    cause: Option<Cause>,
    trace: Option<Arc<Backtrace>>,
    origin: Option<RequestOrigin>,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        let trace = Backtrace::capture();
        Self {
            kind,
            message: message.into(),
            cause: None,
            trace: (trace.status() == BacktraceStatus::Captured).then(|| Arc::new(trace)),
            origin: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Validation, message)
    }

    pub fn not_found(url: impl Into<String>) -> Self {
        Self::new(FailureKind::NotFound, url)
    }

    pub fn not_implemented(url: impl Into<String>) -> Self {
        Self::new(FailureKind::NotImplemented, url)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(FailureKind::InternalServerError, message)
    }

    /// Wrap a foreign error as an `InternalServerError`, keeping it as the cause.
    pub fn wrap<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::internal(err.to_string()).with_cause(err)
    }

    /// Build a failure from a raw status.
    ///
    /// Statuses outside the taxonomy are coerced to `InternalServerError`
    /// and the original status and message are preserved as the cause.
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        match FailureKind::from_status(status) {
            Some(kind) => Self::new(kind, message),
            None => Self::internal(message.clone()).with_cause(UnrecognizedStatus { status, message }),
        }
    }

    /// Build a failure from an error response produced outside the taxonomy,
    /// such as an extractor rejection.
    ///
    /// Client-class statuses the taxonomy does not name (422 from `Json`,
    /// for one) become `Validation`; everything else follows
    /// [`Failure::from_status`].
    pub fn from_rejection(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        match FailureKind::from_status(status) {
            Some(kind) => Self::new(kind, message),
            None if status.is_client_error() => {
                Self::validation(message.clone()).with_cause(UnrecognizedStatus { status, message })
            }
            None => Self::from_status(status, message),
        }
    }

    /// Convert a caught panic payload.
    pub fn panicked(payload: Box<dyn Any + Send + 'static>) -> Self {
        let text = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::internal(text.clone()).with_cause(Panicked(text))
    }

    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// Replace the trace captured at construction.
    pub fn with_trace(mut self, trace: Backtrace) -> Self {
        self.trace = Some(Arc::new(trace));
        self
    }

    pub fn with_origin(mut self, origin: RequestOrigin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Drop the captured trace so it never reaches a log record.
    pub fn clear_trace(&mut self) {
        self.trace = None;
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    /// Internal message. Not necessarily safe to show a client.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    pub fn trace(&self) -> Option<&Backtrace> {
        self.trace.as_deref()
    }

    pub fn origin(&self) -> Option<&RequestOrigin> {
        self.origin.as_ref()
    }

    pub fn is(&self, kind: FailureKind) -> bool {
        self.kind == kind
    }

    pub fn is_server_error(&self) -> bool {
        self.kind.is_server_error()
    }

    /// The cause and its sources, outermost first.
    pub fn cause_chain(&self) -> Vec<String> {
        let mut chain = Vec::new();
        let mut next: Option<&(dyn StdError + 'static)> = match self.cause.as_deref() {
            Some(cause) => Some(cause),
            None => None,
        };
        while let Some(err) = next {
            chain.push(err.to_string());
            next = err.source();
        }
        chain
    }

    /// Message for the response body. Server-class failures never expose
    /// their internal message.
    pub fn public_message(&self) -> &str {
        if self.is_server_error() {
            self.kind.reason()
        } else {
            &self.message
        }
    }

    /// Render the client-facing response without touching the pipeline.
    pub(crate) fn render(&self) -> Response {
        #[derive(Serialize)]
        struct Body<'a> {
            code: &'a str,
            message: &'a str,
        }

        let body = Body {
            code: self.kind.code(),
            message: self.public_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.code(), self.message)
    }
}

impl<E> From<E> for Failure
where
    E: StdError + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        Self::wrap(err)
    }
}

impl PartialEq for Failure {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl PartialEq<FailureKind> for Failure {
    fn eq(&self, other: &FailureKind) -> bool {
        self.kind == *other
    }
}

/// Renders the body and stashes the failure in the response extensions so
/// the pipeline driver can run it through the error pipeline.
impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let mut response = self.render();
        response.extensions_mut().insert(self);
        response
    }
}

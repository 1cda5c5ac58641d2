//! Per-request context.
//!
//! # Responsibilities
//! - Generate or propagate the request ID
//! - Hold the resolved client address and identity defaults
//! - Carry the request span every log line of the request is recorded in
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Inbound IDs are only trusted when short and made of safe characters
//! - The context lives in request extensions and dies with the request

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use tracing::Span;
use uuid::Uuid;

use crate::failure::Failure;

/// Header carrying the request ID in both directions.
pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

const MAX_REQUEST_ID_LEN: usize = 128;

/// Opaque identifier of one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(Arc<str>);

impl RequestId {
    /// A fresh UUID v4.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string().into())
    }

    /// Reuse an inbound `x-request-id` when it is well formed, otherwise
    /// generate a new one.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(&X_REQUEST_ID)
            .and_then(|value| value.to_str().ok())
            .and_then(Self::parse)
            .unwrap_or_else(Self::generate)
    }

    fn parse(raw: &str) -> Option<Self> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_REQUEST_ID_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));
        valid.then(|| Self(raw.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn header_value(&self) -> HeaderValue {
        HeaderValue::from_str(&self.0).unwrap_or_else(|_| HeaderValue::from_static("invalid"))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who is making the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub authenticated: bool,
    pub subject: Option<String>,
    pub scopes: Vec<String>,
}

impl Identity {
    /// The default until an authentication layer says otherwise.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// Context attached to every request that reaches a route handler.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub client_ip: Option<IpAddr>,
    pub identity: Identity,
    pub started_at: Instant,
    pub span: Span,
}

impl RequestContext {
    /// Replace the anonymous identity, e.g. from an auth middleware.
    pub fn authenticate(&mut self, subject: impl Into<String>, scopes: Vec<String>) {
        self.identity = Identity {
            authenticated: true,
            subject: Some(subject.into()),
            scopes,
        };
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Failure;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or_else(|| Failure::internal("request context missing: pipeline not installed"))
    }
}

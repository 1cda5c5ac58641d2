//! The pre-processing chain and its driver.
//!
//! # Data Flow
//! ```text
//! request
//!     → Stage::ORDER, one stage at a time
//!         Continue        → next stage
//!         Respond(resp)   → stop, resp is the response
//!         Err(failure)    → stop, failure goes to the error pipeline
//!     → route handler (only if every stage continued)
//!         response carrying a Failure → error pipeline
//!         other 4xx/5xx response (rejections) → Failure → error pipeline
//!     → accumulated headers applied, completion logged
//! ```
//!
//! # Design Decisions
//! - The order is a constant array, not a registration sequence
//! - Headers are collected during the chain and applied to whatever response
//!   leaves the driver, so failures and short-circuits carry them too
//! - Stages run sequentially within one request; requests run concurrently

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::header::InvalidHeaderValue;
use axum::http::{Extensions, HeaderMap, StatusCode, Version};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{Instrument, Span};

use crate::config::ServerConfig;
use crate::failure::{Failure, RequestOrigin};
use crate::http::assets::Assets;
use crate::http::body;
use crate::http::errors;
use crate::http::request::{Identity, RequestContext, RequestId, X_REQUEST_ID};
use crate::observability::metrics;
use crate::reporting::Reporter;
use crate::security::{forwarded, headers, Cors};

/// One step of the pre-processing chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    MarkStart,
    StandardHeaders,
    ClientIp,
    RequestId,
    AuthDefaults,
    Compression,
    SecurityHeaders,
    Cors,
    StaticFiles,
    LogRequest,
    ParseBody,
}

impl Stage {
    /// The fixed evaluation order.
    pub const ORDER: [Stage; 11] = [
        Stage::MarkStart,
        Stage::StandardHeaders,
        Stage::ClientIp,
        Stage::RequestId,
        Stage::AuthDefaults,
        Stage::Compression,
        Stage::SecurityHeaders,
        Stage::Cors,
        Stage::StaticFiles,
        Stage::LogRequest,
        Stage::ParseBody,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::MarkStart => "mark_start",
            Stage::StandardHeaders => "standard_headers",
            Stage::ClientIp => "client_ip",
            Stage::RequestId => "request_id",
            Stage::AuthDefaults => "auth_defaults",
            Stage::Compression => "compression",
            Stage::SecurityHeaders => "security_headers",
            Stage::Cors => "cors",
            Stage::StaticFiles => "static_files",
            Stage::LogRequest => "log_request",
            Stage::ParseBody => "parse_body",
        }
    }
}

/// What a stage decided.
#[derive(Debug)]
pub enum Flow {
    Continue,
    Respond(Response),
}

/// Marks a response the compression layer may gzip.
#[derive(Debug, Clone, Copy)]
pub struct Compressible;

/// Compression predicate: only responses the pipeline marked.
pub fn marked_compressible(
    _status: StatusCode,
    _version: Version,
    _headers: &HeaderMap,
    extensions: &Extensions,
) -> bool {
    extensions.get::<Compressible>().is_some()
}

/// Per-request state built up by the stages.
struct Exchange {
    origin: RequestOrigin,
    started_at: Instant,
    request_id: Option<RequestId>,
    client_ip: Option<IpAddr>,
    identity: Identity,
    compress: bool,
    response_headers: HeaderMap,
    span: Span,
}

impl Exchange {
    fn new(request: &Request) -> Self {
        Self {
            origin: RequestOrigin {
                method: request.method().clone(),
                url: request.uri().to_string(),
            },
            started_at: Instant::now(),
            request_id: None,
            client_ip: None,
            identity: Identity::anonymous(),
            compress: false,
            response_headers: HeaderMap::new(),
            span: Span::none(),
        }
    }

    fn context(&self) -> Option<RequestContext> {
        Some(RequestContext {
            request_id: self.request_id.clone()?,
            client_ip: self.client_ip,
            identity: self.identity.clone(),
            started_at: self.started_at,
            span: self.span.clone(),
        })
    }
}

/// Shared, immutable state of the chain.
pub struct Pipeline {
    config: Arc<ServerConfig>,
    standard_headers: HeaderMap,
    security_headers: HeaderMap,
    cors: Cors,
    assets: Assets,
    reporter: Reporter,
}

impl Pipeline {
    pub fn new(config: Arc<ServerConfig>, reporter: Reporter) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            standard_headers: headers::standard_headers(&config)?,
            security_headers: headers::security_headers(),
            cors: Cors::new(&config)?,
            assets: Assets::new(&config.assets),
            reporter,
            config,
        })
    }

    async fn apply(
        &self,
        stage: Stage,
        exchange: &mut Exchange,
        request: &mut Request,
    ) -> Result<Flow, Failure> {
        match stage {
            Stage::MarkStart => exchange.started_at = Instant::now(),
            Stage::StandardHeaders => exchange
                .response_headers
                .extend(self.standard_headers.clone()),
            Stage::ClientIp => {
                exchange.client_ip = forwarded::client_ip(
                    request.headers(),
                    request.extensions(),
                    self.config.trust_proxy,
                )
            }
            Stage::RequestId => {
                let id = RequestId::from_headers(request.headers());
                let value = id.header_value();
                request.headers_mut().insert(&X_REQUEST_ID, value.clone());
                exchange.response_headers.insert(&X_REQUEST_ID, value);
                exchange.span = tracing::info_span!(
                    "request",
                    request_id = %id,
                    method = %exchange.origin.method,
                    path = %request.uri().path(),
                );
                exchange.request_id = Some(id);
            }
            Stage::AuthDefaults => exchange.identity = Identity::anonymous(),
            Stage::Compression => exchange.compress = self.config.compression,
            Stage::SecurityHeaders => exchange
                .response_headers
                .extend(self.security_headers.clone()),
            Stage::Cors => {
                return Ok(self.cors.apply(
                    request.method(),
                    request.headers(),
                    &mut exchange.response_headers,
                ))
            }
            Stage::StaticFiles => {
                return self
                    .assets
                    .serve(request.method(), request.uri(), request.headers())
                    .await
            }
            Stage::LogRequest => exchange.span.in_scope(|| {
                tracing::info!(
                    method = %exchange.origin.method,
                    path = %request.uri().path(),
                    client_ip = ?exchange.client_ip,
                    "Incoming request"
                )
            }),
            Stage::ParseBody => body::parse_json(request, self.config.body_limit).await?,
        }
        Ok(Flow::Continue)
    }

    /// Apply the collected headers and log completion.
    fn finish(&self, exchange: &Exchange, mut response: Response) -> Response {
        response
            .headers_mut()
            .extend(exchange.response_headers.clone());
        if exchange.compress {
            response.extensions_mut().insert(Compressible);
        }

        let status = response.status();
        exchange.span.in_scope(|| {
            tracing::info!(
                status = status.as_u16(),
                elapsed_ms = exchange.started_at.elapsed().as_millis() as u64,
                "Request completed"
            )
        });
        metrics::record_request(
            exchange.origin.method.as_str(),
            status.as_u16(),
            exchange.started_at,
        );
        response
    }
}

/// Largest rejection body read back as a failure message.
const REJECTION_BODY_LIMIT: usize = 4 * 1024;

/// Turn an error response that carries no `Failure` (an extractor
/// rejection, a bare status) into one. Its text body becomes the message.
async fn failure_from_response(response: Response) -> Failure {
    let status = response.status();
    let text = axum::body::to_bytes(response.into_body(), REJECTION_BODY_LIMIT)
        .await
        .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
        .unwrap_or_default();
    let message = if text.is_empty() {
        status.canonical_reason().unwrap_or("Error").to_string()
    } else {
        text
    };
    Failure::from_rejection(status, message)
}

/// The middleware driving every request through [`Stage::ORDER`].
pub async fn drive(
    State(pipeline): State<Arc<Pipeline>>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut exchange = Exchange::new(&request);

    let mut interrupted = None;
    for stage in Stage::ORDER {
        match pipeline.apply(stage, &mut exchange, &mut request).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Respond(response)) => {
                tracing::trace!(stage = stage.name(), "Stage answered the request");
                interrupted = Some(Ok(response));
                break;
            }
            Err(failure) => {
                interrupted = Some(Err(failure));
                break;
            }
        }
    }

    let outcome = match interrupted {
        Some(outcome) => outcome,
        None => {
            if let Some(context) = exchange.context() {
                request.extensions_mut().insert(context);
            }
            let mut response = next.run(request).instrument(exchange.span.clone()).await;
            let status = response.status();
            let stashed = response.extensions_mut().remove::<Failure>();
            match stashed {
                Some(failure) => Err(failure),
                None if status.is_client_error() || status.is_server_error() => {
                    Err(failure_from_response(response).await)
                }
                None => Ok(response),
            }
        }
    };

    let response = match outcome {
        Ok(response) => response,
        Err(failure) => errors::handle(failure, &exchange.origin, &exchange.span, &pipeline.reporter),
    };
    pipeline.finish(&exchange, response)
}

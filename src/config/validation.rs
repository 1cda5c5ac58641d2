//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that declared identifiers are valid header values
//! - Validate value ranges (body limit > 0, drain timeout > 0)
//! - Check the reporting webhook and metrics addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue};
use thiserror::Error;
use url::Url;

use crate::config::schema::ServerConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("`{0}` must not be empty")]
    Empty(&'static str),

    #[error("`{field}` is not a valid header value: {value:?}")]
    HeaderValue { field: &'static str, value: String },

    #[error("`allow_headers` contains an invalid header name: {0:?}")]
    HeaderName(String),

    #[error("`body_limit` must be greater than zero")]
    ZeroBodyLimit,

    #[error("`assets.mount` must start with '/' and must not be the root: {0:?}")]
    Mount(String),

    #[error("`cors.allowed_origins` contains an invalid origin: {0:?}")]
    Origin(String),

    #[error("`reporting.webhook_url` must be an http(s) URL: {0:?}")]
    WebhookUrl(String),

    #[error("`shutdown.drain_timeout_secs` must be greater than zero")]
    ZeroDrainTimeout,

    #[error("`observability.metrics_address` is not a socket address: {0:?}")]
    MetricsAddress(String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (field, value) in [("name", &config.name), ("version", &config.version)] {
        if value.trim().is_empty() {
            errors.push(ValidationError::Empty(field));
        }
    }

    for (field, value) in [
        ("name", &config.name),
        ("version", &config.version),
        ("service", &config.service),
        ("domain", &config.domain),
        ("allow_headers", &config.allow_headers),
    ] {
        if HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError::HeaderValue {
                field,
                value: value.clone(),
            });
        }
    }

    for name in config.allow_headers.split(',').map(str::trim) {
        if !name.is_empty() && HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::HeaderName(name.to_string()));
        }
    }

    if config.body_limit == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    let mount = &config.assets.mount;
    if !mount.starts_with('/') || mount.trim_end_matches('/').is_empty() {
        errors.push(ValidationError::Mount(mount.clone()));
    }

    for origin in &config.cors.allowed_origins {
        if origin != "*" && HeaderValue::from_str(origin).is_err() {
            errors.push(ValidationError::Origin(origin.clone()));
        }
    }

    if config.reporting.enabled {
        let valid = Url::parse(&config.reporting.webhook_url)
            .map(|url| matches!(url.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !valid {
            errors.push(ValidationError::WebhookUrl(
                config.reporting.webhook_url.clone(),
            ));
        }
    }

    if config.shutdown.drain_timeout_secs == Some(0) {
        errors.push(ValidationError::ZeroDrainTimeout);
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

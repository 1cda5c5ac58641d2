//! Standard and security response headers.
//!
//! # Responsibilities
//! - Build the identification headers declared in the config
//! - Build the fixed set of browser hardening headers
//!
//! # Design Decisions
//! - Both maps are computed once at startup and cloned per request
//! - The pipeline applies them to every response, including failures

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, REFERRER_POLICY, SERVER, X_CONTENT_TYPE_OPTIONS,
    X_DNS_PREFETCH_CONTROL, X_XSS_PROTECTION,
};
use axum::http::header::InvalidHeaderValue;
use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::config::ServerConfig;

pub static X_SERVICE: HeaderName = HeaderName::from_static("x-service");
pub static X_POWERED_BY: HeaderName = HeaderName::from_static("x-powered-by");
pub static X_DOWNLOAD_OPTIONS: HeaderName = HeaderName::from_static("x-download-options");

/// Identification headers: server name/version, service, domain and the
/// allowed request headers list.
pub fn standard_headers(config: &ServerConfig) -> Result<HeaderMap, InvalidHeaderValue> {
    let mut headers = HeaderMap::new();
    headers.insert(
        SERVER,
        HeaderValue::from_str(&format!("{}/{}", config.name, config.version))?,
    );
    headers.insert(&X_SERVICE, HeaderValue::from_str(&config.service)?);
    headers.insert(&X_POWERED_BY, HeaderValue::from_str(&config.domain)?);
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_str(&config.allow_headers)?,
    );
    Ok(headers)
}

/// Browser hardening headers.
pub fn security_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(X_DNS_PREFETCH_CONTROL, HeaderValue::from_static("off"));
    headers.insert(&X_DOWNLOAD_OPTIONS, HeaderValue::from_static("noopen"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers
}

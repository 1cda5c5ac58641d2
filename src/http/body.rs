//! JSON body parsing.
//!
//! Runs last in the pre-processing chain, so preflights and static assets
//! never pay for it. Parsed documents are kept in the request extensions and
//! the raw bytes are put back, so handlers may use either [`JsonBody`] or
//! axum's own extractors.

use std::error::Error as StdError;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{FromRequestParts, Request};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use http_body_util::LengthLimitError;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::failure::{Failure, FailureKind};

/// The parsed JSON document of a request.
#[derive(Debug, Clone)]
pub struct ParsedBody(pub Arc<Value>);

/// Extractor for a JSON body already parsed by the pipeline.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
        })
        .unwrap_or(false)
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

fn too_large(limit: usize) -> Failure {
    Failure::new(
        FailureKind::PayloadTooLarge,
        format!("request body exceeds {limit} bytes"),
    )
}

fn hit_length_limit(err: &(dyn StdError + 'static)) -> bool {
    let mut next = Some(err);
    while let Some(e) = next {
        if e.is::<LengthLimitError>() {
            return true;
        }
        next = e.source();
    }
    false
}

/// Buffer and parse a JSON request body of at most `limit` bytes.
///
/// Requests without a JSON content type, and empty bodies, are left alone.
pub async fn parse_json(request: &mut Request, limit: usize) -> Result<(), Failure> {
    if !is_json(request.headers()) {
        return Ok(());
    }
    if declared_length(request.headers()).is_some_and(|len| len > limit) {
        return Err(too_large(limit));
    }

    let body = std::mem::take(request.body_mut());
    let bytes = axum::body::to_bytes(body, limit).await.map_err(|e| {
        if hit_length_limit(&e) {
            too_large(limit)
        } else {
            Failure::validation("request body could not be read").with_cause(e)
        }
    })?;

    if bytes.is_empty() {
        return Ok(());
    }

    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| Failure::validation(format!("malformed JSON body: {e}")).with_cause(e))?;

    request.extensions_mut().insert(ParsedBody(Arc::new(value)));
    *request.body_mut() = Body::from(bytes);
    Ok(())
}

impl<S, T> FromRequestParts<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Failure;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let parsed = parts
            .extensions
            .get::<ParsedBody>()
            .ok_or_else(|| Failure::validation("expected a JSON request body"))?;

        T::deserialize(parsed.0.as_ref())
            .map(JsonBody)
            .map_err(|e| Failure::validation(format!("invalid JSON body: {e}")).with_cause(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn json_request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
            .body(Body::from(body))
            .unwrap()
    }

    #[test]
    fn recognizes_json_media_types() {
        let mut headers = HeaderMap::new();
        assert!(!is_json(&headers));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(is_json(&headers));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/problem+json"));
        assert!(is_json(&headers));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(!is_json(&headers));
    }

    #[tokio::test]
    async fn parsed_document_is_stored_and_body_restored() {
        let mut request = json_request(r#"{"name":"cactus"}"#);
        parse_json(&mut request, 1024).await.unwrap();

        let parsed = request.extensions().get::<ParsedBody>().unwrap();
        assert_eq!(parsed.0["name"], "cactus");

        let bytes = axum::body::to_bytes(std::mem::take(request.body_mut()), 1024)
            .await
            .unwrap();
        assert_eq!(&bytes[..], br#"{"name":"cactus"}"#);
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_failure() {
        let mut request = json_request("{not json");
        let failure = parse_json(&mut request, 1024).await.unwrap_err();
        assert_eq!(failure.kind(), FailureKind::Validation);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let mut request = json_request(r#"{"padding":"0123456789"}"#);
        let failure = parse_json(&mut request, 8).await.unwrap_err();
        assert_eq!(failure.kind(), FailureKind::PayloadTooLarge);
    }

    #[tokio::test]
    async fn extractor_deserializes_into_types() {
        #[derive(serde::Deserialize)]
        struct Named {
            name: String,
        }

        let request = {
            let mut request = json_request(r#"{"name":"cactus"}"#);
            parse_json(&mut request, 1024).await.unwrap();
            request
        };
        let (mut parts, _) = request.into_parts();

        let JsonBody(named) = JsonBody::<Named>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(named.name, "cactus");

        let failure = JsonBody::<Vec<u32>>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(failure.kind(), FailureKind::Validation);
    }
}

//! Cross-origin resource sharing.

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_EXPOSE_HEADERS, ACCESS_CONTROL_MAX_AGE, ORIGIN, VARY,
};
use axum::http::header::InvalidHeaderValue;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;

use crate::config::ServerConfig;
use crate::http::pipeline::Flow;

const ALLOWED_METHODS: &str = "GET, HEAD, PUT, PATCH, POST, DELETE, OPTIONS";

#[derive(Debug, Clone)]
enum AllowedOrigins {
    Any,
    List(Vec<HeaderValue>),
}

/// Cross-origin policy built from the config.
#[derive(Debug, Clone)]
pub struct Cors {
    origins: AllowedOrigins,
    allow_headers: HeaderValue,
    max_age: HeaderValue,
}

impl Cors {
    pub fn new(config: &ServerConfig) -> Result<Self, InvalidHeaderValue> {
        let origins = if config.cors.allowed_origins.iter().any(|o| o == "*") {
            AllowedOrigins::Any
        } else {
            AllowedOrigins::List(
                config
                    .cors
                    .allowed_origins
                    .iter()
                    .map(|o| HeaderValue::from_str(o))
                    .collect::<Result<_, _>>()?,
            )
        };

        Ok(Self {
            origins,
            allow_headers: HeaderValue::from_str(&config.allow_headers)?,
            max_age: HeaderValue::from(config.cors.max_age_secs),
        })
    }

    /// Add cross-origin headers to `response_headers`; answer `OPTIONS`
    /// preflights directly with an empty 200.
    pub fn apply(
        &self,
        method: &Method,
        request_headers: &HeaderMap,
        response_headers: &mut HeaderMap,
    ) -> Flow {
        if let Some(allowed) = request_headers.get(ORIGIN).and_then(|o| self.allow(o)) {
            response_headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, allowed);
            response_headers.insert(
                ACCESS_CONTROL_EXPOSE_HEADERS,
                HeaderValue::from_static("x-request-id"),
            );
            response_headers.append(VARY, HeaderValue::from_static("Origin"));
        }

        if method != Method::OPTIONS {
            return Flow::Continue;
        }

        response_headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        response_headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());
        response_headers.insert(ACCESS_CONTROL_MAX_AGE, self.max_age.clone());
        Flow::Respond(StatusCode::OK.into_response())
    }

    fn allow(&self, origin: &HeaderValue) -> Option<HeaderValue> {
        match &self.origins {
            AllowedOrigins::Any => Some(HeaderValue::from_static("*")),
            AllowedOrigins::List(list) => list.iter().find(|o| *o == origin).cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_origin(origin: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ORIGIN, HeaderValue::from_static(origin));
        headers
    }

    #[test]
    fn any_origin_is_allowed_by_default() {
        let cors = Cors::new(&ServerConfig::default()).unwrap();
        let mut out = HeaderMap::new();

        let flow = cors.apply(&Method::GET, &with_origin("https://a.example"), &mut out);

        assert!(matches!(flow, Flow::Continue));
        assert_eq!(out[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[test]
    fn listed_origins_are_echoed_and_others_ignored() {
        let mut config = ServerConfig::default();
        config.cors.allowed_origins = vec!["https://app.example".into()];
        let cors = Cors::new(&config).unwrap();

        let mut out = HeaderMap::new();
        cors.apply(&Method::GET, &with_origin("https://app.example"), &mut out);
        assert_eq!(out[ACCESS_CONTROL_ALLOW_ORIGIN], "https://app.example");

        let mut out = HeaderMap::new();
        cors.apply(&Method::GET, &with_origin("https://evil.example"), &mut out);
        assert!(out.get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[test]
    fn options_short_circuits_with_empty_ok() {
        let cors = Cors::new(&ServerConfig::default()).unwrap();
        let mut out = HeaderMap::new();

        let flow = cors.apply(&Method::OPTIONS, &with_origin("https://a.example"), &mut out);

        match flow {
            Flow::Respond(response) => assert_eq!(response.status(), StatusCode::OK),
            Flow::Continue => panic!("preflight must short-circuit"),
        }
        assert_eq!(out[ACCESS_CONTROL_ALLOW_METHODS], ALLOWED_METHODS);
        assert_eq!(out[ACCESS_CONTROL_MAX_AGE], "600");
    }
}

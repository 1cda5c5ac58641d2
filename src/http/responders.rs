//! Terminal responders.
//!
//! None of these write an error response themselves: failures are returned
//! and the pipeline driver runs them through the error pipeline.

use axum::extract::OriginalUri;
use axum::http::{Method, StatusCode};

use crate::failure::{Failure, FailureKind};

/// `200 OK` with an empty body.
pub async fn empty_response() -> StatusCode {
    StatusCode::OK
}

/// Routes that exist but are not built yet.
pub async fn not_implemented(OriginalUri(uri): OriginalUri) -> Result<(), Failure> {
    Err(Failure::not_implemented(uri.to_string()))
}

/// Router fallback for unmapped paths.
pub async fn not_found(OriginalUri(uri): OriginalUri) -> Result<(), Failure> {
    Err(Failure::not_found(uri.to_string()))
}

/// Fallback for mapped paths hit with an unsupported method.
pub async fn method_not_allowed(method: Method, OriginalUri(uri): OriginalUri) -> Result<(), Failure> {
    Err(Failure::new(
        FailureKind::MethodNotAllowed,
        format!("{method} is not allowed on {uri}"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Uri;

    #[tokio::test]
    async fn empty_response_is_ok() {
        assert_eq!(empty_response().await, StatusCode::OK);
    }

    #[tokio::test]
    async fn not_found_carries_the_url() {
        let uri = Uri::from_static("/nope?x=1");
        let failure = not_found(OriginalUri(uri)).await.unwrap_err();
        assert_eq!(failure.kind(), FailureKind::NotFound);
        assert_eq!(failure.message(), "/nope?x=1");
    }

    #[tokio::test]
    async fn not_implemented_carries_the_url() {
        let uri = Uri::from_static("/v2/reports");
        let failure = not_implemented(OriginalUri(uri)).await.unwrap_err();
        assert_eq!(failure.kind(), FailureKind::NotImplemented);
        assert_eq!(failure.message(), "/v2/reports");
    }

    #[tokio::test]
    async fn method_not_allowed_names_the_method() {
        let uri = Uri::from_static("/widgets");
        let failure = method_not_allowed(Method::DELETE, OriginalUri(uri))
            .await
            .unwrap_err();
        assert_eq!(failure.kind(), FailureKind::MethodNotAllowed);
        assert_eq!(failure.message(), "DELETE is not allowed on /widgets");
    }
}

//! Built-in service routes.

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::config::ServerConfig;
use crate::http::responders;

#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub name: String,
    pub version: String,
    pub service: String,
    pub status: &'static str,
}

impl ServiceStatus {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            name: config.name.clone(),
            version: config.version.clone(),
            service: config.service.clone(),
            status: "operational",
        }
    }
}

/// `GET /` answers empty, `GET /status` describes the service.
pub fn service_routes(config: &ServerConfig) -> Router {
    let status = ServiceStatus::new(config);
    Router::new()
        .route("/", get(responders::empty_response))
        .route(
            "/status",
            get(move || {
                let status = status.clone();
                async move { Json(status) }
            }),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn status_reports_identity() {
        let config = ServerConfig {
            name: "billing".into(),
            ..ServerConfig::default()
        };
        let response = service_routes(&config)
            .oneshot(Request::get("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["name"], "billing");
        assert_eq!(json["version"], "1.0.0");
        assert_eq!(json["service"], "is.cactus");
        assert_eq!(json["status"], "operational");
    }

    #[tokio::test]
    async fn root_is_empty() {
        let config = ServerConfig::default();
        let response = service_routes(&config)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(body.is_empty());
    }
}

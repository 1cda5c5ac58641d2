//! Static favicon and file serving.

use std::path::PathBuf;

use axum::body::Body;
use axum::extract::Request;
use axum::http::header::LOCATION;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

use crate::config::AssetsConfig;
use crate::failure::Failure;
use crate::http::pipeline::Flow;

const FAVICON_PATH: &str = "/favicon.ico";

/// The static routes of the server.
#[derive(Debug, Clone)]
pub struct Assets {
    favicon: Option<PathBuf>,
    dir: Option<PathBuf>,
    mount: String,
}

impl Assets {
    pub fn new(config: &AssetsConfig) -> Self {
        Self {
            favicon: config.favicon.clone(),
            dir: config.dir.clone(),
            mount: config.mount.trim_end_matches('/').to_string(),
        }
    }

    /// Path inside the static directory for `path`, if it is under the mount.
    fn relative<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.mount.as_str())?;
        if rest.is_empty() {
            Some("/")
        } else if rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }

    /// Prefix a root-relative `Location` from `ServeDir` with the mount.
    fn remount_location(&self, headers: &mut HeaderMap) {
        let remounted = headers
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .filter(|location| location.starts_with('/'))
            .and_then(|location| HeaderValue::from_str(&format!("{}{location}", self.mount)).ok());
        if let Some(value) = remounted {
            headers.insert(LOCATION, value);
        }
    }

    /// Serve the request if it targets a static route.
    ///
    /// A file missing under a static route is a `NotFound` failure; an I/O
    /// problem reading it is an `InternalServerError`.
    pub async fn serve(
        &self,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
    ) -> Result<Flow, Failure> {
        if method != Method::GET && method != Method::HEAD {
            return Ok(Flow::Continue);
        }

        let path = uri.path();
        let response = if let (FAVICON_PATH, Some(favicon)) = (path, &self.favicon) {
            let stub = stub(method, uri.clone(), headers)?;
            ServeFile::new(favicon).oneshot(stub).await
        } else if let (Some(dir), Some(rest)) = (&self.dir, self.relative(path)) {
            let stub = stub(method, rest.parse::<Uri>()?, headers)?;
            ServeDir::new(dir).oneshot(stub).await
        } else {
            return Ok(Flow::Continue);
        };

        let mut response = match response {
            Ok(response) => response.map(Body::new),
            Err(never) => match never {},
        };
        if response.status().is_redirection() {
            self.remount_location(response.headers_mut());
        }

        match response.status() {
            StatusCode::NOT_FOUND => Err(Failure::not_found(uri.to_string())),
            status if status.is_server_error() => Err(Failure::internal(format!(
                "static asset {uri} could not be served ({status})"
            ))),
            _ => Ok(Flow::Respond(response)),
        }
    }
}

/// Body-less request aimed at `uri`, keeping conditional and range headers.
fn stub(method: &Method, uri: Uri, headers: &HeaderMap) -> Result<Request, Failure> {
    let mut stub = Request::builder()
        .method(method.clone())
        .uri(uri)
        .body(Body::empty())?;
    *stub.headers_mut() = headers.clone();
    Ok(stub)
}

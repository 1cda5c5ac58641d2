//! Shared utilities for integration and load testing.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::Query;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::Deserialize;
use serde_json::Value;

use cactus_server::config::ServerConfig;
use cactus_server::failure::{Failure, FailureKind};
use cactus_server::http::responders;
use cactus_server::http::{JsonBody, RequestContext};
use cactus_server::reporting::{DisabledSink, ErrorSink, ReportError};
use cactus_server::HttpServer;

/// Sink that keeps every report it receives.
#[derive(Default)]
pub struct RecordingSink {
    reports: Mutex<Vec<Failure>>,
}

impl RecordingSink {
    pub fn reports(&self) -> Vec<Failure> {
        self.reports.lock().unwrap().clone()
    }

    /// Poll until `count` reports arrived, or give up after a second.
    pub async fn wait_for(&self, count: usize) -> Vec<Failure> {
        for _ in 0..100 {
            let reports = self.reports();
            if reports.len() >= count {
                return reports;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.reports()
    }
}

impl ErrorSink for RecordingSink {
    fn report(&self, failure: Failure) -> BoxFuture<'static, Result<(), ReportError>> {
        self.reports.lock().unwrap().push(failure);
        futures_util::future::ready(Ok(())).boxed()
    }
}

/// Sink whose every delivery is rejected.
pub struct FailingSink;

impl ErrorSink for FailingSink {
    fn report(&self, _failure: Failure) -> BoxFuture<'static, Result<(), ReportError>> {
        futures_util::future::ready(Err(ReportError::Rejected { status: 500 })).boxed()
    }
}

/// Loopback config on an ephemeral port.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        name: "test-server".into(),
        version: "9.9.9".into(),
        ..ServerConfig::default()
    }
}

async fn boom() -> Result<String, Failure> {
    let answer: u32 = "forty-two".parse()?;
    Ok(answer.to_string())
}

async fn io_boom() -> Result<(), Failure> {
    Err(std::io::Error::other("boom").into())
}

async fn kaboom() -> &'static str {
    panic!("kaboom")
}

async fn forbidden() -> Result<(), Failure> {
    Err(Failure::new(FailureKind::Forbidden, "members only"))
}

async fn echo(JsonBody(value): JsonBody<Value>) -> Json<Value> {
    Json(value)
}

#[derive(Deserialize)]
struct Page {
    page: u32,
}

async fn paged(Query(page): Query<Page>) -> String {
    page.page.to_string()
}

/// Never installed, so extracting it is rejected with a 500.
#[derive(Clone)]
struct Quota(u32);

async fn quota(Extension(quota): Extension<Quota>) -> String {
    quota.0.to_string()
}

#[derive(Deserialize)]
struct Named {
    name: String,
}

async fn typed(Json(named): Json<Named>) -> String {
    named.name
}

async fn context(context: RequestContext) -> String {
    context.request_id.to_string()
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_millis(500)).await;
    "done"
}

async fn hang() -> &'static str {
    tokio::time::sleep(Duration::from_secs(30)).await;
    "late"
}

async fn large() -> String {
    "cactus ".repeat(2000)
}

/// Routes exercising every path through the pipeline.
pub fn test_routes() -> Router {
    Router::new()
        .route("/", get(responders::empty_response))
        .route("/boom", get(boom))
        .route("/io-boom", get(io_boom))
        .route("/panic", get(kaboom))
        .route("/forbidden", get(forbidden))
        .route("/echo", post(echo))
        .route("/context", get(context))
        .route("/paged", get(paged))
        .route("/quota", get(quota))
        .route("/typed", post(typed))
        .route("/todo", get(responders::not_implemented))
        .route("/slow", get(slow))
        .route("/hang", get(hang))
        .route("/large", get(large))
}

pub struct TestServer {
    pub server: Arc<HttpServer>,
    pub addr: SocketAddr,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub async fn spawn_with(config: ServerConfig, sink: Arc<dyn ErrorSink>) -> TestServer {
    let server = Arc::new(HttpServer::new(config, test_routes(), sink).unwrap());
    let addr = server.listen().await.unwrap();
    TestServer { server, addr }
}

pub async fn spawn_server() -> TestServer {
    spawn_with(test_config(), Arc::new(DisabledSink)).await
}

/// Client that neither pools connections nor follows system proxies.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

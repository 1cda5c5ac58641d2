//! HTTP server setup and lifecycle control.
//!
//! # Responsibilities
//! - Compose the application router with the pipeline driver, panic capture
//!   and compression
//! - Bind the listener and move Created → Listening
//! - Drain in-flight connections exactly once on shutdown
//!
//! # Lifecycle
//! ```text
//! new()       → Created
//! listen()    → Listening      (bind errors leave the server Created)
//! shutdown()  → Draining       (first caller only; others wait)
//!             → Stopped        (listener closed, close errors logged)
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;

use axum::{middleware, Router};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::predicate::{DefaultPredicate, Predicate};
use tower_http::compression::CompressionLayer;

use crate::config::{validate_config, ConfigError, ServerConfig};
use crate::failure::Failure;
use crate::http::pipeline::{self, Pipeline};
use crate::http::{errors, responders};
use crate::lifecycle::{startup, LifecycleState, Shutdown, ShutdownOutcome};
use crate::reporting::{ErrorSink, Reporter};

/// Wrap `routes` with the full request lifecycle.
///
/// Layers run outside-in: compression, then the pipeline driver, then panic
/// capture right around the routes, so a panic re-enters the driver as a
/// failure.
pub fn build_app(pipeline: Arc<Pipeline>, routes: Router) -> Router {
    routes
        .fallback(responders::not_found)
        .method_not_allowed_fallback(responders::method_not_allowed)
        .layer(CatchPanicLayer::custom(errors::failure_from_panic))
        .layer(middleware::from_fn_with_state(pipeline, pipeline::drive))
        .layer(
            CompressionLayer::new()
                .compress_when(DefaultPredicate::new().and(pipeline::marked_compressible)),
        )
}

/// The lifecycle controller.
pub struct HttpServer {
    config: Arc<ServerConfig>,
    app: Mutex<Option<Router>>,
    state: watch::Sender<LifecycleState>,
    shutdown: Shutdown,
    serve_task: Mutex<Option<JoinHandle<std::io::Result<()>>>>,
    local_addr: OnceLock<SocketAddr>,
}

impl HttpServer {
    /// Create a server in the `Created` state.
    pub fn new(
        config: ServerConfig,
        routes: Router,
        sink: Arc<dyn ErrorSink>,
    ) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let config = Arc::new(config);
        let pipeline = Arc::new(Pipeline::new(Arc::clone(&config), Reporter::new(sink))?);
        let (state, _) = watch::channel(LifecycleState::Created);

        Ok(Self {
            app: Mutex::new(Some(build_app(pipeline, routes))),
            config,
            state,
            shutdown: Shutdown::new(),
            serve_task: Mutex::new(None),
            local_addr: OnceLock::new(),
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Observe state transitions.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Bound address, once listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    /// Bind and start serving. Resolves once the bind succeeded.
    pub async fn listen(&self) -> Result<SocketAddr, Failure> {
        let state = self.state();
        if state != LifecycleState::Created {
            return Err(Failure::internal(format!("cannot listen: server is {state}")));
        }

        let listener = startup::bind(&self.config.host, self.config.port)
            .await
            .inspect_err(|failure| {
                tracing::error!(
                    port = self.config.port,
                    error = %failure.message(),
                    "Failed to bind listener"
                )
            })?;
        let local_addr = listener.local_addr()?;

        let mut slot = self
            .serve_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.shutdown.is_triggered() {
            return Err(Failure::internal("cannot listen: server is shutting down"));
        }
        let app = self
            .app
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| Failure::internal("cannot listen: server already started"))?;

        let shutdown = self.shutdown.clone();
        *slot = Some(tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await
        }));
        let _ = self.local_addr.set(local_addr);
        self.state.send_replace(LifecycleState::Listening);
        drop(slot);

        tracing::info!(
            address = %local_addr,
            name = %self.config.name,
            version = %self.config.version,
            "Listening for connections"
        );
        Ok(local_addr)
    }

    /// Stop accepting, drain in-flight requests, release the listener.
    ///
    /// Safe to call any number of times from any number of tasks: the drain
    /// runs once and every caller returns after the server has stopped.
    pub async fn shutdown(&self) -> ShutdownOutcome {
        if !self.shutdown.trigger() {
            self.wait_stopped().await;
            return ShutdownOutcome::AlreadyStopping;
        }

        let task = {
            let mut slot = self
                .serve_task
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if slot.is_some() {
                self.state.send_replace(LifecycleState::Draining);
            }
            slot.take()
        };

        if let Some(task) = task {
            tracing::info!("Draining in-flight connections");
            let abort = task.abort_handle();
            let joined = match self.config.shutdown.drain_timeout_secs {
                Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), task).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        tracing::warn!(timeout_secs = secs, "Drain timed out, closing listener");
                        abort.abort();
                        Ok(Ok(()))
                    }
                },
                None => task.await,
            };

            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!(error = %e, "Listener closed with error"),
                Err(e) => tracing::error!(error = %e, "Serve task ended abnormally"),
            }
        }

        self.state.send_replace(LifecycleState::Stopped);
        tracing::info!("Server stopped");
        ShutdownOutcome::Drained
    }

    /// Listen, wait for `signal`, then shut down.
    pub async fn run<F>(&self, signal: F) -> Result<(), Failure>
    where
        F: Future<Output = ()>,
    {
        self.listen().await?;
        signal.await;
        self.shutdown().await;
        Ok(())
    }

    async fn wait_stopped(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|state| *state == LifecycleState::Stopped).await;
    }
}

//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the listener for the configured host and port
//! - Map bind errors onto the failure taxonomy
//!
//! # Design Decisions
//! - Fail fast: a bind error is fatal and the server never reaches Listening
//! - Listeners start last (traffic only when ready)

use std::io::ErrorKind;

use tokio::net::TcpListener;

use crate::failure::Failure;

/// Bind `host:port`.
///
/// `EADDRINUSE` and `EACCES` become `InternalServerError`s naming the port;
/// other errors are wrapped as they are.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener, Failure> {
    TcpListener::bind((host, port)).await.map_err(|e| match e.kind() {
        ErrorKind::AddrInUse => {
            Failure::internal(format!("port {port} is already in use")).with_cause(e)
        }
        ErrorKind::PermissionDenied => {
            Failure::internal(format!("port {port} requires elevated privileges")).with_cause(e)
        }
        _ => Failure::wrap(e),
    })
}

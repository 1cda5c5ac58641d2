//! Error-reporting subsystem.
//!
//! # Data Flow
//! ```text
//! http::errors (status >= 500, origin attached)
//!     → Reporter::dispatch (detached task)
//!     → ErrorSink::report (webhook, disabled, or a test double)
//! ```
//!
//! # Design Decisions
//! - Reporting never blocks or alters the response it describes
//! - Sink failures are logged at warn level and otherwise dropped

pub mod sink;
pub mod webhook;

use std::sync::Arc;

use url::Url;

pub use sink::{DisabledSink, ErrorSink, ReportError, Reporter};
pub use webhook::WebhookSink;

use crate::config::ServerConfig;

/// Build the sink selected by `config.reporting`.
pub fn from_config(config: &ServerConfig) -> Result<Arc<dyn ErrorSink>, ReportError> {
    if !config.reporting.enabled {
        tracing::info!("Error reporting disabled");
        return Ok(Arc::new(DisabledSink));
    }

    match Url::parse(&config.reporting.webhook_url) {
        Ok(url) => {
            tracing::info!(host = ?url.host_str(), "Error reporting to webhook");
            Ok(Arc::new(WebhookSink::new(config, url)?))
        }
        Err(e) => {
            tracing::error!(error = %e, "Invalid webhook URL, error reporting disabled");
            Ok(Arc::new(DisabledSink))
        }
    }
}

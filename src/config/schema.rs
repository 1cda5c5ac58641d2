//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// TCP port to listen on. `0` asks the OS for an ephemeral port.
    pub port: u16,

    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Declared server name, sent in the `Server` header.
    pub name: String,

    /// Declared server version, sent in the `Server` header.
    pub version: String,

    /// Service identifier, sent in the `X-Service` header.
    pub service: String,

    /// Owning domain, sent in the `X-Powered-By` header.
    pub domain: String,

    /// Comma-separated list for `Access-Control-Allow-Headers`.
    pub allow_headers: String,

    /// Trust `X-Forwarded-For` when resolving the client address.
    pub trust_proxy: bool,

    /// Gzip responses when the client accepts it.
    pub compression: bool,

    /// Maximum accepted JSON body size in bytes.
    pub body_limit: usize,

    /// Cross-origin settings.
    pub cors: CorsConfig,

    /// Static favicon / file settings.
    pub assets: AssetsConfig,

    /// Error-reporting sink settings.
    pub reporting: ReportingConfig,

    /// Shutdown behaviour.
    pub shutdown: ShutdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
            name: "generic-server".to_string(),
            version: "1.0.0".to_string(),
            service: "is.cactus".to_string(),
            domain: "Cactus".to_string(),
            allow_headers: "Content-Type, Authorization, X-Cactus-Debug".to_string(),
            trust_proxy: false,
            compression: true,
            body_limit: 100 * 1024, // 100kb
            cors: CorsConfig::default(),
            assets: AssetsConfig::default(),
            reporting: ReportingConfig::default(),
            shutdown: ShutdownConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Cross-origin configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to read responses. `"*"` allows any origin.
    pub allowed_origins: Vec<String>,

    /// Preflight cache lifetime in seconds.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            max_age_secs: 600,
        }
    }
}

/// Static asset configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// File served for `/favicon.ico`.
    pub favicon: Option<PathBuf>,

    /// Directory served under `mount`.
    pub dir: Option<PathBuf>,

    /// URL prefix for `dir` (e.g., "/static").
    pub mount: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            favicon: None,
            dir: None,
            mount: "/static".to_string(),
        }
    }
}

/// Error-reporting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportingConfig {
    /// Forward server-class failures to the webhook.
    pub enabled: bool,

    /// Incoming-webhook URL (Slack compatible).
    pub webhook_url: String,

    /// Optional channel override.
    pub channel: Option<String>,

    /// Per-report request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            webhook_url: String::new(),
            channel: None,
            timeout_secs: 5,
        }
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Upper bound on the in-flight drain. Unset waits indefinitely.
    pub drain_timeout_secs: Option<u64>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

//! Cactus HTTP server.
//!
//! ```text
//!     Client Request
//!     ──────────────▶ compression ─▶ pipeline driver ─▶ panic capture ─▶ routes
//!                                        │ 11 ordered stages                │
//!                                        │ short-circuit or failure         │ failure
//!                                        ▼                                  ▼
//!     Client Response ◀──────────── error pipeline: classify → notify → render
//!                                                          │
//!                                                          ▼
//!                                                    reporting sink
//! ```

use std::path::PathBuf;

use clap::Parser;

use cactus_server::config::{load_config, ConfigError, ServerConfig};
use cactus_server::http::status::service_routes;
use cactus_server::lifecycle::signals::shutdown_signal;
use cactus_server::observability::{logging, metrics};
use cactus_server::{reporting, HttpServer};

#[derive(Parser)]
#[command(name = "cactus-server")]
#[command(about = "HTTP server with an ordered request pipeline", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured port
    #[arg(short, long)]
    port: Option<u16>,
}

fn resolve_config(cli: &Cli) -> Result<ServerConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(port) = cli.port {
        config.port = port;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    logging::init_logging(&config.observability);

    tracing::info!(
        name = %config.name,
        version = %config.version,
        port = config.port,
        body_limit = config.body_limit,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let sink = reporting::from_config(&config)?;
    let routes = service_routes(&config);
    let server = HttpServer::new(config, routes, sink)?;

    server
        .run(shutdown_signal())
        .await
        .map_err(|failure| failure.to_string())?;

    tracing::info!("Shutdown complete");
    Ok(())
}

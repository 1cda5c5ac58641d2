//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),

    #[error("Invalid header value: {0}")]
    Header(#[from] axum::http::header::InvalidHeaderValue),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ServerConfig, ConfigError> {
    let config: ServerConfig = toml::from_str(content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.name, "generic-server");
        assert_eq!(config.version, "1.0.0");
        assert_eq!(config.service, "is.cactus");
        assert_eq!(config.domain, "Cactus");
        assert_eq!(
            config.allow_headers,
            "Content-Type, Authorization, X-Cactus-Debug"
        );
    }

    #[test]
    fn sections_override_defaults() {
        let config = parse_config(
            r#"
            port = 9000
            name = "billing"
            trust_proxy = true

            [assets]
            mount = "/public"

            [shutdown]
            drain_timeout_secs = 15
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.name, "billing");
        assert!(config.trust_proxy);
        assert_eq!(config.assets.mount, "/public");
        assert_eq!(config.shutdown.drain_timeout_secs, Some(15));
        // untouched sections keep their defaults
        assert_eq!(config.cors.max_age_secs, 600);
    }

    #[test]
    fn invalid_values_are_reported_together() {
        let err = parse_config(
            r#"
            name = ""
            body_limit = 0
            "#,
        )
        .unwrap_err();

        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            parse_config("port = \"eighty\""),
            Err(ConfigError::Parse(_))
        ));
    }
}

//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → shared via Arc with the pipeline and the lifecycle controller
//! ```
//!
//! # Design Decisions
//! - Config is read once at construction and never mutated
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AssetsConfig, CorsConfig, ObservabilityConfig, ReportingConfig, ServerConfig, ShutdownConfig,
};
pub use validation::{validate_config, ValidationError};

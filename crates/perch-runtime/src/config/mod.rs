//! Configuration module for the Perch runtime.
//!
//! This module provides figment-based loading and validation of the
//! connection, logging and plugin settings.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    CoreConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, PerchConfig, SpanEventConfig,
};
pub use validation::validate_config;

//! Configuration module for the Parlor runtime.
//!
//! This module provides figment-based configuration loading and validation
//! for logging and client session settings.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    ClientConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, ParlorConfig,
    SpanEventConfig,
};
pub use validation::validate_config;

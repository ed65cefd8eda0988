//! Configuration module for the Waypoint runtime.
//!
//! This module provides layered configuration loading (files, environment,
//! programmatic overrides) and validation for logging and turn routing.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, RoutingConfig, SpanEventConfig,
    WaypointConfig,
};
pub use validation::validate_config;

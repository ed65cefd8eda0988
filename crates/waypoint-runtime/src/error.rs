//! Runtime error types.

use thiserror::Error;

use crate::config::ConfigError;
use waypoint_core::RouteError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A dialog with this name is already registered.
    #[error("Dialog already registered: {0}")]
    DialogExists(String),

    /// Matching or running a turn failed.
    #[error("Routing failed: {0}")]
    Routing(#[from] RouteError),
}

impl RuntimeError {
    /// Returns the routing error, if this is one.
    pub fn as_route_error(&self) -> Option<&RouteError> {
        match self {
            Self::Routing(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

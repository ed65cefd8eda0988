//! Error types shared by every Waypoint layer.
//!
//! The routing engine distinguishes three situations:
//!
//! - **No match**: a router returns `Ok(None)`. This is never an error.
//! - **Match-phase failure**: a router or predicate returns `Err` from
//!   `get_route`. Composites propagate it immediately.
//! - **Execute-phase failure**: a route's action returns `Err`. It propagates
//!   to whoever ran the action.

use thiserror::Error;

/// A type-erased error produced by application handlers and predicates.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while extracting handler arguments from a context.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// The activity carries no text.
    #[error("activity has no text")]
    MissingText,

    /// A state entry was expected but absent.
    #[error("state key '{key}' not found")]
    MissingState {
        /// The missing key.
        key: String,
    },

    /// A state entry could not be converted to or from JSON.
    #[error("state key '{key}' has an unexpected shape: {reason}")]
    InvalidState {
        /// The offending key.
        key: String,
        /// Conversion failure message.
        reason: String,
    },

    /// Custom extraction error.
    #[error("{0}")]
    Custom(String),
}

impl ExtractError {
    /// Creates a custom extraction error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Errors raised while matching or executing routes.
#[derive(Debug, Error)]
pub enum RouteError {
    /// A required argument was missing when a router was composed.
    #[error("required argument '{argument}' was not supplied")]
    InvalidArgument {
        /// Name of the missing argument.
        argument: &'static str,
    },

    /// A handler argument could not be extracted from the context.
    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),

    /// An application handler or predicate failed.
    #[error("handler failed: {0}")]
    Handler(#[source] BoxError),

    /// The turn's cancellation token fired.
    #[error("turn was cancelled")]
    Cancelled,

    /// A dialog was looked up by name but is not registered.
    #[error("dialog '{name}' is not registered")]
    DialogNotFound {
        /// The requested dialog name.
        name: String,
    },
}

impl RouteError {
    /// Creates an invalid-argument error for the named argument.
    pub fn invalid_argument(argument: &'static str) -> Self {
        Self::InvalidArgument { argument }
    }

    /// Wraps an application error.
    pub fn handler(err: impl Into<BoxError>) -> Self {
        Self::Handler(err.into())
    }

    /// Returns `true` if this error came from cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result type for routing operations.
pub type RouteResult<T> = Result<T, RouteError>;

//! Waypoint Runtime - Host layer for the Waypoint routing engine.
//!
//! This crate provides:
//! - Turn processing over a root router (`WaypointRuntime`)
//! - Named dialog trees resolved at match time (`DialogRegistry`)
//! - Per-conversation state carried between turns (`ConversationStore`)
//! - Layered configuration (files, profiles, `WAYPOINT_*` environment)
//! - Logging configuration
//!
//! ```ignore
//! use waypoint_runtime::WaypointRuntime;
//! use waypoint_framework::{first, simple, RouterExt};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = WaypointRuntime::builder()
//!         .router(simple(|| async { "hello" }))
//!         .build()?;
//!
//!     // Process activities until the stream ends or Ctrl+C
//!     runtime.run(activities, |outcome| println!("{:?}", outcome.replies)).await;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod registry;
pub mod runtime;
pub mod state;

// Re-exports
pub use config::{
    ConfigError, ConfigLoader, ConfigResult, LoggingConfig, Profile, RoutingConfig,
    WaypointConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, LoggingError, SpanEvents};
pub use registry::{DialogRegistry, DialogRouter};
pub use runtime::{RuntimeBuilder, RuntimeStats, TurnOutcome, WaypointRuntime};
pub use state::ConversationStore;

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}

//! # Waypoint Core
//!
//! The foundation of the Waypoint routing engine.
//!
//! This crate holds the types shared by the router engine and the runtime:
//!
//! - **Activity**: the inbound payload of one turn ([`Activity`], [`ActivityKind`])
//! - **Context**: per-turn state, replies and cancellation ([`TurnContext`])
//! - **Errors**: [`RouteError`] for match/execute failures and
//!   [`ExtractError`] for handler argument extraction
//!
//! ```text
//! ┌──────────┐     ┌─────────────┐     ┌──────────────┐
//! │ Activity │────▶│ TurnContext │────▶│ Router tree  │──▶ Route ──▶ action()
//! └──────────┘     └─────────────┘     └──────────────┘
//! ```

pub mod foundation;

pub use foundation::{
    Activity, ActivityKind, BoxError, ExtractError, ExtractResult, RouteError, RouteResult,
    StateMap, TurnContext,
};

pub use tokio_util::sync::CancellationToken;

/// Prelude for common imports.
pub mod prelude {
    pub use super::foundation::*;
}

//! Foundation layer - the types every other layer builds on.
//!
//! - [`Activity`]: what arrived in a turn
//! - [`TurnContext`]: shared per-turn state, replies and cancellation
//! - Error types for extraction and routing

pub mod activity;
pub mod context;
pub mod error;

pub use activity::{Activity, ActivityKind};
pub use context::{StateMap, TurnContext};
pub use error::{BoxError, ExtractError, ExtractResult, RouteError, RouteResult};

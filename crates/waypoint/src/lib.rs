//! # Waypoint
//!
//! Composable router combinators for conversational turns.
//!
//! ## Overview
//!
//! A bot's behavior is a tree of routers. Each turn is handled in two
//! phases: the tree is first asked which [`Route`](framework::Route) should
//! handle the incoming activity, and only then is that route's action run.
//! Matching never has side effects, so composites such as "best of" can
//! consult every child before anything executes.
//!
//! ```text
//! ┌──────────┐     ┌──────────────────────────────┐     ┌────────────┐
//! │ Activity │────▶│ first ─┬─ if_true(help) ─ …  │────▶│   Route    │──▶ action()
//! └──────────┘     │        └─ best ─┬─ scored 0.4│     │ score/path │
//!                  │                 └─ scored 0.9│     └────────────┘
//!                  └──────────────────────────────┘
//! ```
//!
//! - **Core**: activities, the per-turn context and errors
//! - **Framework**: the router trait, handlers and combinators
//! - **Runtime**: turn processing, dialogs, configuration and logging
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use waypoint::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let root = first(vec![
//!         if_true(|ctx| ctx.text() == Some("help"), simple(|| async { "Try 'hi'" })).boxed(),
//!         simple(|Text(text): Text| async move { format!("You said {text}") }).boxed(),
//!     ]);
//!
//!     let runtime = WaypointRuntime::builder().router(root).build()?;
//!     let outcome = runtime.process(Activity::message("help")).await?;
//!     assert_eq!(outcome.replies, vec!["Try 'hi'"]);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use waypoint_core as core;
pub use waypoint_framework as framework;
pub use waypoint_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use waypoint::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use waypoint_runtime::{ConversationStore, DialogRegistry, TurnOutcome, WaypointRuntime};

    // Turn inputs
    pub use waypoint_core::{
        Activity, ActivityKind, RouteError, RouteResult, StateMap, TurnContext,
    };

    // Routers and combinators
    pub use waypoint_framework::prelude::*;
}

//! # Waypoint Framework
//!
//! The router engine. Every turn goes through two phases:
//!
//! 1. **Match**: the root [`Router`] is asked for a [`Route`]. Composite
//!    routers consult their children in registration order; nothing runs.
//! 2. **Execute**: the caller runs the winning route's action.
//!
//! This layer provides:
//! - The [`Router`] trait and leaf adapters ([`simple`], [`scored`],
//!   [`from_fn`], [`no_router`])
//! - Axum-style [`Handler`]s with [`FromContext`] extractors
//! - Combinators: [`IfMatch`], [`DoBefore`]/[`DoAfter`],
//!   [`FirstRouter`]/[`BestRouter`]
//! - Diagnostic path tracking ([`prefix_path`], [`push_path`],
//!   [`update_path`], [`RouterExt::named`])
//! - [`route_message`] and the tower adapter [`RouterService`]

pub mod aggregate;
pub mod conditional;
pub mod extractor;
pub mod handler;
pub mod path;
pub mod route;
pub mod router;
pub mod routing;
pub mod sequence;

pub use aggregate::{BestRouter, FirstRouter, best, first};
pub use conditional::{
    AsyncPredicateFn, Condition, IfMatch, PredicateFn, if_else, if_match, if_true,
};
pub use extractor::{FromContext, Text};
pub use handler::{BoxedHandler, Handler, HandlerResponse, into_handler};
pub use path::{Masked, Named, RoutePath, prefix_path, push_path, update_path};
pub use route::{Route, RouteAction};
pub use router::{
    AnonymousRouter, BoxedRouter, NoRouter, Router, RouterExt, ScoredRouter, SimpleRouter,
    from_fn, is_no_router, no_router, scored, simple,
};
pub use routing::{RouteOutcome, RouterService, route_message};
pub use sequence::{DoAfter, DoBefore, do_after, do_before};

pub use waypoint_core::{ExtractError, ExtractResult, RouteError, RouteResult, TurnContext};

/// Prelude for building router trees.
pub mod prelude {
    pub use super::{
        BestRouter, BoxedRouter, Condition, FirstRouter, FromContext, IfMatch, Route,
        RouteOutcome, Router, RouterExt, Text, best, do_after, do_before, first, from_fn,
        if_else, if_match, if_true, no_router, route_message, scored, simple,
    };
    pub use waypoint_core::prelude::*;
}

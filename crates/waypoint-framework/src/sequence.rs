//! Before/after sequencing.
//!
//! [`DoBefore`] and [`DoAfter`] attach a handler to a router's route. Matching
//! is fully delegated to the wrapped router, so wrapping never changes
//! whether a turn matches, the route's score, or its path. Only the action
//! changes: the two steps run strictly one after the other, and an error in
//! the first step aborts the second.

use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::trace;

use crate::handler::{BoxedHandler, Handler, into_handler};
use crate::route::{Route, RouteAction};
use crate::router::{BoxedRouter, Router};
use waypoint_core::{RouteResult, TurnContext};

/// Runs a handler before the wrapped router's action.
#[derive(Clone)]
pub struct DoBefore {
    before: BoxedHandler,
    router: BoxedRouter,
}

impl DoBefore {
    pub fn new<H, T, R>(handler: H, router: R) -> Self
    where
        H: Handler<T>,
        T: 'static,
        R: Router + 'static,
    {
        Self::from_parts(into_handler(handler), Arc::new(router))
    }

    pub fn from_parts(before: BoxedHandler, router: BoxedRouter) -> Self {
        Self { before, router }
    }
}

#[async_trait]
impl Router for DoBefore {
    async fn get_route(&self, ctx: Arc<TurnContext>) -> RouteResult<Option<Route>> {
        let Some(route) = self.router.get_route(Arc::clone(&ctx)).await? else {
            return Ok(None);
        };

        let before = Arc::clone(&self.before);
        let main = route.action_fn();
        let action: RouteAction = Arc::new(move || {
            let before = Arc::clone(&before);
            let main = Arc::clone(&main);
            let ctx = Arc::clone(&ctx);
            async move {
                trace!("Running before-handler");
                before(ctx).await?;
                main().await
            }
            .boxed()
        });

        Ok(Some(route.replace_action(action)))
    }
}

/// Runs a handler after the wrapped router's action.
#[derive(Clone)]
pub struct DoAfter {
    router: BoxedRouter,
    after: BoxedHandler,
}

impl DoAfter {
    pub fn new<R, H, T>(router: R, handler: H) -> Self
    where
        R: Router + 'static,
        H: Handler<T>,
        T: 'static,
    {
        Self::from_parts(Arc::new(router), into_handler(handler))
    }

    pub fn from_parts(router: BoxedRouter, after: BoxedHandler) -> Self {
        Self { router, after }
    }
}

#[async_trait]
impl Router for DoAfter {
    async fn get_route(&self, ctx: Arc<TurnContext>) -> RouteResult<Option<Route>> {
        let Some(route) = self.router.get_route(Arc::clone(&ctx)).await? else {
            return Ok(None);
        };

        let after = Arc::clone(&self.after);
        let main = route.action_fn();
        let action: RouteAction = Arc::new(move || {
            let after = Arc::clone(&after);
            let main = Arc::clone(&main);
            let ctx = Arc::clone(&ctx);
            async move {
                main().await?;
                trace!("Running after-handler");
                after(ctx).await
            }
            .boxed()
        });

        Ok(Some(route.replace_action(action)))
    }
}

/// Runs `handler` before `router`'s action whenever `router` matches.
pub fn do_before<H, T, R>(handler: H, router: R) -> DoBefore
where
    H: Handler<T>,
    T: 'static,
    R: Router + 'static,
{
    DoBefore::new(handler, router)
}

/// Runs `handler` after `router`'s action whenever `router` matches.
pub fn do_after<R, H, T>(router: R, handler: H) -> DoAfter
where
    R: Router + 'static,
    H: Handler<T>,
    T: 'static,
{
    DoAfter::new(router, handler)
}

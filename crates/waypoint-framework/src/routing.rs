//! Running a router tree against a turn.
//!
//! [`route_message`] joins the two phases: it asks the root router for a
//! route and, if one comes back, runs its action. [`RouterService`] exposes
//! the same thing as a `tower::Service` so tower middleware can wrap a tree.
//!
//! ```rust,ignore
//! use tower::ServiceBuilder;
//! use tower::util::ServiceExt;
//!
//! let service = ServiceBuilder::new()
//!     .map_err(|err: RouteError| { tracing::warn!(%err); err })
//!     .service(RouterService::new(root));
//! let outcome = service.oneshot(ctx).await?;
//! ```

use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::future::BoxFuture;
use tower::Service;
use tracing::{debug, trace};

use crate::path::RoutePath;
use crate::router::{BoxedRouter, Router};
use waypoint_core::{RouteError, RouteResult, TurnContext};

/// What happened when a turn was routed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteOutcome {
    /// Whether a route matched and its action ran.
    pub matched: bool,
    /// The diagnostic path of the route that ran, if tracked.
    pub path: Option<RoutePath>,
}

impl RouteOutcome {
    pub fn unmatched() -> Self {
        Self::default()
    }
}

/// Finds a route for `ctx` and runs it.
///
/// No match is not an error. Match-phase and execute-phase errors are
/// returned as-is.
pub async fn route_message<R>(router: &R, ctx: Arc<TurnContext>) -> RouteResult<RouteOutcome>
where
    R: Router + ?Sized,
{
    let Some(route) = router.get_route(ctx).await? else {
        trace!("No route matched");
        return Ok(RouteOutcome::unmatched());
    };

    debug!(path = ?route.path(), score = route.score(), "Running matched route");
    route.action().await?;

    Ok(RouteOutcome {
        matched: true,
        path: route.path().cloned(),
    })
}

/// A tower [`Service`] that routes turns through a router tree.
///
/// Cloning is cheap; clones share the tree.
#[derive(Clone)]
pub struct RouterService {
    router: BoxedRouter,
}

impl RouterService {
    pub fn new<R: Router + 'static>(router: R) -> Self {
        Self::from_boxed(Arc::new(router))
    }

    pub fn from_boxed(router: BoxedRouter) -> Self {
        Self { router }
    }

    /// Returns the root router.
    pub fn router(&self) -> &BoxedRouter {
        &self.router
    }
}

impl Service<Arc<TurnContext>> for RouterService {
    type Response = RouteOutcome;
    type Error = RouteError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, ctx: Arc<TurnContext>) -> Self::Future {
        let router = Arc::clone(&self.router);
        async move { route_message(router.as_ref(), ctx).await }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{best, first};
    use crate::conditional::if_true;
    use crate::router::{RouterExt, no_router, scored, simple};
    use tokio_test::{assert_err, assert_ok};
    use tower::util::ServiceExt;
    use waypoint_core::Activity;

    fn ctx(text: &str) -> Arc<TurnContext> {
        Arc::new(TurnContext::new(Activity::message(text)))
    }

    fn help_tree() -> BoxedRouter {
        first(vec![
            if_true(
                |ctx| ctx.text() == Some("help"),
                simple(|| async { "help-text" }),
            )
            .boxed(),
            best(vec![
                scored(|| async { "ReplyA" }, 0.4).boxed(),
                scored(|| async { "ReplyB" }, 0.9).boxed(),
            ])
            .boxed(),
        ])
        .boxed()
    }

    #[tokio::test]
    async fn test_end_to_end_tree() {
        let root = help_tree();

        let help = ctx("help");
        let outcome = assert_ok!(route_message(&root, Arc::clone(&help)).await);
        assert!(outcome.matched);
        assert_eq!(help.replies(), vec!["help-text"]);

        let hello = ctx("hello");
        assert_ok!(route_message(&root, Arc::clone(&hello)).await);
        assert_eq!(hello.replies(), vec!["ReplyB"]);
    }

    #[tokio::test]
    async fn test_no_match_is_not_an_error() {
        let outcome = assert_ok!(route_message(&no_router(), ctx("x")).await);
        assert_eq!(outcome, RouteOutcome::unmatched());
    }

    #[tokio::test]
    async fn test_action_error_propagates() {
        let router = simple(|| async { Err::<(), _>("handler blew up") });
        let err = assert_err!(route_message(&router, ctx("x")).await);
        assert!(matches!(err, RouteError::Handler(_)));
    }

    #[tokio::test]
    async fn test_router_service() {
        let service = RouterService::new(simple(|| async { "hi" }).named("greet"));
        let ctx = ctx("x");

        let outcome = assert_ok!(service.clone().oneshot(Arc::clone(&ctx)).await);
        assert!(outcome.matched);
        assert_eq!(outcome.path, Some(vec!["greet".to_string()]));
        assert_eq!(ctx.replies(), vec!["hi"]);
    }
}

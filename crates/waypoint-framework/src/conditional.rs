//! Conditional routing.
//!
//! [`IfMatch`] evaluates a [`Condition`] exactly once per `get_route` call
//! and delegates to its `then` branch on `true`, or to its `otherwise`
//! branch on `false`. Without an `otherwise` branch a false condition is
//! simply no match.
//!
//! ```rust,ignore
//! let help = if_true(
//!     |ctx| ctx.text() == Some("help"),
//!     simple(|| async { "Here's what I can do..." }),
//! )
//! .otherwise(simple(|| async { "Try typing 'help'." }));
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::trace;

use crate::path::prefix_path;
use crate::route::Route;
use crate::router::{BoxedRouter, Router, is_no_router, no_router, or_no_router};
use waypoint_core::{RouteError, RouteResult, TurnContext};

/// A type-erased synchronous predicate.
pub type PredicateFn = Arc<dyn Fn(&TurnContext) -> bool + Send + Sync>;

/// A type-erased asynchronous, fallible predicate.
pub type AsyncPredicateFn =
    Arc<dyn Fn(Arc<TurnContext>) -> BoxFuture<'static, RouteResult<bool>> + Send + Sync>;

/// A predicate over the turn context.
///
/// Conditions are evaluated during the match phase and must not produce side
/// effects.
#[derive(Clone)]
pub enum Condition {
    /// Evaluated inline.
    Sync(PredicateFn),
    /// Awaited; an `Err` propagates out of `get_route`.
    Async(AsyncPredicateFn),
}

impl Condition {
    /// Creates a synchronous condition.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&TurnContext) -> bool + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(predicate))
    }

    /// Creates an asynchronous condition that cannot fail.
    pub fn from_async<F, Fut>(predicate: F) -> Self
    where
        F: Fn(Arc<TurnContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Self::Async(Arc::new(move |ctx| predicate(ctx).map(Ok).boxed()))
    }

    /// Creates an asynchronous condition that may fail.
    ///
    /// Useful when the predicate consults an external recognizer.
    pub fn fallible<F, Fut>(predicate: F) -> Self
    where
        F: Fn(Arc<TurnContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RouteResult<bool>> + Send + 'static,
    {
        Self::Async(Arc::new(move |ctx| predicate(ctx).boxed()))
    }

    /// Evaluates the condition against `ctx`.
    pub async fn evaluate(&self, ctx: &Arc<TurnContext>) -> RouteResult<bool> {
        match self {
            Self::Sync(predicate) => Ok(predicate(ctx.as_ref())),
            Self::Async(predicate) => predicate(Arc::clone(ctx)).await,
        }
    }
}

impl std::fmt::Debug for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Condition::Sync"),
            Self::Async(_) => f.write_str("Condition::Async"),
        }
    }
}

/// A predicate-gated router with an optional else branch.
#[derive(Clone)]
pub struct IfMatch {
    condition: Condition,
    then: BoxedRouter,
    otherwise: BoxedRouter,
}

impl IfMatch {
    pub fn new<R: Router + 'static>(condition: Condition, then: R) -> Self {
        Self::from_boxed(condition, Arc::new(then))
    }

    /// Creates a conditional router from a pre-built boxed branch.
    pub fn from_boxed(condition: Condition, then: BoxedRouter) -> Self {
        Self {
            condition,
            then,
            otherwise: no_router(),
        }
    }

    /// Validates optional parts and builds the router.
    ///
    /// A missing condition or `then` branch is an
    /// [`InvalidArgument`](RouteError::InvalidArgument); a missing else
    /// branch means "no match when false".
    pub fn try_new(
        condition: Option<Condition>,
        then: Option<BoxedRouter>,
        otherwise: Option<BoxedRouter>,
    ) -> RouteResult<Self> {
        let condition = condition.ok_or_else(|| RouteError::invalid_argument("condition"))?;
        let then = then.ok_or_else(|| RouteError::invalid_argument("then"))?;
        Ok(Self {
            condition,
            then,
            otherwise: or_no_router(otherwise),
        })
    }

    /// Sets the router consulted when the condition is false.
    pub fn otherwise<R: Router + 'static>(self, router: R) -> Self {
        self.otherwise_boxed(Arc::new(router))
    }

    pub fn otherwise_boxed(mut self, router: BoxedRouter) -> Self {
        self.otherwise = router;
        self
    }

    /// Returns `true` if an else branch is set.
    pub fn has_otherwise(&self) -> bool {
        !is_no_router(&self.otherwise)
    }
}

#[async_trait]
impl Router for IfMatch {
    async fn get_route(&self, ctx: Arc<TurnContext>) -> RouteResult<Option<Route>> {
        let matched = self.condition.evaluate(&ctx).await?;
        trace!(matched, "Condition evaluated");

        let (branch, prefix) = if matched {
            (&self.then, "then/")
        } else {
            (&self.otherwise, "else/")
        };
        if is_no_router(branch) {
            return Ok(None);
        }

        let route = branch.get_route(ctx).await?;
        Ok(route.map(|route| route.map_path(|path| prefix_path(path, prefix))))
    }
}

/// Routes to `then` when `condition` holds.
pub fn if_match<R: Router + 'static>(condition: Condition, then: R) -> IfMatch {
    IfMatch::new(condition, then)
}

/// Routes to `then` when the synchronous `predicate` holds.
pub fn if_true<F, R>(predicate: F, then: R) -> IfMatch
where
    F: Fn(&TurnContext) -> bool + Send + Sync + 'static,
    R: Router + 'static,
{
    IfMatch::new(Condition::new(predicate), then)
}

/// Routes to `then` when `condition` holds and to `otherwise` when it does not.
pub fn if_else<R, E>(condition: Condition, then: R, otherwise: E) -> IfMatch
where
    R: Router + 'static,
    E: Router + 'static,
{
    IfMatch::new(condition, then).otherwise(otherwise)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::{RouterExt, simple};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::{assert_err, assert_ok};
    use waypoint_core::Activity;

    fn ctx(text: &str) -> Arc<TurnContext> {
        Arc::new(TurnContext::new(Activity::message(text)))
    }

    fn is_help() -> Condition {
        Condition::new(|ctx| ctx.text() == Some("help"))
    }

    #[tokio::test]
    async fn test_then_branch() {
        let router = if_match(is_help(), simple(|| async { "help-text" }));
        let ctx = ctx("help");

        let route = assert_ok!(router.get_route(Arc::clone(&ctx)).await).unwrap();
        route.action().await.unwrap();
        assert_eq!(ctx.replies(), vec!["help-text"]);
    }

    #[tokio::test]
    async fn test_false_without_else_is_no_match() {
        let router = if_match(is_help(), simple(|| async { "help-text" }));
        assert!(!router.has_otherwise());
        assert!(router.get_route(ctx("hello")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_else_branch() {
        let router = if_else(
            is_help(),
            simple(|| async { "help-text" }),
            simple(|| async { "fallback" }),
        );
        let ctx = ctx("hello");

        let route = router.get_route(Arc::clone(&ctx)).await.unwrap().unwrap();
        route.action().await.unwrap();
        assert_eq!(ctx.replies(), vec!["fallback"]);
    }

    #[tokio::test]
    async fn test_condition_evaluated_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let condition = Condition::from_async(move |_ctx| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { true }
        });

        let router = if_match(condition, simple(|| async {}));
        assert!(router.get_route(ctx("x")).await.unwrap().is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_predicate_error_propagates() {
        let condition =
            Condition::fallible(|_ctx| async { Err(RouteError::handler("recognizer offline")) });
        let router = if_match(condition, simple(|| async {}));

        let err = assert_err!(router.get_route(ctx("x")).await);
        assert!(matches!(err, RouteError::Handler(_)));
    }

    #[tokio::test]
    async fn test_branch_paths() {
        let router = if_else(
            is_help(),
            simple(|| async {}).named("help"),
            simple(|| async {}).named("fallback"),
        );

        let route = router.get_route(ctx("help")).await.unwrap().unwrap();
        assert_eq!(route.path(), Some(&vec!["then/help".to_string()]));

        let route = router.get_route(ctx("hi")).await.unwrap().unwrap();
        assert_eq!(route.path(), Some(&vec!["else/fallback".to_string()]));
    }

    #[test]
    fn test_try_new_validates_arguments() {
        let err = IfMatch::try_new(None, Some(simple(|| async {}).boxed()), None).err();
        assert!(matches!(
            err,
            Some(RouteError::InvalidArgument {
                argument: "condition"
            })
        ));

        let err = IfMatch::try_new(Some(is_help()), None, None).err();
        assert!(matches!(
            err,
            Some(RouteError::InvalidArgument { argument: "then" })
        ));

        let router = IfMatch::try_new(Some(is_help()), Some(no_router()), None).unwrap();
        assert!(!router.has_otherwise());
    }
}

//! The router trait and its leaf adapters.
//!
//! A [`Router`] inspects a turn and proposes at most one [`Route`] without
//! running it. Matching is the first phase of a turn; running the winning
//! route's action is the second, and belongs to the caller.
//!
//! Leaf adapters:
//!
//! - [`SimpleRouter`]: always matches, running a handler
//! - [`ScoredRouter`]: like `SimpleRouter` with an explicit score
//! - [`AnonymousRouter`]: wraps an ad hoc async matching function
//! - [`NoRouter`]: never matches; [`no_router`] is its shared instance
//!
//! Combinators live in [`conditional`](crate::conditional),
//! [`sequence`](crate::sequence) and [`aggregate`](crate::aggregate);
//! [`RouterExt`] chains the common ones.
//!
//! # Example
//!
//! ```rust,ignore
//! use waypoint_framework::prelude::*;
//!
//! let router = first(vec![
//!     if_true(|ctx| ctx.text() == Some("help"), simple(|| async { "help-text" }))
//!         .named("help")
//!         .boxed(),
//!     simple(|| async { "Sorry, I didn't get that." }).boxed(),
//! ]);
//! ```

use std::future::Future;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;

use crate::aggregate::FirstRouter;
use crate::handler::{BoxedHandler, Handler, handler_route, into_handler};
use crate::path::{Masked, Named};
use crate::route::Route;
use crate::sequence::{DoAfter, DoBefore};
use waypoint_core::{RouteResult, TurnContext};

// ============================================================================
// Router Trait
// ============================================================================

/// Given a turn context, asynchronously propose zero or one route.
///
/// Implementations must not produce side effects: calling `get_route` twice
/// with the same context yields equivalent results and runs nothing. All
/// side effects belong in the returned route's action.
///
/// `Ok(None)` means "no match" and is never an error. `Err` is reserved for
/// genuine failures, which composites propagate immediately.
#[async_trait]
pub trait Router: Send + Sync {
    /// Find a route for this turn.
    async fn get_route(&self, ctx: Arc<TurnContext>) -> RouteResult<Option<Route>>;
}

/// A type-erased, shareable router.
pub type BoxedRouter = Arc<dyn Router>;

#[async_trait]
impl<R: Router + ?Sized> Router for Arc<R> {
    async fn get_route(&self, ctx: Arc<TurnContext>) -> RouteResult<Option<Route>> {
        (**self).get_route(ctx).await
    }
}

// ============================================================================
// NoRouter
// ============================================================================

/// A router that never matches.
///
/// Composites skip it without calling it, so it is also the stand-in for an
/// absent child.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRouter;

#[async_trait]
impl Router for NoRouter {
    async fn get_route(&self, _ctx: Arc<TurnContext>) -> RouteResult<Option<Route>> {
        Ok(None)
    }
}

static NO_ROUTER: LazyLock<BoxedRouter> = LazyLock::new(|| Arc::new(NoRouter));

/// Returns the shared never-matching router.
pub fn no_router() -> BoxedRouter {
    Arc::clone(&*NO_ROUTER)
}

/// Returns `true` if `router` is the shared instance returned by [`no_router`].
///
/// This is a pointer comparison; a separately constructed `NoRouter` is not
/// the sentinel.
pub fn is_no_router(router: &BoxedRouter) -> bool {
    Arc::ptr_eq(router, &*NO_ROUTER)
}

/// Replaces an absent router with the sentinel.
pub(crate) fn or_no_router(router: Option<BoxedRouter>) -> BoxedRouter {
    router.unwrap_or_else(no_router)
}

// ============================================================================
// SimpleRouter / ScoredRouter
// ============================================================================

/// A router that always matches with a route running its handler.
#[derive(Clone)]
pub struct SimpleRouter {
    handler: BoxedHandler,
}

impl SimpleRouter {
    pub fn new<H, T>(handler: H) -> Self
    where
        H: Handler<T>,
        T: 'static,
    {
        Self::from_boxed(into_handler(handler))
    }

    /// Creates a router from a pre-built boxed handler.
    pub fn from_boxed(handler: BoxedHandler) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl Router for SimpleRouter {
    async fn get_route(&self, ctx: Arc<TurnContext>) -> RouteResult<Option<Route>> {
        Ok(Some(handler_route(&self.handler, ctx)))
    }
}

/// Wraps a handler in a [`SimpleRouter`].
pub fn simple<H, T>(handler: H) -> SimpleRouter
where
    H: Handler<T>,
    T: 'static,
{
    SimpleRouter::new(handler)
}

/// A router that always matches with a route of a fixed score.
#[derive(Clone)]
pub struct ScoredRouter {
    handler: BoxedHandler,
    score: f64,
}

impl ScoredRouter {
    pub fn new<H, T>(handler: H, score: f64) -> Self
    where
        H: Handler<T>,
        T: 'static,
    {
        Self {
            handler: into_handler(handler),
            score,
        }
    }

    pub fn score(&self) -> f64 {
        self.score
    }
}

#[async_trait]
impl Router for ScoredRouter {
    async fn get_route(&self, ctx: Arc<TurnContext>) -> RouteResult<Option<Route>> {
        Ok(Some(handler_route(&self.handler, ctx).with_score(self.score)))
    }
}

/// Wraps a handler in a [`ScoredRouter`].
pub fn scored<H, T>(handler: H, score: f64) -> ScoredRouter
where
    H: Handler<T>,
    T: 'static,
{
    ScoredRouter::new(handler, score)
}

// ============================================================================
// AnonymousRouter
// ============================================================================

/// A router backed by an async function.
///
/// The function must follow the router contract: decide, don't act.
#[derive(Clone)]
pub struct AnonymousRouter<F> {
    f: F,
}

impl<F> AnonymousRouter<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> Router for AnonymousRouter<F>
where
    F: Fn(Arc<TurnContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RouteResult<Option<Route>>> + Send + 'static,
{
    async fn get_route(&self, ctx: Arc<TurnContext>) -> RouteResult<Option<Route>> {
        (self.f)(ctx).await
    }
}

/// Wraps an async matching function in an [`AnonymousRouter`].
///
/// # Example
///
/// ```rust,ignore
/// let router = from_fn(|ctx: Arc<TurnContext>| async move {
///     if ctx.has_state("muted") {
///         return Ok(None);
///     }
///     Ok(Some(Route::new(|| async { Ok(()) })))
/// });
/// ```
pub fn from_fn<F, Fut>(f: F) -> AnonymousRouter<F>
where
    F: Fn(Arc<TurnContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RouteResult<Option<Route>>> + Send + 'static,
{
    AnonymousRouter::new(f)
}

// ============================================================================
// RouterExt
// ============================================================================

/// Chaining helpers available on every sized router.
pub trait RouterExt: Router + Sized + 'static {
    /// Erase the concrete type.
    fn boxed(self) -> BoxedRouter {
        Arc::new(self)
    }

    /// Push `segment` onto the path of every route this router produces.
    fn named(self, segment: impl Into<String>) -> Named<Self> {
        Named::new(self, segment)
    }

    /// Collapse the path of every tracked route this router produces to
    /// `[segment]`.
    fn masked(self, segment: impl Into<String>) -> Masked<Self> {
        Masked::new(self, segment)
    }

    /// Run `handler` before this router's action whenever it matches.
    fn do_before<H, T>(self, handler: H) -> DoBefore
    where
        H: Handler<T>,
        T: 'static,
    {
        DoBefore::new(handler, self)
    }

    /// Run `handler` after this router's action whenever it matches.
    fn do_after<H, T>(self, handler: H) -> DoAfter
    where
        H: Handler<T>,
        T: 'static,
    {
        DoAfter::new(self, handler)
    }

    /// Try this router, then `fallback` if it does not match.
    fn or_else<R: Router + 'static>(self, fallback: R) -> FirstRouter {
        FirstRouter::new().add(self).add(fallback)
    }
}

impl<R: Router + Sized + 'static> RouterExt for R {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio_test::{assert_err, assert_ok};
    use waypoint_core::{Activity, RouteError};

    fn ctx(text: &str) -> Arc<TurnContext> {
        Arc::new(TurnContext::new(Activity::message(text)))
    }

    #[tokio::test]
    async fn test_simple_router_matches_without_running() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let router = simple(move || {
            let flag = Arc::clone(&flag);
            async move { flag.store(true, Ordering::SeqCst) }
        });
        let ctx = ctx("hi");

        // Matching twice is idempotent and runs nothing.
        let first = assert_ok!(router.get_route(Arc::clone(&ctx)).await);
        let second = assert_ok!(router.get_route(Arc::clone(&ctx)).await);
        assert!(first.is_some() && second.is_some());
        assert!(!ran.load(Ordering::SeqCst));

        assert_ok!(first.unwrap().action().await);
        assert!(ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_scored_router() {
        let router = scored(|| async {}, 0.4);
        let route = router.get_route(ctx("x")).await.unwrap().unwrap();
        assert_eq!(route.score(), 0.4);

        let route = simple(|| async {}).get_route(ctx("x")).await.unwrap().unwrap();
        assert_eq!(route.score(), Route::DEFAULT_SCORE);
    }

    #[tokio::test]
    async fn test_no_router_sentinel() {
        assert!(is_no_router(&no_router()));
        assert!(!is_no_router(&NoRouter.boxed()));
        assert!(is_no_router(&or_no_router(None)));

        let route = assert_ok!(no_router().get_route(ctx("x")).await);
        assert!(route.is_none());
    }

    #[tokio::test]
    async fn test_anonymous_router() {
        let router = from_fn(|ctx: Arc<TurnContext>| async move {
            if ctx.text() == Some("boom") {
                return Err(RouteError::handler("matcher exploded"));
            }
            Ok(ctx
                .text()
                .filter(|text| text.starts_with('/'))
                .map(|_| Route::new(|| async { Ok(()) })))
        });

        assert!(router.get_route(ctx("/start")).await.unwrap().is_some());
        assert!(router.get_route(ctx("hello")).await.unwrap().is_none());
        assert_err!(router.get_route(ctx("boom")).await);
    }

    #[tokio::test]
    async fn test_boxed_router_delegates() {
        let router: BoxedRouter = simple(|| async { "hi" }).boxed();
        let ctx = ctx("x");
        let route = router.get_route(Arc::clone(&ctx)).await.unwrap().unwrap();
        route.action().await.unwrap();
        assert_eq!(ctx.replies(), vec!["hi"]);
    }
}

//! Aggregate routers over an ordered list of children.
//!
//! Both routers query their children sequentially in registration order and
//! skip the [`no_router`] sentinel without calling it.
//!
//! - [`FirstRouter`]: returns the first child that matches and never
//!   evaluates the children after it.
//! - [`BestRouter`]: evaluates every child and returns the route with the
//!   strictly highest score; on a tie the earliest child wins.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::path::prefix_path;
use crate::route::Route;
use crate::router::{BoxedRouter, Router, is_no_router, or_no_router};
use waypoint_core::{RouteResult, TurnContext};

/// Ordered short-circuit over child routers.
#[derive(Clone, Default)]
pub struct FirstRouter {
    routers: Vec<BoxedRouter>,
}

impl FirstRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_routers(routers: Vec<BoxedRouter>) -> Self {
        Self { routers }
    }

    /// Appends a child.
    pub fn add<R: Router + 'static>(self, router: R) -> Self {
        self.add_boxed(Arc::new(router))
    }

    pub fn add_boxed(mut self, router: BoxedRouter) -> Self {
        self.routers.push(router);
        self
    }

    /// Appends a child that may be absent; `None` never matches.
    pub fn add_optional(self, router: Option<BoxedRouter>) -> Self {
        self.add_boxed(or_no_router(router))
    }

    pub fn len(&self) -> usize {
        self.routers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routers.is_empty()
    }
}

#[async_trait]
impl Router for FirstRouter {
    async fn get_route(&self, ctx: Arc<TurnContext>) -> RouteResult<Option<Route>> {
        for (index, router) in self.routers.iter().enumerate() {
            if is_no_router(router) {
                continue;
            }

            trace!(index, "Evaluating child");
            if let Some(route) = router.get_route(Arc::clone(&ctx)).await? {
                debug!(index, "First child matched");
                let prefix = format!("first[{index}]/");
                return Ok(Some(route.map_path(|path| prefix_path(path, &prefix))));
            }
        }

        Ok(None)
    }
}

/// Score arbitration over child routers.
///
/// Routes that were never scored count as [`Route::DEFAULT_SCORE`]. A `NaN`
/// score never wins.
#[derive(Clone, Default)]
pub struct BestRouter {
    routers: Vec<BoxedRouter>,
}

impl BestRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_routers(routers: Vec<BoxedRouter>) -> Self {
        Self { routers }
    }

    /// Appends a child.
    pub fn add<R: Router + 'static>(self, router: R) -> Self {
        self.add_boxed(Arc::new(router))
    }

    pub fn add_boxed(mut self, router: BoxedRouter) -> Self {
        self.routers.push(router);
        self
    }

    /// Appends a child that may be absent; `None` never matches.
    pub fn add_optional(self, router: Option<BoxedRouter>) -> Self {
        self.add_boxed(or_no_router(router))
    }

    pub fn len(&self) -> usize {
        self.routers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routers.is_empty()
    }
}

#[async_trait]
impl Router for BestRouter {
    async fn get_route(&self, ctx: Arc<TurnContext>) -> RouteResult<Option<Route>> {
        let mut best: Option<(usize, Route)> = None;
        let mut best_score = f64::NEG_INFINITY;

        for (index, router) in self.routers.iter().enumerate() {
            if is_no_router(router) {
                continue;
            }

            let Some(route) = router.get_route(Arc::clone(&ctx)).await? else {
                trace!(index, "Child did not match");
                continue;
            };

            let score = route.score();
            trace!(index, score, "Child matched");
            // Strictly greater: ties keep the earlier child.
            if score > best_score {
                best_score = score;
                best = Some((index, route));
            }
        }

        Ok(best.map(|(index, route)| {
            debug!(index, score = best_score, "Best child selected");
            let prefix = format!("best[{index}]/");
            route.map_path(|path| prefix_path(path, &prefix))
        }))
    }
}

/// Builds a [`FirstRouter`] over `routers`.
pub fn first(routers: Vec<BoxedRouter>) -> FirstRouter {
    FirstRouter::with_routers(routers)
}

/// Builds a [`BestRouter`] over `routers`.
pub fn best(routers: Vec<BoxedRouter>) -> BestRouter {
    BestRouter::with_routers(routers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::{RouterExt, from_fn, no_router, scored, simple};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::{assert_err, assert_ok};
    use waypoint_core::{Activity, RouteError};

    fn ctx(text: &str) -> Arc<TurnContext> {
        Arc::new(TurnContext::new(Activity::message(text)))
    }

    /// A router that fails the test if it is ever consulted.
    fn error_router() -> BoxedRouter {
        from_fn(|_ctx: Arc<TurnContext>| async {
            Err(RouteError::handler("should not have been evaluated"))
        })
        .boxed()
    }

    fn counting(calls: &Arc<AtomicUsize>) -> BoxedRouter {
        let calls = Arc::clone(calls);
        from_fn(move |_ctx: Arc<TurnContext>| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(None) }
        })
        .boxed()
    }

    async fn run(router: &impl Router, ctx: &Arc<TurnContext>) -> Vec<String> {
        let route = router.get_route(Arc::clone(ctx)).await.unwrap().unwrap();
        route.action().await.unwrap();
        ctx.take_replies()
    }

    #[tokio::test]
    async fn test_first_short_circuits() {
        let router = first(vec![
            simple(|| async { "a" }).boxed(),
            error_router(),
        ]);
        let ctx = ctx("x");

        assert_eq!(run(&router, &ctx).await, vec!["a"]);
    }

    #[tokio::test]
    async fn test_first_skips_non_matching_in_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = FirstRouter::new()
            .add_boxed(counting(&calls))
            .add_optional(None)
            .add(simple(|| async { "b" }))
            .add_boxed(error_router());
        let ctx = ctx("x");

        assert_eq!(router.len(), 4);
        assert_eq!(run(&router, &ctx).await, vec!["b"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_first_with_nothing_to_match() {
        let empty = FirstRouter::new();
        assert!(empty.is_empty());
        assert!(assert_ok!(empty.get_route(ctx("x")).await).is_none());

        let sentinels = FirstRouter::new()
            .add_boxed(no_router())
            .add_optional(None);
        assert!(assert_ok!(sentinels.get_route(ctx("x")).await).is_none());
    }

    #[tokio::test]
    async fn test_first_propagates_child_errors() {
        let router = first(vec![error_router(), simple(|| async {}).boxed()]);
        assert_err!(router.get_route(ctx("x")).await);
    }

    #[tokio::test]
    async fn test_best_propagates_child_errors() {
        let failing = from_fn(|_ctx: Arc<TurnContext>| async {
            Err(RouteError::handler("lookup failed"))
        })
        .boxed();

        // An earlier, higher-scored match does not hide a later failure.
        let router = best(vec![scored(|| async {}, 5.0).boxed(), failing.clone()]);
        let err = assert_err!(router.get_route(ctx("x")).await);
        assert!(matches!(err, RouteError::Handler(_)));

        let router = best(vec![failing, simple(|| async {}).boxed()]);
        assert_err!(router.get_route(ctx("x")).await);
    }

    #[tokio::test]
    async fn test_best_picks_highest_score() {
        let router = best(vec![
            scored(|| async { "0.4" }, 0.4).boxed(),
            scored(|| async { "0.9" }, 0.9).boxed(),
            scored(|| async { "0.5" }, 0.5).boxed(),
        ]);
        let ctx = ctx("x");

        let route = router.get_route(Arc::clone(&ctx)).await.unwrap().unwrap();
        assert_eq!(route.score(), 0.9);
        route.action().await.unwrap();
        assert_eq!(ctx.replies(), vec!["0.9"]);
    }

    #[tokio::test]
    async fn test_best_tie_goes_to_first() {
        let router = BestRouter::new()
            .add(scored(|| async { "first" }, 0.5))
            .add(scored(|| async { "second" }, 0.5));
        let ctx = ctx("x");

        for _ in 0..3 {
            assert_eq!(run(&router, &ctx).await, vec!["first"]);
        }
    }

    #[tokio::test]
    async fn test_best_evaluates_every_child() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = BestRouter::new()
            .add(simple(|| async {}))
            .add_boxed(counting(&calls))
            .add_optional(None);

        let route = router.get_route(ctx("x")).await.unwrap().unwrap();
        assert_eq!(route.score(), Route::DEFAULT_SCORE);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_best_ignores_nan() {
        let router = best(vec![
            scored(|| async { "nan" }, f64::NAN).boxed(),
            scored(|| async { "low" }, 0.1).boxed(),
        ]);
        let ctx = ctx("x");

        assert_eq!(run(&router, &ctx).await, vec!["low"]);

        let only_nan = best(vec![scored(|| async {}, f64::NAN).boxed()]);
        assert!(only_nan.get_route(ctx).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_paths_record_winning_index() {
        let router = first(vec![
            no_router(),
            best(vec![
                scored(|| async {}, 0.2).named("low").boxed(),
                scored(|| async {}, 0.8).named("high").boxed(),
            ])
            .boxed(),
        ]);

        let route = router.get_route(ctx("x")).await.unwrap().unwrap();
        assert_eq!(route.path(), Some(&vec!["first[1]/best[1]/high".to_string()]));

        // Untracked routes stay untracked.
        let untracked = first(vec![simple(|| async {}).boxed()]);
        let route = untracked.get_route(ctx("x")).await.unwrap().unwrap();
        assert!(route.path().is_none());
    }
}

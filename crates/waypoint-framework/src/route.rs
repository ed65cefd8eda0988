//! Routes: deferred units of work.
//!
//! A [`Route`] is what a router hands back when it matches. It carries the
//! action to run, a score used by [`BestRouter`](crate::aggregate::BestRouter),
//! and an optional diagnostic [`RoutePath`]. Nothing happens until the caller
//! awaits [`Route::action`].

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::path::RoutePath;
use waypoint_core::RouteResult;

/// The type-erased action of a route.
///
/// The action is a zero-argument closure; anything it needs (usually the
/// turn context) is captured when the route is created.
pub type RouteAction = Arc<dyn Fn() -> BoxFuture<'static, RouteResult<()>> + Send + Sync>;

/// A deferred, not-yet-executed unit of work produced by a successful match.
///
/// Cloning a route is cheap and shares the action.
#[derive(Clone)]
pub struct Route {
    action: RouteAction,
    score: f64,
    path: Option<RoutePath>,
}

impl Route {
    /// Score given to routes that were not scored explicitly.
    pub const DEFAULT_SCORE: f64 = 1.0;

    /// Creates a route from an async closure.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let ctx = Arc::clone(&ctx);
    /// let route = Route::new(move || {
    ///     let ctx = Arc::clone(&ctx);
    ///     async move {
    ///         ctx.reply("done");
    ///         Ok(())
    ///     }
    /// });
    /// ```
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RouteResult<()>> + Send + 'static,
    {
        Self::from_action(Arc::new(move || f().boxed()))
    }

    /// Creates a route from an already type-erased action.
    pub fn from_action(action: RouteAction) -> Self {
        Self {
            action,
            score: Self::DEFAULT_SCORE,
            path: None,
        }
    }

    /// Sets the score of this route.
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    /// Sets the diagnostic path of this route.
    pub fn with_path(mut self, path: Option<RoutePath>) -> Self {
        self.path = path;
        self
    }

    /// Returns the score of this route.
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Returns the diagnostic path, or `None` if the route is untracked.
    pub fn path(&self) -> Option<&RoutePath> {
        self.path.as_ref()
    }

    /// Rewrites the diagnostic path with `f`.
    pub fn map_path<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Option<RoutePath>) -> Option<RoutePath>,
    {
        self.path = f(self.path.take());
        self
    }

    /// Runs the deferred action.
    pub async fn action(&self) -> RouteResult<()> {
        (self.action)().await
    }

    /// Returns a handle to the action, for combinators that wrap it.
    pub(crate) fn action_fn(&self) -> RouteAction {
        Arc::clone(&self.action)
    }

    /// Keeps score and path but swaps the action.
    pub(crate) fn replace_action(mut self, action: RouteAction) -> Self {
        self.action = action;
        self
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("score", &self.score)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

//! Handler system for Waypoint.
//!
//! A handler is the user code a route runs. Handlers are plain async
//! functions whose parameters implement [`FromContext`], in the style of Axum:
//!
//! ```rust,ignore
//! async fn greet() -> &'static str {
//!     "Hello!"
//! }
//!
//! async fn echo(text: Text) -> String {
//!     format!("You said: {}", &*text)
//! }
//!
//! async fn audit(ctx: Arc<TurnContext>, token: CancellationToken) -> RouteResult<()> {
//!     ctx.ensure_active()?;
//!     Ok(())
//! }
//! ```
//!
//! The return value goes through [`HandlerResponse`]: strings become replies,
//! errors fail the route action.

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::extractor::FromContext;
use crate::route::{Route, RouteAction};
use waypoint_core::{BoxError, RouteError, RouteResult, TurnContext};

// ============================================================================
// Handler Trait
// ============================================================================

/// The core trait for route handlers.
///
/// Automatically implemented for async functions and closures that take
/// 0-4 parameters implementing [`FromContext`] and return a type
/// implementing [`HandlerResponse`].
pub trait Handler<T>: Clone + Send + Sync + 'static {
    /// Call the handler with the given context.
    fn call(self, ctx: Arc<TurnContext>) -> BoxFuture<'static, RouteResult<()>>;
}

/// A type-erased handler that can be stored in routers.
pub type BoxedHandler =
    Arc<dyn Fn(Arc<TurnContext>) -> BoxFuture<'static, RouteResult<()>> + Send + Sync>;

/// Convert a handler function into a boxed handler.
pub fn into_handler<H, T>(handler: H) -> BoxedHandler
where
    H: Handler<T>,
    T: 'static,
{
    Arc::new(move |ctx| handler.clone().call(ctx))
}

/// Builds a route that will run `handler` against `ctx`.
pub(crate) fn handler_route(handler: &BoxedHandler, ctx: Arc<TurnContext>) -> Route {
    let handler = Arc::clone(handler);
    let action: RouteAction = Arc::new(move || handler(Arc::clone(&ctx)));
    Route::from_action(action)
}

// ============================================================================
// HandlerResponse
// ============================================================================

/// A trait for types that can be returned from handlers.
pub trait HandlerResponse: Send + 'static {
    /// Apply the response to the turn, e.g. by writing a reply.
    fn into_route_result(self, ctx: &TurnContext) -> RouteResult<()>;
}

impl HandlerResponse for () {
    fn into_route_result(self, _ctx: &TurnContext) -> RouteResult<()> {
        Ok(())
    }
}

/// Sends the string as a reply.
impl HandlerResponse for String {
    fn into_route_result(self, ctx: &TurnContext) -> RouteResult<()> {
        ctx.reply(self);
        Ok(())
    }
}

impl HandlerResponse for &'static str {
    fn into_route_result(self, ctx: &TurnContext) -> RouteResult<()> {
        ctx.reply(self);
        Ok(())
    }
}

/// On `None`, nothing is sent.
impl<T: HandlerResponse> HandlerResponse for Option<T> {
    fn into_route_result(self, ctx: &TurnContext) -> RouteResult<()> {
        match self {
            Some(inner) => inner.into_route_result(ctx),
            None => Ok(()),
        }
    }
}

/// On `Err`, the route action fails.
///
/// A [`RouteError`] is passed through as-is; anything else is wrapped in
/// [`RouteError::Handler`].
impl<T, E> HandlerResponse for Result<T, E>
where
    T: HandlerResponse,
    E: Into<BoxError> + Send + 'static,
{
    fn into_route_result(self, ctx: &TurnContext) -> RouteResult<()> {
        match self {
            Ok(inner) => inner.into_route_result(ctx),
            Err(err) => {
                let err: BoxError = err.into();
                match err.downcast::<RouteError>() {
                    Ok(route_err) => Err(*route_err),
                    Err(other) => Err(RouteError::Handler(other)),
                }
            }
        }
    }
}

// ============================================================================
// Handler implementations for functions (Axum-style)
// ============================================================================

macro_rules! impl_handler {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case, unused_variables)]
        impl<F, Fut, Res, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Res> + Send + 'static,
            Res: HandlerResponse,
            $( $ty: FromContext + Send + 'static, )*
        {
            fn call(self, ctx: Arc<TurnContext>) -> BoxFuture<'static, RouteResult<()>> {
                async move {
                    $(
                        let $ty = $ty::from_context(&ctx)?;
                    )*

                    let response = (self)($($ty,)*).await;
                    response.into_route_result(&ctx)
                }
                .boxed()
            }
        }
    };
}

impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);

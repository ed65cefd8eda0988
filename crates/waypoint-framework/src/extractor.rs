//! Extractor system for Waypoint handlers.
//!
//! [`FromContext`] defines how a handler parameter is pulled out of the turn
//! context. Any type implementing it can appear in a handler's argument list.

use std::ops::Deref;
use std::sync::Arc;

use waypoint_core::{Activity, CancellationToken, ExtractError, ExtractResult, TurnContext};

/// A trait for types that can be extracted from a [`TurnContext`].
///
/// If extraction fails, the handler is not called and its route's action
/// fails with [`RouteError::Extract`](waypoint_core::RouteError::Extract).
/// Wrap a parameter in `Option<T>` to make it optional instead.
///
/// # Example
///
/// ```rust,ignore
/// use waypoint_framework::{FromContext, ExtractError, ExtractResult};
///
/// struct Topic(String);
///
/// impl FromContext for Topic {
///     fn from_context(ctx: &Arc<TurnContext>) -> ExtractResult<Self> {
///         ctx.require_state::<String>("topic").map(Topic)
///     }
/// }
/// ```
pub trait FromContext: Sized {
    /// Attempts to extract this type from the given context.
    fn from_context(ctx: &Arc<TurnContext>) -> ExtractResult<Self>;
}

/// The whole context, shared.
impl FromContext for Arc<TurnContext> {
    fn from_context(ctx: &Arc<TurnContext>) -> ExtractResult<Self> {
        Ok(Arc::clone(ctx))
    }
}

impl FromContext for Activity {
    fn from_context(ctx: &Arc<TurnContext>) -> ExtractResult<Self> {
        Ok(ctx.activity().clone())
    }
}

impl FromContext for CancellationToken {
    fn from_context(ctx: &Arc<TurnContext>) -> ExtractResult<Self> {
        Ok(ctx.cancellation().clone())
    }
}

/// Optional parameters never fail to extract.
impl<T: FromContext> FromContext for Option<T> {
    fn from_context(ctx: &Arc<TurnContext>) -> ExtractResult<Self> {
        Ok(T::from_context(ctx).ok())
    }
}

/// The text of the inbound activity.
///
/// Fails with [`ExtractError::MissingText`] if the activity has no text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text(pub String);

impl Text {
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Deref for Text {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromContext for Text {
    fn from_context(ctx: &Arc<TurnContext>) -> ExtractResult<Self> {
        ctx.text()
            .map(|text| Text(text.to_string()))
            .ok_or(ExtractError::MissingText)
    }
}

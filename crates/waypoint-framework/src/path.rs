//! Diagnostic route paths.
//!
//! A route path is an ordered list of segments recording which branches of a
//! router tree produced a route, e.g. `["first[1]/help"]`. Paths are for
//! tracing only; no routing decision ever depends on them.
//!
//! Three pure functions transform paths, and two wrappers attach them to a
//! router's output:
//!
//! | Function        | On `None` | On `[]`   | On `[a, b]`            |
//! |-----------------|-----------|-----------|------------------------|
//! | [`prefix_path`] | `None`    | `[]`      | `[p + a, p + b]`       |
//! | [`push_path`]   | `[s]`     | `[s]`     | `[a, b, s]`            |
//! | [`update_path`] | `None`    | `[]`      | `[s]`                  |
//!
//! [`Named`] pushes a segment onto every route its inner router produces;
//! [`Masked`] collapses the path to a single segment instead.

use std::sync::Arc;

use async_trait::async_trait;

use crate::route::Route;
use crate::router::Router;
use waypoint_core::{RouteResult, TurnContext};

/// An ordered list of diagnostic segments.
pub type RoutePath = Vec<String>;

/// Prepends `prefix` to every segment.
pub fn prefix_path(path: Option<RoutePath>, prefix: &str) -> Option<RoutePath> {
    path.map(|segments| {
        segments
            .into_iter()
            .map(|segment| format!("{prefix}{segment}"))
            .collect()
    })
}

/// Appends `segment`, starting a new path if there is none.
pub fn push_path(path: Option<RoutePath>, segment: &str) -> Option<RoutePath> {
    let mut segments = path.unwrap_or_default();
    segments.push(segment.to_string());
    Some(segments)
}

/// Replaces the whole trail with `[segment]`.
///
/// An absent or empty path is returned unchanged.
pub fn update_path(path: Option<RoutePath>, segment: &str) -> Option<RoutePath> {
    path.map(|segments| {
        if segments.is_empty() {
            segments
        } else {
            vec![segment.to_string()]
        }
    })
}

/// A router whose routes get `segment` pushed onto their path.
///
/// Created by [`RouterExt::named`](crate::router::RouterExt::named).
#[derive(Debug, Clone)]
pub struct Named<R> {
    inner: R,
    segment: Arc<str>,
}

impl<R> Named<R> {
    pub fn new(inner: R, segment: impl Into<String>) -> Self {
        Self {
            inner,
            segment: Arc::from(segment.into()),
        }
    }

    /// Returns the segment pushed onto matching routes.
    pub fn segment(&self) -> &str {
        &self.segment
    }
}

#[async_trait]
impl<R: Router> Router for Named<R> {
    async fn get_route(&self, ctx: Arc<TurnContext>) -> RouteResult<Option<Route>> {
        let route = self.inner.get_route(ctx).await?;
        Ok(route.map(|route| route.map_path(|path| push_path(path, &self.segment))))
    }
}

/// A router whose tracked routes get their path collapsed to `[segment]`.
///
/// Untracked routes stay untracked.
#[derive(Debug, Clone)]
pub struct Masked<R> {
    inner: R,
    segment: Arc<str>,
}

impl<R> Masked<R> {
    pub fn new(inner: R, segment: impl Into<String>) -> Self {
        Self {
            inner,
            segment: Arc::from(segment.into()),
        }
    }
}

#[async_trait]
impl<R: Router> Router for Masked<R> {
    async fn get_route(&self, ctx: Arc<TurnContext>) -> RouteResult<Option<Route>> {
        let route = self.inner.get_route(ctx).await?;
        Ok(route.map(|route| route.map_path(|path| update_path(path, &self.segment))))
    }
}

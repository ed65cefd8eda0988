//! Dialog registry.
//!
//! A [`DialogRegistry`] maps names to router trees so that one tree can hand
//! a turn to another by name. It is an ordinary value owned by the host
//! (the [`WaypointRuntime`](crate::WaypointRuntime) owns one); clones share
//! the same entries.
//!
//! ```rust,ignore
//! let dialogs = DialogRegistry::new();
//! dialogs.register("billing", billing_tree())?;
//!
//! let root = first(vec![
//!     if_true(|ctx| ctx.has_state("in_billing"), dialogs.dialog("billing")).boxed(),
//!     main_menu().boxed(),
//! ]);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::{RuntimeError, RuntimeResult};
use waypoint_core::{RouteError, RouteResult, TurnContext};
use waypoint_framework::{BoxedRouter, Route, Router, prefix_path};

/// Registry of named router trees.
#[derive(Clone, Default)]
pub struct DialogRegistry {
    dialogs: Arc<RwLock<HashMap<String, BoxedRouter>>>,
}

impl DialogRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a router under `name`.
    pub fn register<R: Router + 'static>(
        &self,
        name: impl Into<String>,
        router: R,
    ) -> RuntimeResult<()> {
        self.register_boxed(name, Arc::new(router))
    }

    /// Registers a pre-built boxed router under `name`.
    ///
    /// Fails with [`RuntimeError::DialogExists`] if the name is taken.
    pub fn register_boxed(
        &self,
        name: impl Into<String>,
        router: BoxedRouter,
    ) -> RuntimeResult<()> {
        let name = name.into();
        let mut dialogs = self.dialogs.write();

        if dialogs.contains_key(&name) {
            return Err(RuntimeError::DialogExists(name));
        }

        info!(dialog = %name, "Registered dialog");
        dialogs.insert(name, router);
        Ok(())
    }

    /// Looks up a dialog by name.
    pub fn find(&self, name: &str) -> Option<BoxedRouter> {
        self.dialogs.read().get(name).cloned()
    }

    /// Removes a dialog, returning its router.
    pub fn unregister(&self, name: &str) -> Option<BoxedRouter> {
        let removed = self.dialogs.write().remove(name);
        if removed.is_some() {
            debug!(dialog = %name, "Unregistered dialog");
        }
        removed
    }

    /// Removes every dialog.
    pub fn reset(&self) {
        self.dialogs.write().clear();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.dialogs.read().contains_key(name)
    }

    /// Returns all dialog names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.dialogs.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.dialogs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialogs.read().is_empty()
    }

    /// Returns a router that delegates to the dialog named `name`.
    ///
    /// The name is resolved on every match, so the dialog may be registered
    /// after the tree is built. An unknown name fails the match with
    /// [`RouteError::DialogNotFound`].
    pub fn dialog(&self, name: impl Into<String>) -> DialogRouter {
        DialogRouter {
            registry: self.clone(),
            name: name.into(),
        }
    }
}

impl std::fmt::Debug for DialogRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogRegistry")
            .field("dialogs", &self.names())
            .finish()
    }
}

/// A router resolving a dialog by name at match time.
#[derive(Clone, Debug)]
pub struct DialogRouter {
    registry: DialogRegistry,
    name: String,
}

impl DialogRouter {
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl Router for DialogRouter {
    async fn get_route(&self, ctx: Arc<TurnContext>) -> RouteResult<Option<Route>> {
        let router = self
            .registry
            .find(&self.name)
            .ok_or_else(|| RouteError::DialogNotFound {
                name: self.name.clone(),
            })?;

        let route = router.get_route(ctx).await?;
        let prefix = format!("dialog[{}]/", self.name);
        Ok(route.map(|route| route.map_path(|path| prefix_path(path, &prefix))))
    }
}

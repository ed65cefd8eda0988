//! Turn context for the Waypoint routing engine.
//!
//! A [`TurnContext`] is created by the host for every inbound activity and
//! shared as `Arc<TurnContext>` through both the match phase and the execute
//! phase. Routers only read from it; the actions of a chosen route may write
//! replies and state through it.
//!
//! # Thread Safety
//!
//! State and replies sit behind `parking_lot` mutexes so the context can be
//! captured by `Send` futures. The context is not meant to be routed by two
//! turns at once: one context is one turn.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use waypoint_core::{Activity, TurnContext};
//!
//! let ctx = Arc::new(TurnContext::new(Activity::message("help")));
//! ctx.set_state("topic", "billing")?;
//! ctx.reply("How can I help with billing?");
//! assert_eq!(ctx.replies().len(), 1);
//! ```

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::foundation::activity::Activity;
use crate::foundation::error::{ExtractError, ExtractResult, RouteError, RouteResult};

/// Keyed turn state, as carried between turns by the host.
pub type StateMap = HashMap<String, Value>;

/// The context object shared by routers and route actions during one turn.
pub struct TurnContext {
    /// The inbound activity being routed.
    activity: Activity,
    /// Keyed state readable by predicates and writable by actions.
    state: Mutex<StateMap>,
    /// Replies written by actions, in order.
    replies: Mutex<Vec<String>>,
    /// Cooperative cancellation for this turn.
    cancellation: CancellationToken,
}

impl TurnContext {
    /// Creates a context for the given activity with a fresh cancellation token.
    pub fn new(activity: Activity) -> Self {
        Self::with_cancellation(activity, CancellationToken::new())
    }

    /// Creates a context whose cancellation is driven by `token`.
    ///
    /// Hosts usually pass a child of a process-wide token so that shutting
    /// down cancels every in-flight turn.
    pub fn with_cancellation(activity: Activity, token: CancellationToken) -> Self {
        Self {
            activity,
            state: Mutex::new(HashMap::new()),
            replies: Mutex::new(Vec::new()),
            cancellation: token,
        }
    }

    /// Seeds the state, replacing any existing entries.
    ///
    /// Hosts use this to restore what earlier turns of the same conversation
    /// left behind.
    pub fn with_state(self, state: StateMap) -> Self {
        *self.state.lock() = state;
        self
    }

    /// Returns the inbound activity.
    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    /// Returns the activity text, if any.
    pub fn text(&self) -> Option<&str> {
        self.activity.text()
    }

    // ─── Replies ──────────────────────────────────────────────────────────────

    /// Appends a reply to the outbox.
    pub fn reply(&self, text: impl Into<String>) {
        self.replies.lock().push(text.into());
    }

    /// Returns a copy of the replies written so far.
    pub fn replies(&self) -> Vec<String> {
        self.replies.lock().clone()
    }

    /// Drains the outbox.
    pub fn take_replies(&self) -> Vec<String> {
        std::mem::take(&mut *self.replies.lock())
    }

    // ─── State ────────────────────────────────────────────────────────────────

    /// Stores `value` under `key`, replacing any previous entry.
    pub fn set_state<T: Serialize>(&self, key: impl Into<String>, value: T) -> ExtractResult<()> {
        let key = key.into();
        let value = serde_json::to_value(value).map_err(|e| ExtractError::InvalidState {
            key: key.clone(),
            reason: e.to_string(),
        })?;
        self.state.lock().insert(key, value);
        Ok(())
    }

    /// Reads the entry under `key`, converted to `T`.
    ///
    /// Returns `None` if the key is absent or holds a value of another shape.
    pub fn get_state<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.require_state(key).ok()
    }

    /// Reads the entry under `key`, failing if it is absent or malformed.
    pub fn require_state<T: DeserializeOwned>(&self, key: &str) -> ExtractResult<T> {
        let value = self
            .state_value(key)
            .ok_or_else(|| ExtractError::MissingState {
                key: key.to_string(),
            })?;
        serde_json::from_value(value).map_err(|e| ExtractError::InvalidState {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    /// Returns the raw JSON entry under `key`.
    pub fn state_value(&self, key: &str) -> Option<Value> {
        self.state.lock().get(key).cloned()
    }

    /// Returns `true` if an entry exists under `key`.
    pub fn has_state(&self, key: &str) -> bool {
        self.state.lock().contains_key(key)
    }

    /// Removes and returns the entry under `key`.
    pub fn remove_state(&self, key: &str) -> Option<Value> {
        self.state.lock().remove(key)
    }

    /// Returns a copy of every entry.
    pub fn state_snapshot(&self) -> StateMap {
        self.state.lock().clone()
    }

    // ─── Cancellation ─────────────────────────────────────────────────────────

    /// Returns the cancellation token for this turn.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Returns `true` once the turn has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Fails with [`RouteError::Cancelled`] if the turn has been cancelled.
    ///
    /// Long-running handlers call this between steps.
    pub fn ensure_active(&self) -> RouteResult<()> {
        if self.is_cancelled() {
            Err(RouteError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for TurnContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnContext")
            .field("activity", &self.activity)
            .field("state_keys", &self.state.lock().len())
            .field("replies", &self.replies.lock().len())
            .field("is_cancelled", &self.is_cancelled())
            .finish()
    }
}

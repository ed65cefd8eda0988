//! Conversation state carried between turns.
//!
//! Every turn gets a fresh [`TurnContext`](waypoint_core::TurnContext). The
//! [`ConversationStore`] keeps what a turn left in its state, keyed by
//! `Activity::conversation_id`, and the runtime seeds the next turn of the
//! same conversation from it.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use waypoint_core::StateMap;

/// In-memory state of every active conversation.
///
/// Clones share the same entries.
#[derive(Clone, Debug, Default)]
pub struct ConversationStore {
    conversations: Arc<RwLock<HashMap<String, StateMap>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the saved state of `conversation`, empty if there is none.
    pub fn load(&self, conversation: &str) -> StateMap {
        self.conversations
            .read()
            .get(conversation)
            .cloned()
            .unwrap_or_default()
    }

    /// Replaces the saved state of `conversation`.
    ///
    /// Saving an empty map forgets the conversation.
    pub fn save(&self, conversation: &str, state: StateMap) {
        let mut conversations = self.conversations.write();
        if state.is_empty() {
            conversations.remove(conversation);
        } else {
            trace!(conversation, keys = state.len(), "Saved conversation state");
            conversations.insert(conversation.to_string(), state);
        }
    }

    /// Drops the saved state of `conversation`, returning it.
    pub fn forget(&self, conversation: &str) -> Option<StateMap> {
        self.conversations.write().remove(conversation)
    }

    /// Drops every conversation.
    pub fn clear(&self) {
        self.conversations.write().clear();
    }

    pub fn contains(&self, conversation: &str) -> bool {
        self.conversations.read().contains_key(conversation)
    }

    pub fn len(&self) -> usize {
        self.conversations.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(key: &str, value: i64) -> StateMap {
        StateMap::from([(key.to_string(), value.into())])
    }

    #[test]
    fn test_save_and_load_per_conversation() {
        let store = ConversationStore::new();
        assert!(store.load("alice").is_empty());

        store.save("alice", state("step", 1));
        store.save("bob", state("step", 2));

        assert_eq!(store.load("alice"), state("step", 1));
        assert_eq!(store.clone().load("bob"), state("step", 2));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_empty_state_forgets_conversation() {
        let store = ConversationStore::new();
        store.save("alice", state("step", 1));
        store.save("alice", StateMap::new());
        assert!(!store.contains("alice"));

        store.save("bob", state("step", 2));
        assert_eq!(store.forget("bob"), Some(state("step", 2)));
        assert!(store.forget("bob").is_none());

        store.save("carol", state("step", 3));
        store.clear();
        assert!(store.is_empty());
    }
}

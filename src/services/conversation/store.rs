use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use super::state::{ConversationState, UserId};

/// Per-user conversation records. Only the conversation service writes here.
pub trait ConversationStore: Send + Sync {
    fn load(&self, user: UserId) -> Option<ConversationState>;
    fn put(&self, user: UserId, state: ConversationState);
    fn clear(&self, user: UserId);

    /// Absent records read as a fresh dialogue.
    fn get(&self, user: UserId) -> ConversationState {
        self.load(user).unwrap_or_default()
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    states: Mutex<HashMap<UserId, ConversationState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl ConversationStore for InMemoryStore {
    fn load(&self, user: UserId) -> Option<ConversationState> {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&user)
            .copied()
    }

    fn put(&self, user: UserId, state: ConversationState) {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user, state);
    }

    fn clear(&self, user: UserId) {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&user);
    }
}

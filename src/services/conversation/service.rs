use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use tracing::{debug, info};

use super::{
    machine::{step, StateChange},
    presentation::{render, RenderedMessage},
    state::UserId,
    store::ConversationStore,
};
use crate::services::market_data::fx_rates::RateProvider;

/// Runs conversation turns. Turns of one user are serialized so the state read
/// before the rate lookup is still current when the result is written back.
pub struct ConversationService {
    store: Arc<dyn ConversationStore>,
    rates: Arc<dyn RateProvider>,
    turn_locks: Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<()>>>>,
}

impl ConversationService {
    pub fn new(store: Arc<dyn ConversationStore>, rates: Arc<dyn RateProvider>) -> Self {
        ConversationService {
            store,
            rates,
            turn_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Handles one inbound message, returning the reply if there is one.
    pub async fn handle(&self, user: UserId, text: &str) -> Option<RenderedMessage> {
        let turn = TurnSlot::claim(self, user);
        let _held = turn.lock.lock().await;
        self.run_turn(user, text).await
    }

    async fn run_turn(&self, user: UserId, text: &str) -> Option<RenderedMessage> {
        let state = self.store.get(user);
        let transition = step(&state, text, self.rates.as_ref()).await;

        match transition.change {
            StateChange::Keep => {}
            StateChange::Set(next) => {
                debug!(
                    "User {} moved from {:?} to {:?} (base {:?}, target {:?})",
                    user,
                    state.phase(),
                    next.phase(),
                    next.base_currency(),
                    next.target_currency()
                );
                self.store.put(user, next);
            }
            StateChange::Clear => {
                info!("User {} restarted the dialogue", user);
                self.store.clear(user);
            }
        }

        transition.prompt.as_ref().map(render)
    }

    fn turn_lock(&self, user: UserId) -> Arc<tokio::sync::Mutex<()>> {
        self.turn_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(user)
            .or_default()
            .clone()
    }

    fn release_turn_lock(&self, user: UserId, turn_lock: &Arc<tokio::sync::Mutex<()>>) {
        let mut turn_locks = self
            .turn_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // the map and this turn hold the only references: nobody is queued behind us
        if Arc::strong_count(turn_lock) == 2 {
            turn_locks.remove(&user);
        }
    }

    #[cfg(test)]
    fn pending_turn_locks(&self) -> usize {
        self.turn_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// A user's place in the turn queue. Dropping it, also when the caller gives
/// up on the turn midway, removes the user's lock once nobody else waits on it.
struct TurnSlot<'a> {
    service: &'a ConversationService,
    user: UserId,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl<'a> TurnSlot<'a> {
    fn claim(service: &'a ConversationService, user: UserId) -> Self {
        TurnSlot {
            service,
            user,
            lock: service.turn_lock(user),
        }
    }
}

impl Drop for TurnSlot<'_> {
    fn drop(&mut self) {
        self.service.release_turn_lock(self.user, &self.lock);
    }
}

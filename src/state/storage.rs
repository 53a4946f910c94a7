//! State storage implementation
//!
//! This module keeps every chat's conversation state in process memory,
//! keyed by chat id. All access goes through short synchronous critical
//! sections, so two updates for the same chat can never interleave and no lock
//! is ever held across an `.await`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};
use super::context::ConversationState;

/// In-memory state storage keyed by chat id
#[derive(Clone, Default)]
pub struct StateStorage {
    states: Arc<Mutex<HashMap<i64, ConversationState>>>,
}

impl StateStorage {
    /// Create an empty state storage
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<i64, ConversationState>> {
        // A panic inside an update closure must not take every other chat down with it
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load a copy of a chat's state; chats without state (or with an expired form) are idle
    pub fn load_context(&self, chat_id: i64) -> ConversationState {
        let states = self.lock();
        match states.get(&chat_id) {
            Some(state) if !state.is_expired() => state.clone(),
            Some(_) => {
                debug!(chat_id = chat_id, "Stored state has expired, treating as idle");
                ConversationState::new(chat_id)
            }
            None => ConversationState::new(chat_id),
        }
    }

    /// Drop a chat's state, returning it to idle
    pub fn delete_context(&self, chat_id: i64) {
        if self.lock().remove(&chat_id).is_some() {
            debug!("Deleted state for chat {}", chat_id);
        } else {
            debug!("No state to delete for chat {}", chat_id);
        }
    }

    /// Check if a chat has a stored (non-idle) state
    pub fn context_exists(&self, chat_id: i64) -> bool {
        self.lock().contains_key(&chat_id)
    }

    /// Atomically read-modify-write a chat's state.
    ///
    /// Expired forms are reset before `f` sees them, and states left idle by
    /// `f` are removed from the map.
    pub fn update<R>(&self, chat_id: i64, f: impl FnOnce(&mut ConversationState) -> R) -> R {
        let mut states = self.lock();
        let state = states
            .entry(chat_id)
            .or_insert_with(|| ConversationState::new(chat_id));

        if state.is_expired() {
            debug!(chat_id = chat_id, flow = %state.flow, "Expired form discarded");
            state.reset();
        }

        let result = f(state);

        if state.is_idle() {
            states.remove(&chat_id);
        }
        result
    }

    /// Guard that resets the chat's state when dropped, on every exit path.
    ///
    /// The reset only applies while the chat is still on `generation`; a flow
    /// started from the menu in the meantime is left alone.
    pub fn reset_guard(&self, chat_id: i64, generation: u64) -> ResetGuard {
        ResetGuard {
            storage: self.clone(),
            chat_id,
            generation,
        }
    }

    /// Clean up expired states
    pub fn cleanup_expired_contexts(&self) -> u32 {
        let mut states = self.lock();
        let before = states.len();
        states.retain(|_, state| !state.is_expired());
        let cleaned_count = (before - states.len()) as u32;

        if cleaned_count > 0 {
            info!("Cleaned up {} expired conversation states", cleaned_count);
        }

        cleaned_count
    }

    /// Get storage statistics
    pub fn get_stats(&self) -> StorageStats {
        let states = self.lock();
        let mut flows_count = HashMap::new();
        let mut expired_contexts = 0;

        for state in states.values() {
            if state.is_expired() {
                expired_contexts += 1;
            } else {
                *flows_count.entry(state.flow.to_string()).or_insert(0) += 1;
            }
        }

        StorageStats {
            total_contexts: states.len(),
            active_contexts: states.len() - expired_contexts,
            expired_contexts,
            flows_count,
        }
    }
}

impl std::fmt::Debug for StateStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStorage")
            .field("chats", &self.lock().len())
            .finish_non_exhaustive()
    }
}

/// Resets one chat's state when dropped
#[must_use = "the state is reset as soon as the guard is dropped"]
pub struct ResetGuard {
    storage: StateStorage,
    chat_id: i64,
    generation: u64,
}

impl Drop for ResetGuard {
    fn drop(&mut self) {
        let mut states = self.storage.lock();
        let current_generation = states.get(&self.chat_id).map(|state| state.generation);
        match current_generation {
            Some(generation) if generation == self.generation => {
                states.remove(&self.chat_id);
                debug!(chat_id = self.chat_id, "State reset after dispatch");
            }
            Some(generation) => {
                debug!(
                    chat_id = self.chat_id,
                    generation = self.generation,
                    current_generation = generation,
                    "Newer flow started during dispatch, keeping it"
                );
            }
            None => {}
        }
    }
}

/// Storage statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct StorageStats {
    pub total_contexts: usize,
    pub active_contexts: usize,
    pub expired_contexts: usize,
    pub flows_count: HashMap<String, u32>,
}

/// State storage manager with automatic cleanup
#[derive(Debug)]
pub struct StateStorageManager {
    storage: StateStorage,
    cleanup_interval: Duration,
    cleanup_handle: Option<tokio::task::JoinHandle<()>>,
}

impl StateStorageManager {
    /// Create a new state storage manager with automatic cleanup
    pub fn new(storage: StateStorage, cleanup_interval: Duration) -> Self {
        Self {
            storage,
            cleanup_interval,
            cleanup_handle: None,
        }
    }

    /// Start automatic cleanup task
    pub fn start_cleanup(&mut self) {
        if self.cleanup_handle.is_some() {
            warn!("Cleanup task is already running");
            return;
        }

        let storage = self.storage.clone();
        let interval = self.cleanup_interval;

        let handle = tokio::spawn(async move {
            let mut cleanup_interval = tokio::time::interval(interval);

            loop {
                cleanup_interval.tick().await;

                let count = storage.cleanup_expired_contexts();
                if count > 0 {
                    info!("Cleanup task removed {} expired states", count);
                }

                let stats = storage.get_stats();
                debug!(
                    active = stats.active_contexts,
                    flows = ?stats.flows_count,
                    "Conversation state stats"
                );
            }
        });

        self.cleanup_handle = Some(handle);
        info!("Started automatic cleanup task with interval {:?}", self.cleanup_interval);
    }

    /// Stop automatic cleanup task
    pub fn stop_cleanup(&mut self) {
        if let Some(handle) = self.cleanup_handle.take() {
            handle.abort();
            info!("Stopped automatic cleanup task");
        }
    }
}

impl Drop for StateStorageManager {
    fn drop(&mut self) {
        self.stop_cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::context::{Flow, Step};

    fn active_state(chat_id: i64) -> ConversationState {
        let mut state = ConversationState::new(chat_id);
        state.start_flow(Flow::SetWebhook, Step::AwaitToken, chrono::Duration::hours(1));
        state
    }

    fn expired_state(chat_id: i64) -> ConversationState {
        let mut state = active_state(chat_id);
        state.expires_at = Some(chrono::Utc::now() - chrono::Duration::minutes(5));
        state
    }

    fn put(storage: &StateStorage, state: &ConversationState) {
        storage.update(state.chat_id, |s| *s = state.clone());
    }

    #[test]
    fn test_context_save_load() {
        let storage = StateStorage::new();
        let mut state = active_state(123);
        state.collected_token = Some("token".to_string());

        put(&storage, &state);

        let loaded = storage.load_context(123);
        assert_eq!(loaded, state);
        assert!(storage.context_exists(123));
        assert!(!storage.context_exists(456));
    }

    #[test]
    fn test_missing_context_is_idle() {
        let storage = StateStorage::new();
        assert!(storage.load_context(1).is_idle());
    }

    #[test]
    fn test_context_expiry() {
        let storage = StateStorage::new();
        put(&storage, &expired_state(456));

        assert!(storage.load_context(456).is_idle());
        let flow_seen = storage.update(456, |s| s.flow);
        assert_eq!(flow_seen, Flow::None);
        assert!(!storage.context_exists(456));
    }

    #[test]
    fn test_idle_states_are_not_kept() {
        let storage = StateStorage::new();
        put(&storage, &active_state(1));
        storage.update(1, |s| s.reset());
        assert!(!storage.context_exists(1));

        put(&storage, &ConversationState::new(2));
        assert!(!storage.context_exists(2));
    }

    #[test]
    fn test_context_deletion() {
        let storage = StateStorage::new();
        put(&storage, &active_state(789));
        assert!(storage.context_exists(789));

        storage.delete_context(789);
        assert!(!storage.context_exists(789));
    }

    #[test]
    fn test_chats_are_isolated() {
        let storage = StateStorage::new();
        put(&storage, &active_state(1));
        storage.update(2, |s| {
            s.start_flow(Flow::GetInfo, Step::AwaitToken, chrono::Duration::hours(1))
        });
        storage.delete_context(1);

        assert!(storage.load_context(2).is_at(Flow::GetInfo, Step::AwaitToken));
        assert!(!storage.context_exists(1));
    }

    #[test]
    fn test_reset_guard_resets_on_drop() {
        let storage = StateStorage::new();
        let state = active_state(10);
        put(&storage, &state);

        {
            let _guard = storage.reset_guard(10, state.generation);
            assert!(storage.context_exists(10));
        }

        assert!(!storage.context_exists(10));
    }

    #[test]
    fn test_reset_guard_runs_on_panic() {
        let storage = StateStorage::new();
        let state = active_state(11);
        put(&storage, &state);

        let cloned = storage.clone();
        let result = std::panic::catch_unwind(move || {
            let _guard = cloned.reset_guard(11, state.generation);
            panic!("dispatch failed");
        });

        assert!(result.is_err());
        assert!(!storage.context_exists(11));
    }

    #[test]
    fn test_reset_guard_keeps_newer_flow() {
        let storage = StateStorage::new();
        let state = active_state(12);
        put(&storage, &state);

        let guard = storage.reset_guard(12, state.generation);
        storage.update(12, |s| {
            s.start_flow(Flow::GetInfo, Step::AwaitToken, chrono::Duration::hours(1))
        });
        drop(guard);

        assert!(storage.load_context(12).is_at(Flow::GetInfo, Step::AwaitToken));
    }

    #[test]
    fn test_cleanup_and_stats() {
        let storage = StateStorage::new();
        put(&storage, &active_state(1));
        put(&storage, &expired_state(2));

        let stats = storage.get_stats();
        assert_eq!(stats.total_contexts, 2);
        assert_eq!(stats.expired_contexts, 1);
        assert_eq!(stats.flows_count.get("set_webhook"), Some(&1));

        assert_eq!(storage.cleanup_expired_contexts(), 1);
        assert!(storage.context_exists(1));
        assert!(!storage.context_exists(2));
    }

    #[tokio::test]
    async fn test_cleanup_task_lifecycle() {
        let storage = StateStorage::new();
        let mut manager = StateStorageManager::new(storage.clone(), Duration::from_millis(10));
        put(&storage, &expired_state(3));

        manager.start_cleanup();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!storage.context_exists(3));

        manager.stop_cleanup();
        put(&storage, &expired_state(4));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(storage.context_exists(4));
    }
}

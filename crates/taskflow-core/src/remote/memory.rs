//! In-process remote store used by tests and offline demos.
//!
//! Clones share state, so several engines built over clones of one store
//! behave like several devices talking to the same cloud database.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{RemoteError, RemoteEvent, RemoteResult, RemoteStore};
use crate::models::Snapshot;

struct Listener {
    user_id: String,
    key: String,
    events: mpsc::UnboundedSender<RemoteEvent>,
}

struct MemoryRemoteState {
    documents: HashMap<(String, String), Snapshot>,
    listeners: Vec<Listener>,
    reachable: bool,
    permission_denied: bool,
    write_count: usize,
}

/// Shared in-memory `RemoteStore`.
///
/// Like a real document database it overwrites on every write and leaves
/// version ordering to the sync engine.
#[derive(Clone)]
pub struct MemoryRemoteStore {
    state: Arc<Mutex<MemoryRemoteState>>,
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemoteStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryRemoteState {
                documents: HashMap::new(),
                listeners: Vec::new(),
                reachable: true,
                permission_denied: false,
                write_count: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryRemoteState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Simulate the network going down (`false`) or coming back (`true`).
    pub fn set_reachable(&self, reachable: bool) {
        self.lock().reachable = reachable;
    }

    /// Simulate access rules rejecting every request.
    pub fn set_permission_denied(&self, denied: bool) {
        self.lock().permission_denied = denied;
    }

    /// Current stored snapshot, bypassing reachability.
    #[must_use]
    pub fn document(&self, user_id: &str, key: &str) -> Option<Snapshot> {
        self.lock()
            .documents
            .get(&(user_id.to_string(), key.to_string()))
            .cloned()
    }

    /// Number of writes so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.lock().write_count
    }

    /// Number of live subscribers for a document.
    #[must_use]
    pub fn listener_count(&self, user_id: &str, key: &str) -> usize {
        let mut state = self.lock();
        state.listeners.retain(|listener| !listener.events.is_closed());
        state
            .listeners
            .iter()
            .filter(|listener| listener.user_id == user_id && listener.key == key)
            .count()
    }

    /// Break every subscription on a document with `error`.
    pub fn fail_subscriptions(&self, user_id: &str, key: &str, error: &RemoteError) {
        let mut state = self.lock();
        state.listeners.retain(|listener| {
            if listener.user_id == user_id && listener.key == key {
                let _ = listener.events.send(RemoteEvent::Failed(error.clone()));
                false
            } else {
                true
            }
        });
    }

    fn check_access(state: &MemoryRemoteState) -> RemoteResult<()> {
        if !state.reachable {
            return Err(RemoteError::Unavailable("network unreachable".to_string()));
        }
        if state.permission_denied {
            return Err(RemoteError::PermissionDenied(
                "missing or insufficient permissions".to_string(),
            ));
        }
        Ok(())
    }

    fn notify(state: &mut MemoryRemoteState, user_id: &str, key: &str, snapshot: &Snapshot) {
        state.listeners.retain(|listener| {
            if listener.user_id != user_id || listener.key != key {
                return !listener.events.is_closed();
            }
            listener
                .events
                .send(RemoteEvent::Changed(snapshot.clone()))
                .is_ok()
        });
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn get(&self, user_id: &str, key: &str) -> RemoteResult<Option<Snapshot>> {
        let state = self.lock();
        Self::check_access(&state)?;
        Ok(state
            .documents
            .get(&(user_id.to_string(), key.to_string()))
            .cloned())
    }

    async fn upsert_merge(
        &self,
        user_id: &str,
        key: &str,
        snapshot: &Snapshot,
    ) -> RemoteResult<()> {
        let mut state = self.lock();
        Self::check_access(&state)?;

        state
            .documents
            .insert((user_id.to_string(), key.to_string()), snapshot.clone());
        state.write_count += 1;
        Self::notify(&mut state, user_id, key, snapshot);
        Ok(())
    }

    async fn delete(&self, user_id: &str, key: &str) -> RemoteResult<()> {
        let mut state = self.lock();
        Self::check_access(&state)?;
        state
            .documents
            .remove(&(user_id.to_string(), key.to_string()));
        Ok(())
    }

    async fn subscribe(
        &self,
        user_id: &str,
        key: &str,
        events: mpsc::UnboundedSender<RemoteEvent>,
    ) -> RemoteResult<()> {
        let mut state = self.lock();
        Self::check_access(&state)?;

        // New listeners see the current document first
        if let Some(current) = state
            .documents
            .get(&(user_id.to_string(), key.to_string()))
        {
            let _ = events.send(RemoteEvent::Changed(current.clone()));
        }

        state.listeners.push(Listener {
            user_id: user_id.to_string(),
            key: key.to_string(),
            events,
        });
        Ok(())
    }
}

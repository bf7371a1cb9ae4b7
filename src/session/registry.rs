//! Registry of live sessions, keyed by room id.

use std::sync::Arc;

use crossbeam_skiplist::SkipMap;
use tokio::sync::Mutex;

use crate::session::state::Session;

/// Shared handle to one room's session. The mutex is held across the whole
/// read-rebase-commit-persist sequence of an edit.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Concurrent map from room id to session handle.
pub struct Registry {
    sessions: SkipMap<String, SessionHandle>,
    log_capacity: usize,
}

impl Registry {
    pub fn new(log_capacity: usize) -> Self {
        Registry {
            sessions: SkipMap::new(),
            log_capacity,
        }
    }

    /// Returns the room's handle, registering a cold session if needed.
    pub fn get_or_create(&self, room: &str) -> SessionHandle {
        if let Some(entry) = self.sessions.get(room) {
            return Arc::clone(entry.value());
        }
        let capacity = self.log_capacity;
        let entry = self
            .sessions
            .get_or_insert_with(room.to_string(), || Arc::new(Mutex::new(Session::new(capacity))));
        Arc::clone(entry.value())
    }

    pub fn get(&self, room: &str) -> Option<SessionHandle> {
        self.sessions.get(room).map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove(&self, room: &str) {
        self.sessions.remove(room);
    }

    /// Point-in-time copy of every registered room and its handle.
    pub fn snapshot(&self) -> Vec<(String, SessionHandle)> {
        self.sessions
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

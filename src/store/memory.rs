//! In-process store with lazy expiry.
//!
//! Values are kept as JSON envelopes `{"value": .., "expireAt": ms}` and
//! dropped on the first read after they expire.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::warn;

use crate::queue::Item;
use crate::store::{Envelope, Store, StoreError, storage_key};

/// Thread-safe map of serialized queues.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            entries: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulates the backend going away or coming back.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of keys currently held, expired or not.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store offline".to_string()))
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<Item>>, StoreError> {
        self.ensure_available()?;
        let key = storage_key(namespace, key);

        let Some(raw) = self.entries.read().get(&key).cloned() else {
            return Ok(None);
        };

        let stored: Envelope<Vec<Item>> = match serde_json::from_str(&raw) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(key = %key, "discarding undecodable stored value: {}", e);
                return Ok(None);
            }
        };

        if stored.is_expired() {
            self.entries.write().remove(&key);
            return Ok(None);
        }

        Ok(Some(stored.value))
    }

    async fn set(
        &self,
        namespace: &str,
        key: &str,
        items: &[Item],
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        self.ensure_available()?;

        let raw = serde_json::to_string(&Envelope::new(items, ttl))?;
        self.entries.write().insert(storage_key(namespace, key), raw);
        Ok(())
    }

    async fn remove(&self, namespace: &str, key: &str) -> Result<(), StoreError> {
        self.ensure_available()?;
        self.entries.write().remove(&storage_key(namespace, key));
        Ok(())
    }
}

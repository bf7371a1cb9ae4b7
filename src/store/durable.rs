//! On-disk store backed by sled.
//!
//! Each namespace is its own sled tree and each key holds the same JSON
//! envelope the in-memory store uses, so queues survive a restart and keep
//! their expiry.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::queue::Item;
use crate::store::{Envelope, Store, StoreError};

/// Durable store over a sled database.
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Opens (or creates) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = sled::Config::new()
            .path(path.as_ref())
            .mode(sled::Mode::HighThroughput)
            .open()?;

        info!(path = %path.as_ref().display(), "sled store opened");
        Ok(SledStore { db })
    }

    /// Wraps an already opened database.
    pub fn from_db(db: sled::Db) -> Self {
        SledStore { db }
    }

    /// Number of keys in `namespace`, expired or not.
    pub fn len(&self, namespace: &str) -> Result<usize, StoreError> {
        Ok(self.db.open_tree(namespace)?.len())
    }

    pub fn is_empty(&self, namespace: &str) -> Result<bool, StoreError> {
        Ok(self.db.open_tree(namespace)?.is_empty())
    }
}

#[async_trait]
impl Store for SledStore {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<Item>>, StoreError> {
        let tree = self.db.open_tree(namespace)?;
        let Some(raw) = tree.get(key.as_bytes())? else {
            return Ok(None);
        };

        let stored: Envelope<Vec<Item>> = match serde_json::from_slice(&raw) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(namespace, key, "discarding undecodable stored value: {}", e);
                return Ok(None);
            }
        };

        if stored.is_expired() {
            tree.remove(key.as_bytes())?;
            debug!(namespace, key, "expired value removed");
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
        let raw = serde_json::to_vec(&Envelope::new(items, ttl))?;
        let tree = self.db.open_tree(namespace)?;
        tree.insert(key.as_bytes(), raw)?;
        tree.flush()?;
        Ok(())
    }

    async fn remove(&self, namespace: &str, key: &str) -> Result<(), StoreError> {
        let tree = self.db.open_tree(namespace)?;
        tree.remove(key.as_bytes())?;
        tree.flush()?;
        Ok(())
    }
}

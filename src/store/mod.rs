//! Persistence of room queues.
//!
//! The session layer persists every committed queue through the [`Store`]
//! trait and reloads from it when a room is first touched. A store that is
//! unreachable never fails an edit; the caller logs and carries on in memory.

pub mod durable;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::queue::Item;

pub use durable::SledStore;
pub use memory::MemoryStore;

/// Namespace under which room queues are kept.
pub const ROOM_NAMESPACE: &str = "ktv_room";

#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend not connected or refusing requests
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("failed to encode stored value: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sled::Error),
}

/// Key-value store holding whole queues with a time to live.
#[async_trait]
pub trait Store: Send + Sync {
    /// Loads a queue. Missing and expired keys both yield `Ok(None)`.
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<Item>>, StoreError>;

    /// Stores a queue, replacing any previous value.
    async fn set(
        &self,
        namespace: &str,
        key: &str,
        items: &[Item],
        ttl: Option<Duration>,
    ) -> Result<(), StoreError>;

    async fn remove(&self, namespace: &str, key: &str) -> Result<(), StoreError>;
}

/// Flat key used by backends that have no namespaces of their own.
pub fn storage_key(namespace: &str, key: &str) -> String {
    format!("{namespace}_{key}")
}

/// Stored form of a value: `{"value": .., "expireAt": ms}`.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Envelope<T> {
    pub value: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<i64>,
}

impl<T> Envelope<T> {
    /// Wraps `value` so that it expires `ttl` from now.
    pub fn new(value: T, ttl: Option<Duration>) -> Self {
        let expire_at = ttl.map(|ttl| {
            Utc::now()
                .timestamp_millis()
                .saturating_add(i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX))
        });
        Envelope { value, expire_at }
    }

    pub fn is_expired(&self) -> bool {
        self.expire_at
            .is_some_and(|expire_at| Utc::now().timestamp_millis() > expire_at)
    }
}

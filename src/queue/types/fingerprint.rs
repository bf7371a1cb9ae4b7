//! Fingerprints of ordered queues.
//!
//! A fingerprint is a SHA-256 digest over every tracked field of every item,
//! in queue order. Clients echo the fingerprint of the state they last saw,
//! and the server treats equal fingerprints as equal queues.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::queue::types::item::Item;

/// Fingerprint of the empty queue.
pub const EMPTY_LIST_FINGERPRINT: &str = "EMPTY_LIST_HASH";

/// Opaque digest of a queue's content and order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Computes the fingerprint of `items`.
    ///
    /// Each field is length-prefixed before hashing so that no two distinct
    /// queues share an encoding, whatever characters titles or urls contain.
    pub fn of(items: &[Item]) -> Self {
        if items.is_empty() {
            return Fingerprint::empty();
        }

        let mut hasher = Sha256::new();
        for item in items {
            write_field(&mut hasher, &item.id);
            write_field(&mut hasher, &item.title);
            write_field(&mut hasher, &item.url);
            write_field(&mut hasher, item.state.as_str());
            match &item.added_by {
                Some(who) => {
                    hasher.update([1u8]);
                    write_field(&mut hasher, who);
                }
                None => hasher.update([0u8]),
            }
        }
        Fingerprint(hex::encode(hasher.finalize()))
    }

    /// The sentinel fingerprint of the empty queue.
    pub fn empty() -> Self {
        Fingerprint(EMPTY_LIST_FINGERPRINT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty_list(&self) -> bool {
        self.0 == EMPTY_LIST_FINGERPRINT
    }
}

fn write_field(hasher: &mut Sha256, field: &str) {
    hasher.update((field.len() as u64).to_le_bytes());
    hasher.update(field.as_bytes());
}

impl From<String> for Fingerprint {
    fn from(raw: String) -> Self {
        Fingerprint(raw)
    }
}

impl From<&str> for Fingerprint {
    fn from(raw: &str) -> Self {
        Fingerprint(raw.to_string())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

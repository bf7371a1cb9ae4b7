//! Queue item definition.
//!
//! An item is identified by its `id`; every other field is payload that
//! travels with the item wherever it ends up in the queue.

use serde::{Deserialize, Serialize};

/// Whether a song is still waiting to be performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    /// Waiting in the queue
    #[default]
    Queued,
    /// Already performed
    Sung,
}

impl ItemState {
    /// Wire name, also used when fingerprinting.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemState::Queued => "queued",
            ItemState::Sung => "sung",
        }
    }
}

/// A single entry in a room's song queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Unique within a list. May arrive empty when the link resolver is
    /// expected to supply it.
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub state: ItemState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_by: Option<String>,
}

impl Item {
    /// Creates a queued item with no submitter recorded.
    pub fn new(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Item {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            state: ItemState::Queued,
            added_by: None,
        }
    }

    /// Records who added the item.
    pub fn added_by(mut self, who: impl Into<String>) -> Self {
        self.added_by = Some(who.into());
        self
    }

    /// Returns a copy of this item with a different state.
    pub fn with_state(mut self, state: ItemState) -> Self {
        self.state = state;
        self
    }

    pub fn is_queued(&self) -> bool {
        self.state == ItemState::Queued
    }
}

/// Collects the ids of `items` in order.
pub fn id_order(items: &[Item]) -> Vec<String> {
    items.iter().map(|item| item.id.clone()).collect()
}

//! Errors raised while replaying edits onto a slot chain.

use thiserror::Error;

/// A structural inconsistency found during a rebase. The caller must treat
/// the edit as rejected; nothing has been committed when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RebaseError {
    /// A logged edit points past the end of its own base order.
    #[error("anchor index {index} for `{subject}` exceeds {available} remaining ids")]
    AnchorOutOfRange {
        subject: String,
        index: usize,
        available: usize,
    },

    /// A logged edit names an anchor id the chain never held.
    #[error("anchor `{0}` is not part of the chain")]
    UnknownAnchor(String),

    /// The anchor exists but was removed from the chain earlier in the replay.
    #[error("anchor for `{0}` is detached from the chain")]
    DetachedAnchor(String),

    /// The incoming edit targets a gap the base order does not have.
    #[error("slot {slot} out of range ({slots} slots)")]
    SlotOutOfRange { slot: usize, slots: usize },
}

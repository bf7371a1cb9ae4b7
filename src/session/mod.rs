//! Session coordination.
//!
//! Each room has one session holding its queue and operation log. The
//! [`Coordinator`] serializes access to a session, runs edits through the
//! rebase engine, persists committed queues and sweeps out stale state.

pub mod coordinator;
pub mod registry;
pub mod state;

use serde::Serialize;
use thiserror::Error;

use crate::queue::{Fingerprint, Item, RebaseError, Target};

pub use coordinator::{Coordinator, CoordinatorConfig, ListSnapshot, SweepReport};
pub use registry::{Registry, SessionHandle};
pub use state::{Phase, Session};

/// Why an edit was not applied.
#[derive(Debug, Error)]
pub enum EditError {
    /// The base fingerprint is neither current nor found in the log.
    /// The client has to fetch the queue again and resubmit.
    #[error("unknown base fingerprint {0}")]
    Conflict(Fingerprint),

    #[error("replay failed: {0}")]
    Replay(#[from] RebaseError),

    #[error("no queued item to advance")]
    NothingQueued,
}

/// A committed edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditOutcome {
    /// Fingerprint of the queue after the edit
    pub fingerprint: Fingerprint,
    /// The item as it was applied
    pub item: Item,
    /// Where the item ended up
    pub resolved: Target,
}

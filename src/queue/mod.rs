//! Song queue core.
//!
//! This module contains the rebase engine and everything it is built from:
//! the queue value types, the arena slot chain and the bounded operation log.

pub mod chain;
pub mod error;
pub mod node;
pub mod oplog;
pub mod rebase;
pub mod types;

// Re-export the main public API
pub use chain::SlotChain;
pub use error::RebaseError;
pub use node::{Node, NodeIndex, NodeKind};
pub use oplog::{DEFAULT_LOG_CAPACITY, LogEntry, OpLog};
pub use rebase::{Edit, RebaseOutcome, rebase};
pub use types::{EMPTY_LIST_FINGERPRINT, Fingerprint, Item, ItemState, Target, TargetError, id_order};

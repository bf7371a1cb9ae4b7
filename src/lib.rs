//! # songq - collaborative song queue
//!
//! A shared, ordered song queue that many clients edit at once without
//! locking each other out. Every edit carries the fingerprint of the queue
//! its author last saw; edits against an older queue are rebased across the
//! edits accepted since, instead of being refused.
//!
//! ## Features
//!
//! - **Optimistic concurrency**: clients never hold locks, stale edits are rebased
//! - **Deterministic replay**: logged edits are re-applied in timestamp order on a slot chain
//! - **Bounded history**: per-room operation logs are capped and expire by age
//! - **Best-effort collaborators**: store outages and link resolution failures never block an edit
//!
//! ## Example
//!
//! ```rust
//! use songq::{Edit, Fingerprint, Item, Target, rebase};
//!
//! let current = vec![Item::new("a", "A", ""), Item::new("b", "B", "")];
//! let base: Vec<String> = vec!["a".into(), "b".into()];
//! let edit = Edit::new(current[1].clone(), Target::Index(0));
//!
//! let outcome = rebase(&current, &base, &[], &edit).unwrap();
//! assert_eq!(outcome.items[0].id, "b");
//! assert_ne!(Fingerprint::of(&outcome.items), Fingerprint::of(&current));
//! ```

pub mod config;
pub mod queue;
pub mod resolve;
pub mod server;
pub mod session;
pub mod store;

// Re-export the main public API
pub use queue::{EMPTY_LIST_FINGERPRINT, Fingerprint, Item, ItemState, Target};
pub use queue::{Edit, LogEntry, OpLog, RebaseError, RebaseOutcome, rebase};
pub use session::{Coordinator, CoordinatorConfig, EditError, EditOutcome, Registry};
pub use store::{MemoryStore, SledStore, Store};

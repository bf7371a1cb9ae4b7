//! Type definitions for the song queue.
//!
//! This module contains the fundamental value types shared by the engine,
//! the session layer and the HTTP surface.

pub mod fingerprint;
pub mod item;
pub mod target;

pub use fingerprint::{EMPTY_LIST_FINGERPRINT, Fingerprint};
pub use item::{Item, ItemState, id_order};
pub use target::{Target, TargetError};

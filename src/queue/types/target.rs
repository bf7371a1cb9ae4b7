//! Edit target positions.
//!
//! On the wire a target is a plain integer: a non-negative position in the
//! resulting queue, or `-1` for "remove the item".

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where an edit wants its item to end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Target {
    /// Final position of the item after the edit
    Index(usize),
    /// Remove the item from the queue
    Delete,
}

/// Rejected wire value for a target index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid target index {0}: expected -1 or a non-negative position")]
pub struct TargetError(pub i64);

impl Target {
    pub fn is_delete(&self) -> bool {
        matches!(self, Target::Delete)
    }

    /// Position for inserts and moves, `None` for deletes.
    pub fn index(&self) -> Option<usize> {
        match self {
            Target::Index(index) => Some(*index),
            Target::Delete => None,
        }
    }
}

impl TryFrom<i64> for Target {
    type Error = TargetError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        match raw {
            -1 => Ok(Target::Delete),
            n if n >= 0 => usize::try_from(n)
                .map(Target::Index)
                .map_err(|_| TargetError(raw)),
            _ => Err(TargetError(raw)),
        }
    }
}

impl From<Target> for i64 {
    fn from(target: Target) -> Self {
        match target {
            Target::Index(index) => index as i64,
            Target::Delete => -1,
        }
    }
}

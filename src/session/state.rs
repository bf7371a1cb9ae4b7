//! Per-room session state.
//!
//! A session owns a room's current queue and its operation log. All of its
//! methods are synchronous and either fully apply an edit or leave the
//! session untouched; locking and persistence live in the coordinator.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::queue::{Edit, Fingerprint, Item, ItemState, LogEntry, OpLog, Target, id_order, rebase};
use crate::session::{EditError, EditOutcome};

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Not yet loaded from the store, or the last load failed. Edits are
    /// served from memory but never persisted until a load succeeds.
    Cold,
    /// Queue and log are held in memory
    Warm,
    /// Removed from the registry; holders must look the room up again
    Evicted,
}

#[derive(Debug)]
pub struct Session {
    phase: Phase,
    items: Vec<Item>,
    log: OpLog,
    /// Whether the store holds exactly `items`
    synced: bool,
}

impl Session {
    pub fn new(log_capacity: usize) -> Self {
        Session {
            phase: Phase::Cold,
            items: Vec::new(),
            log: OpLog::new(log_capacity),
            synced: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Makes the session warm with `items`, the queue the store holds.
    ///
    /// Log entries recorded against a different in-memory queue are dropped;
    /// clients holding those fingerprints have to fetch again.
    pub fn load(&mut self, items: Vec<Item>) {
        if items != self.items {
            self.log.clear();
        }
        self.items = items;
        self.phase = Phase::Warm;
        self.synced = true;
    }

    /// Makes the session warm with the queue it already holds, for a room
    /// the store has nothing for. Edits made while cold are kept.
    pub fn adopt(&mut self) {
        self.phase = Phase::Warm;
        self.synced = self.items.is_empty();
    }

    pub fn evict(&mut self) {
        self.phase = Phase::Evicted;
        self.items.clear();
        self.log.clear();
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn log(&self) -> &OpLog {
        &self.log
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    pub fn mark_synced(&mut self) {
        self.synced = true;
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(&self.items)
    }

    /// Applies `edit`, written against the queue whose fingerprint is `base`.
    ///
    /// When `base` is the current fingerprint the log is not consulted.
    /// Otherwise the newest log entry recorded against `base` is the origin
    /// and everything logged since is replayed first.
    pub fn apply(
        &mut self,
        base: &Fingerprint,
        edit: Edit,
        now: DateTime<Utc>,
    ) -> Result<EditOutcome, EditError> {
        let current = self.fingerprint();
        let current_order = id_order(&self.items);

        let outcome = if *base == current {
            debug!(item = %edit.item.id, "edit is against the latest queue");
            rebase(&self.items, &current_order, &[], &edit)?
        } else {
            let origin = self
                .log
                .find_rebase_origin(base)
                .ok_or_else(|| EditError::Conflict(base.clone()))?;
            let prior = self.log.entries_from(origin);
            let base_order = prior
                .first()
                .map(|entry| entry.base_order.clone())
                .unwrap_or_default();

            debug!(item = %edit.item.id, origin, replayed = prior.len(), "rebasing stale edit");
            rebase(&self.items, &base_order, &prior, &edit)?
        };

        let fingerprint = Fingerprint::of(&outcome.items);
        let timestamp = self.log.next_timestamp(now);
        self.log.append(LogEntry {
            base_order: current_order,
            base_fingerprint: current,
            item: edit.item.clone(),
            target: outcome.resolved,
            timestamp,
        });
        self.items = outcome.items;
        self.synced = false;

        Ok(EditOutcome {
            fingerprint,
            item: edit.item,
            resolved: outcome.resolved,
        })
    }

    /// The edit that marks the first queued item as sung and moves it to
    /// the end, or `None` when nothing is queued.
    pub fn advance_edit(&self) -> Option<Edit> {
        let next = self.items.iter().find(|item| item.is_queued())?;
        let item = next.clone().with_state(ItemState::Sung);
        Some(Edit::new(item, Target::Index(self.items.len() - 1)))
    }

    /// Shuffles the queued items, keeps sung ones in order after them and
    /// starts a fresh log. Returns the new fingerprint.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Fingerprint {
        let (mut queued, sung): (Vec<Item>, Vec<Item>) =
            self.items.drain(..).partition(Item::is_queued);
        queued.shuffle(rng);
        queued.extend(sung);

        self.items = queued;
        self.log.clear();
        self.synced = false;
        self.fingerprint()
    }

    /// Drops expired log entries. Returns how many went.
    pub fn sweep(&mut self, now: DateTime<Utc>, max_age: Duration) -> usize {
        self.log.sweep(now, max_age)
    }

    /// A warm session whose log has fully expired and whose queue is in the
    /// store can be dropped; the next access reloads it.
    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Warm && self.synced && self.log.is_empty()
    }
}

//! Per-room serialization point.
//!
//! Every operation on a room locks that room's session for its whole
//! duration, including the awaited store write, so two edits to the same
//! room never interleave. Different rooms proceed independently.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tokio::sync::OwnedMutexGuard;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::queue::{DEFAULT_LOG_CAPACITY, Edit, Fingerprint, Item};
use crate::session::registry::Registry;
use crate::session::state::{Phase, Session};
use crate::session::{EditError, EditOutcome};
use crate::store::{ROOM_NAMESPACE, Store};

/// Tunables of the session layer.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Maximum log entries per room
    pub log_capacity: usize,
    /// How long log entries are kept
    pub op_retention: Duration,
    /// Time to live of persisted queues; `None` keeps them forever
    pub store_ttl: Option<StdDuration>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        CoordinatorConfig {
            log_capacity: DEFAULT_LOG_CAPACITY,
            op_retention: Duration::minutes(5),
            store_ttl: Some(StdDuration::from_secs(24 * 60 * 60)),
        }
    }
}

/// Answer to a queue read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSnapshot {
    /// False when the client already holds the current queue
    pub changed: bool,
    /// Present only when `changed`
    pub list: Option<Vec<Item>>,
    pub fingerprint: Fingerprint,
}

/// What one sweep pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired_entries: usize,
    pub evicted_rooms: usize,
}

pub struct Coordinator {
    registry: Arc<Registry>,
    store: Arc<dyn Store>,
    config: CoordinatorConfig,
}

impl Coordinator {
    pub fn new(registry: Arc<Registry>, store: Arc<dyn Store>, config: CoordinatorConfig) -> Self {
        Coordinator {
            registry,
            store,
            config,
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the room's queue unless the client already has it.
    pub async fn read(&self, room: &str, client: Option<&Fingerprint>) -> ListSnapshot {
        let session = self.lock(room).await;
        let fingerprint = session.fingerprint();

        if client.is_some_and(|client| *client == fingerprint) {
            return ListSnapshot {
                changed: false,
                list: None,
                fingerprint,
            };
        }

        ListSnapshot {
            changed: true,
            list: Some(session.items().to_vec()),
            fingerprint,
        }
    }

    /// Applies an edit written against the queue fingerprinted `base`.
    pub async fn submit(
        &self,
        room: &str,
        base: &Fingerprint,
        edit: Edit,
    ) -> Result<EditOutcome, EditError> {
        let mut session = self.lock(room).await;
        debug!(room, base = %base, item = %edit.item.id, target = ?edit.target, "edit received");

        let outcome = session.apply(base, edit, Utc::now())?;
        debug!(room, fingerprint = %outcome.fingerprint, "edit committed");

        self.persist(room, &mut session).await;
        Ok(outcome)
    }

    /// Marks the next queued item as sung and moves it to the end.
    pub async fn advance(&self, room: &str) -> Result<EditOutcome, EditError> {
        let mut session = self.lock(room).await;
        let edit = session.advance_edit().ok_or(EditError::NothingQueued)?;
        let current = session.fingerprint();
        info!(room, item = %edit.item.id, "advancing queue");

        let outcome = session.apply(&current, edit, Utc::now())?;
        self.persist(room, &mut session).await;
        Ok(outcome)
    }

    /// Shuffles the queued items of a room and resets its log.
    pub async fn shuffle<R: Rng + Send>(&self, room: &str, rng: &mut R) -> Fingerprint {
        let mut session = self.lock(room).await;
        let fingerprint = session.shuffle(rng);
        info!(room, fingerprint = %fingerprint, "queue shuffled");

        self.persist(room, &mut session).await;
        fingerprint
    }

    /// Expires old log entries and evicts rooms that have gone idle.
    pub async fn sweep(&self, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();
        let max_age = self.config.op_retention;

        for (room, handle) in self.registry.snapshot() {
            let mut session = handle.lock().await;
            if session.phase() == Phase::Evicted {
                continue;
            }

            report.expired_entries += session.sweep(now, max_age);
            if session.is_idle() {
                session.evict();
                self.registry.remove(&room);
                report.evicted_rooms += 1;
                debug!(room = %room, "evicted idle session");
            }
        }
        report
    }

    /// Runs [`Coordinator::sweep`] every `every` until the task is aborted.
    pub fn spawn_sweeper(coordinator: Arc<Coordinator>, every: StdDuration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick fires immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let report = coordinator.sweep(Utc::now()).await;
                if report != SweepReport::default() {
                    info!(
                        expired = report.expired_entries,
                        evicted = report.evicted_rooms,
                        "swept operation logs"
                    );
                }
            }
        })
    }

    /// Locks the room's session, loading it from the store if it is cold.
    ///
    /// A failed load leaves the session cold: it keeps serving whatever it
    /// holds in memory and the load is retried on the next access.
    async fn lock(&self, room: &str) -> OwnedMutexGuard<Session> {
        loop {
            let handle = self.registry.get_or_create(room);
            let mut session = handle.lock_owned().await;

            match session.phase() {
                // Lost a race with the sweeper; the registry has moved on.
                Phase::Evicted => continue,
                Phase::Cold => self.load(room, &mut session).await,
                Phase::Warm => {}
            }
            return session;
        }
    }

    async fn load(&self, room: &str, session: &mut Session) {
        match self.store.get(ROOM_NAMESPACE, room).await {
            Ok(Some(items)) => {
                debug!(room, count = items.len(), "session warmed");
                session.load(items);
            }
            Ok(None) => {
                session.adopt();
                if !session.is_synced() {
                    self.persist(room, session).await;
                }
            }
            Err(e) => {
                warn!(room, "store read failed, serving from memory until it recovers: {}", e);
            }
        }
    }

    /// Writes a warm session's queue. Cold sessions are never written, so a
    /// queue that could not be loaded is never overwritten.
    async fn persist(&self, room: &str, session: &mut Session) {
        if session.phase() != Phase::Warm {
            debug!(room, "session not loaded, skipping persist");
            return;
        }
        match self
            .store
            .set(ROOM_NAMESPACE, room, session.items(), self.config.store_ttl)
            .await
        {
            Ok(()) => session.mark_synced(),
            Err(e) => warn!(room, "store write failed, keeping queue in memory only: {}", e),
        }
    }
}

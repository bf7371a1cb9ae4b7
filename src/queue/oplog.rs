//! Bounded operation log.
//!
//! Every accepted edit is recorded together with the queue it was applied
//! to. A client that edits against an older state is rebased across the
//! entries recorded since that state.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::queue::types::{Fingerprint, Item, Target};

/// Maximum number of entries kept per queue.
pub const DEFAULT_LOG_CAPACITY: usize = 50;

/// One accepted edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Item ids of the queue right before this edit was applied
    pub base_order: Vec<String>,
    /// Fingerprint of that queue
    pub base_fingerprint: Fingerprint,
    /// Post-edit payload of the edited item
    pub item: Item,
    /// Resolved final position of the item, or delete
    pub target: Target,
    pub timestamp: DateTime<Utc>,
}

/// Append-only log with FIFO eviction past `capacity`.
#[derive(Debug, Clone)]
pub struct OpLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl Default for OpLog {
    fn default() -> Self {
        OpLog::new(DEFAULT_LOG_CAPACITY)
    }
}

impl OpLog {
    /// Creates an empty log. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        OpLog {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Appends `entry`, returning the oldest entry if it had to be dropped.
    pub fn append(&mut self, entry: LogEntry) -> Option<LogEntry> {
        self.entries.push_back(entry);
        if self.entries.len() > self.capacity {
            self.entries.pop_front()
        } else {
            None
        }
    }

    /// Index of the newest entry whose base fingerprint is `fingerprint`.
    pub fn find_rebase_origin(&self, fingerprint: &Fingerprint) -> Option<usize> {
        self.entries
            .iter()
            .rposition(|entry| entry.base_fingerprint == *fingerprint)
    }

    /// The entries from `index` to the end, in log order.
    pub fn entries_from(&self, index: usize) -> Vec<LogEntry> {
        self.entries.range(index.min(self.entries.len())..).cloned().collect()
    }

    pub fn get(&self, index: usize) -> Option<&LogEntry> {
        self.entries.get(index)
    }

    /// Removes every entry at least `max_age` old. Returns how many went.
    pub fn sweep(&mut self, now: DateTime<Utc>, max_age: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| now - entry.timestamp < max_age);
        before - self.entries.len()
    }

    /// A timestamp for the next entry that never runs behind the last one,
    /// so log order and timestamp order always agree.
    pub fn next_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.entries.back() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(base: &str, id: &str, at: DateTime<Utc>) -> LogEntry {
        LogEntry {
            base_order: vec![],
            base_fingerprint: Fingerprint::from(base),
            item: Item::new(id, id, ""),
            target: Target::Index(0),
            timestamp: at,
        }
    }

    #[test]
    fn test_append_and_capacity() {
        let now = Utc::now();
        let mut log = OpLog::new(3);

        for i in 0..3 {
            assert!(log.append(entry("f", &i.to_string(), now)).is_none());
        }
        let dropped = log.append(entry("f", "3", now)).unwrap();

        assert_eq!(dropped.item.id, "0");
        assert_eq!(log.len(), 3);
        assert_eq!(log.get(0).unwrap().item.id, "1");
    }

    #[test]
    fn test_find_rebase_origin_prefers_newest() {
        let now = Utc::now();
        let mut log = OpLog::default();
        log.append(entry("f0", "a", now));
        log.append(entry("f1", "b", now));
        log.append(entry("f0", "c", now));
        log.append(entry("f2", "d", now));

        assert_eq!(log.find_rebase_origin(&"f0".into()), Some(2));
        assert_eq!(log.find_rebase_origin(&"f1".into()), Some(1));
        assert_eq!(log.find_rebase_origin(&"nope".into()), None);
    }

    #[test]
    fn test_entries_from_is_suffix() {
        let now = Utc::now();
        let mut log = OpLog::default();
        for id in ["a", "b", "c"] {
            log.append(entry("f", id, now));
        }

        let suffix: Vec<_> = log.entries_from(1).into_iter().map(|e| e.item.id).collect();
        assert_eq!(suffix, vec!["b", "c"]);
        assert!(log.entries_from(10).is_empty());
    }

    #[test]
    fn test_sweep_drops_old_entries() {
        let now = Utc::now();
        let mut log = OpLog::default();
        log.append(entry("f", "old", now - Duration::minutes(10)));
        log.append(entry("f", "edge", now - Duration::minutes(5)));
        log.append(entry("f", "new", now - Duration::seconds(30)));

        let removed = log.sweep(now, Duration::minutes(5));

        assert_eq!(removed, 2);
        assert_eq!(log.len(), 1);
        assert_eq!(log.get(0).unwrap().item.id, "new");
    }

    #[test]
    fn test_next_timestamp_is_monotonic() {
        let now = Utc::now();
        let mut log = OpLog::default();
        assert_eq!(log.next_timestamp(now), now);

        let ahead = now + Duration::seconds(2);
        log.append(entry("f", "a", ahead));
        assert_eq!(log.next_timestamp(now), ahead);
        assert_eq!(log.next_timestamp(ahead + Duration::seconds(1)), ahead + Duration::seconds(1));
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let mut log = OpLog::new(0);
        log.append(entry("f", "a", Utc::now()));
        assert_eq!(log.len(), 1);
        assert_eq!(log.capacity(), 1);
    }
}

//! Rebase engine.
//!
//! Turns an edit written against a possibly stale queue into its meaning
//! against the current queue, and produces the new authoritative order.
//!
//! # How it works
//!
//! A [`SlotChain`] is built from the base order the edit's author saw. Every
//! edit logged since that base is replayed onto the chain in timestamp order.
//! Logged edits never refer to chain positions: "index t" means "right after
//! the (t-1)th id of the edit's own base order, not counting the edited item",
//! which is exactly what it meant when it was first applied. The incoming edit
//! is then grafted in front of the slot its author aimed at, and the chain is
//! read back as a list.
//!
//! ```text
//! base [A, B, C]            0 A 1 B 2 C 3
//! logged: A -> index 2      0 1 B 2 C A 3      (after C)
//! incoming: B -> index 0    B 0 1 2 C A 3      (before slot 0)
//! result                    [B, C, A]
//! ```

use std::collections::HashMap;

use tracing::debug;

use crate::queue::chain::SlotChain;
use crate::queue::error::RebaseError;
use crate::queue::oplog::LogEntry;
use crate::queue::types::{Item, Target};

/// An edit as submitted by a client: put `item` at `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub item: Item,
    pub target: Target,
}

impl Edit {
    pub fn new(item: Item, target: Target) -> Self {
        Edit { item, target }
    }

    pub fn delete(item: Item) -> Self {
        Edit::new(item, Target::Delete)
    }
}

/// Result of a successful rebase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebaseOutcome {
    /// The new queue
    pub items: Vec<Item>,
    /// Where the edited item ended up, or `Delete` if it is gone
    pub resolved: Target,
}

/// Rebases `incoming` from `base_order` across `prior_ops`.
///
/// # Arguments
///
/// * `current_items` - Freshest payload of every known item, in any order
/// * `base_order` - Item ids as the incoming edit's author saw them
/// * `prior_ops` - Log entries accepted since that base
/// * `incoming` - The new edit, with its target relative to `base_order`
///
/// # Returns
///
/// * `Ok(RebaseOutcome)` - The new queue and the item's resolved index
/// * `Err(RebaseError)` - The log does not fit the base order
pub fn rebase(
    current_items: &[Item],
    base_order: &[String],
    prior_ops: &[LogEntry],
    incoming: &Edit,
) -> Result<RebaseOutcome, RebaseError> {
    let mut ordered: Vec<&LogEntry> = prior_ops.iter().collect();
    ordered.sort_by_key(|entry| entry.timestamp);

    let mut engine = Rebase::new(current_items, base_order);
    engine.merge_payloads(&ordered, incoming);
    for entry in &ordered {
        engine.replay(entry)?;
    }
    engine.graft(incoming)?;
    Ok(engine.linearize(&incoming.item.id))
}

/// Working state of a single rebase. Built and dropped per call.
struct Rebase<'a> {
    base_order: &'a [String],
    chain: SlotChain,
    payloads: HashMap<String, Item>,
}

impl<'a> Rebase<'a> {
    fn new(current_items: &[Item], base_order: &'a [String]) -> Self {
        let payloads = current_items
            .iter()
            .map(|item| (item.id.clone(), item.clone()))
            .collect();

        Rebase {
            base_order,
            chain: SlotChain::from_base(base_order),
            payloads,
        }
    }

    /// Overlays every edit's payload so the output carries the newest fields.
    /// Deletes carry no payload update.
    fn merge_payloads(&mut self, ordered: &[&LogEntry], incoming: &Edit) {
        let updates = ordered
            .iter()
            .map(|entry| (&entry.item, entry.target))
            .chain(std::iter::once((&incoming.item, incoming.target)));

        for (item, target) in updates {
            if !target.is_delete() {
                self.payloads.insert(item.id.clone(), item.clone());
            }
        }
    }

    /// Re-applies a logged edit using its own base order as the reference.
    fn replay(&mut self, entry: &LogEntry) -> Result<(), RebaseError> {
        let subject = entry.item.id.as_str();
        let index = match entry.target {
            Target::Delete => {
                self.chain.detach(subject);
                return Ok(());
            }
            Target::Index(index) => index,
        };

        let anchor = if index == 0 {
            self.chain.head()
        } else {
            let mut remaining = entry.base_order.iter().filter(|id| id.as_str() != subject);
            let anchor_id = remaining.nth(index - 1).ok_or_else(|| {
                RebaseError::AnchorOutOfRange {
                    subject: subject.to_string(),
                    index,
                    available: entry.base_order.iter().filter(|id| id.as_str() != subject).count(),
                }
            })?;
            self.chain
                .item_node(anchor_id)
                .ok_or_else(|| RebaseError::UnknownAnchor(anchor_id.clone()))?
        };

        debug!(subject, index, "replaying logged edit");
        self.chain.move_after(anchor, subject)
    }

    /// Places the incoming edit in front of the slot its author aimed at.
    fn graft(&mut self, incoming: &Edit) -> Result<(), RebaseError> {
        let subject = incoming.item.id.as_str();
        let index = match incoming.target {
            Target::Delete => {
                self.chain.detach(subject);
                return Ok(());
            }
            Target::Index(index) => index,
        };

        // Moving an item past its old position skips the slot it vacated.
        let slot = match self.base_order.iter().position(|id| id == subject) {
            Some(old) if index > old => index + 1,
            _ => index,
        };
        let slot_node = self.chain.slot(slot).ok_or(RebaseError::SlotOutOfRange {
            slot,
            slots: self.chain.slot_count(),
        })?;

        self.chain.move_before(slot_node, subject)
    }

    /// Reads the chain back as a queue, dropping ids with no payload.
    fn linearize(mut self, subject: &str) -> RebaseOutcome {
        let items: Vec<Item> = self
            .chain
            .item_ids()
            .filter_map(|id| self.payloads.remove(id))
            .collect();

        let resolved = items
            .iter()
            .position(|item| item.id == subject)
            .map_or(Target::Delete, Target::Index);

        RebaseOutcome { items, resolved }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::types::{Fingerprint, ItemState, id_order};
    use chrono::{Duration, Utc};

    fn items(ids: &[&str]) -> Vec<Item> {
        ids.iter().map(|id| Item::new(*id, format!("Song {id}"), "")).collect()
    }

    fn order(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn result_ids(outcome: &RebaseOutcome) -> Vec<&str> {
        outcome.items.iter().map(|item| item.id.as_str()).collect()
    }

    fn logged(base: &[&str], id: &str, target: Target, offset_ms: i64) -> LogEntry {
        LogEntry {
            base_order: order(base),
            base_fingerprint: Fingerprint::of(&items(base)),
            item: Item::new(id, format!("Song {id}"), ""),
            target,
            timestamp: Utc::now() + Duration::milliseconds(offset_ms),
        }
    }

    #[test]
    fn test_move_to_front_without_history() {
        let current = items(&["a", "b", "c"]);
        let edit = Edit::new(current[2].clone(), Target::Index(0));

        let outcome = rebase(&current, &order(&["a", "b", "c"]), &[], &edit).unwrap();

        assert_eq!(result_ids(&outcome), vec!["c", "a", "b"]);
        assert_eq!(outcome.resolved, Target::Index(0));
    }

    #[test]
    fn test_move_forward_consumes_own_slot() {
        let current = items(&["a", "b", "c"]);
        let edit = Edit::new(current[0].clone(), Target::Index(2));

        let outcome = rebase(&current, &order(&["a", "b", "c"]), &[], &edit).unwrap();

        assert_eq!(result_ids(&outcome), vec!["b", "c", "a"]);
        assert_eq!(outcome.resolved, Target::Index(2));
    }

    #[test]
    fn test_move_in_place_is_identity() {
        let current = items(&["a", "b", "c"]);
        let edit = Edit::new(current[1].clone(), Target::Index(1));

        let outcome = rebase(&current, &order(&["a", "b", "c"]), &[], &edit).unwrap();
        assert_eq!(result_ids(&outcome), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_insert_new_item() {
        let current = items(&["a", "b"]);
        let edit = Edit::new(Item::new("n", "New", ""), Target::Index(1));

        let outcome = rebase(&current, &order(&["a", "b"]), &[], &edit).unwrap();

        assert_eq!(result_ids(&outcome), vec!["a", "n", "b"]);
        assert_eq!(outcome.resolved, Target::Index(1));
    }

    #[test]
    fn test_append_at_end() {
        let current = items(&["a", "b"]);
        let edit = Edit::new(Item::new("n", "New", ""), Target::Index(2));

        let outcome = rebase(&current, &order(&["a", "b"]), &[], &edit).unwrap();
        assert_eq!(result_ids(&outcome), vec!["a", "b", "n"]);
    }

    #[test]
    fn test_delete_resolves_to_delete() {
        let current = items(&["a", "b", "c"]);
        let edit = Edit::delete(current[1].clone());

        let outcome = rebase(&current, &order(&["a", "b", "c"]), &[], &edit).unwrap();

        assert_eq!(result_ids(&outcome), vec!["a", "c"]);
        assert_eq!(outcome.resolved, Target::Delete);
    }

    #[test]
    fn test_stale_move_across_logged_move() {
        // Current state after A -> 2 was accepted.
        let current = items(&["b", "c", "a"]);
        let prior = vec![logged(&["a", "b", "c"], "a", Target::Index(2), 0)];
        let edit = Edit::new(Item::new("b", "Song b", ""), Target::Index(0));

        let outcome = rebase(&current, &order(&["a", "b", "c"]), &prior, &edit).unwrap();

        assert_eq!(result_ids(&outcome), vec!["b", "c", "a"]);
        assert_eq!(outcome.resolved, Target::Index(0));
    }

    #[test]
    fn test_insert_after_concurrent_delete() {
        let current = items(&["b", "c"]);
        let prior = vec![logged(&["a", "b", "c"], "a", Target::Delete, 0)];
        let edit = Edit::new(Item::new("d", "Song d", ""), Target::Index(1));

        let outcome = rebase(&current, &order(&["a", "b", "c"]), &prior, &edit).unwrap();

        assert_eq!(result_ids(&outcome), vec!["d", "b", "c"]);
        assert_eq!(outcome.resolved, Target::Index(0));
    }

    #[test]
    fn test_prior_ops_are_replayed_in_timestamp_order() {
        // Accepted in this order: D -> 2 on [a b c d], then e appended.
        let first = logged(&["a", "b", "c", "d"], "d", Target::Index(2), 0);
        let second = logged(&["a", "b", "d", "c"], "e", Target::Index(4), 5);
        let current = items(&["a", "b", "d", "c", "e"]);
        let edit = Edit::new(Item::new("x", "Song x", ""), Target::Index(4));

        let in_order = rebase(
            &current,
            &order(&["a", "b", "c", "d"]),
            &[first.clone(), second.clone()],
            &edit,
        )
        .unwrap();
        let shuffled =
            rebase(&current, &order(&["a", "b", "c", "d"]), &[second, first], &edit).unwrap();

        assert_eq!(in_order, shuffled);
        assert_eq!(result_ids(&in_order), vec!["a", "b", "d", "c", "e", "x"]);
    }

    #[test]
    fn test_payloads_take_newest_fields() {
        let current = items(&["a", "b"]);
        let sung = Item::new("a", "Song a", "").with_state(ItemState::Sung);
        let edit = Edit::new(sung, Target::Index(1));

        let outcome = rebase(&current, &order(&["a", "b"]), &[], &edit).unwrap();

        assert_eq!(result_ids(&outcome), vec!["b", "a"]);
        assert_eq!(outcome.items[1].state, ItemState::Sung);
    }

    #[test]
    fn test_slot_out_of_range() {
        let current = items(&["a", "b"]);
        let edit = Edit::new(current[0].clone(), Target::Index(2));

        let err = rebase(&current, &order(&["a", "b"]), &[], &edit).unwrap_err();
        assert_eq!(err, RebaseError::SlotOutOfRange { slot: 3, slots: 3 });
    }

    #[test]
    fn test_logged_anchor_out_of_range() {
        let current = items(&["a", "b"]);
        let prior = vec![logged(&["a", "b"], "a", Target::Index(5), 0)];
        let edit = Edit::new(Item::new("n", "", ""), Target::Index(0));

        let err = rebase(&current, &order(&["a", "b"]), &prior, &edit).unwrap_err();
        assert!(matches!(err, RebaseError::AnchorOutOfRange { index: 5, available: 1, .. }));
    }

    #[test]
    fn test_logged_anchor_unknown() {
        let current = items(&["a", "b"]);
        let prior = vec![logged(&["q", "b"], "b", Target::Index(1), 0)];
        let edit = Edit::new(Item::new("n", "", ""), Target::Index(0));

        let err = rebase(&current, &order(&["a", "b"]), &prior, &edit).unwrap_err();
        assert_eq!(err, RebaseError::UnknownAnchor("q".into()));
    }

    #[test]
    fn test_rebase_is_deterministic() {
        let current = items(&["c", "a", "b"]);
        let prior = vec![logged(&["a", "b", "c"], "c", Target::Index(0), 0)];
        let edit = Edit::new(Item::new("b", "Song b", ""), Target::Index(0));
        let base = order(&["a", "b", "c"]);

        let first = rebase(&current, &base, &prior, &edit).unwrap();
        for _ in 0..10 {
            assert_eq!(rebase(&current, &base, &prior, &edit).unwrap(), first);
        }
        assert_eq!(id_order(&first.items).len(), 3);
    }
}

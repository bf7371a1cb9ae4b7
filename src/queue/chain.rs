//! Arena-backed slot chain.
//!
//! Built from a base order as
//!
//! ```text
//! HEAD, slot0, item0, slot1, item1, ..., itemN-1, slotN
//! ```
//!
//! Slots stay where they were placed; items move around them. A slot number
//! therefore keeps meaning "the gap that was position k in the base order"
//! no matter how many items have been moved or removed since.

use std::collections::HashMap;

use crate::queue::error::RebaseError;
use crate::queue::node::{Node, NodeIndex};

const HEAD: NodeIndex = 0;

/// Doubly linked chain of slots and items stored in a `Vec` arena.
#[derive(Debug, Clone)]
pub struct SlotChain {
    nodes: Vec<Node>,
    /// Slot number -> arena index
    slots: Vec<NodeIndex>,
    /// Item id -> arena index, including detached items
    items: HashMap<String, NodeIndex>,
}

impl SlotChain {
    /// Builds the chain for `base_order`, with `base_order.len() + 1` slots.
    pub fn from_base(base_order: &[String]) -> Self {
        let mut chain = SlotChain {
            nodes: Vec::with_capacity(2 * base_order.len() + 2),
            slots: Vec::with_capacity(base_order.len() + 1),
            items: HashMap::with_capacity(base_order.len()),
        };
        chain.nodes.push(Node::head());

        let mut tail = HEAD;
        for (k, id) in base_order.iter().enumerate() {
            let slot = chain.push(Node::slot(k));
            chain.slots.push(slot);
            chain.link_after(tail, slot);

            let item = chain.push(Node::item(id.clone()));
            chain.items.insert(id.clone(), item);
            chain.link_after(slot, item);
            tail = item;
        }

        let last = chain.push(Node::slot(base_order.len()));
        chain.slots.push(last);
        chain.link_after(tail, last);
        chain
    }

    pub fn head(&self) -> NodeIndex {
        HEAD
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Arena index of slot `k`.
    pub fn slot(&self, k: usize) -> Option<NodeIndex> {
        self.slots.get(k).copied()
    }

    /// Arena index of the item node for `id`, linked or not.
    pub fn item_node(&self, id: &str) -> Option<NodeIndex> {
        self.items.get(id).copied()
    }

    /// Whether `id` is currently part of the chain.
    pub fn contains(&self, id: &str) -> bool {
        self.item_node(id)
            .is_some_and(|index| self.nodes[index].is_linked())
    }

    /// Unlinks `id` from the chain. Returns false if it was not linked.
    pub fn detach(&mut self, id: &str) -> bool {
        match self.item_node(id) {
            Some(index) => self.unlink(index),
            None => false,
        }
    }

    /// Moves `id` to sit directly after `anchor`, creating it if needed.
    pub fn move_after(&mut self, anchor: NodeIndex, id: &str) -> Result<(), RebaseError> {
        let node = self.ensure_item(id);
        self.unlink(node);
        if !self.nodes[anchor].is_linked() {
            return Err(RebaseError::DetachedAnchor(id.to_string()));
        }
        self.link_after(anchor, node);
        Ok(())
    }

    /// Moves `id` to sit directly before `target`, creating it if needed.
    pub fn move_before(&mut self, target: NodeIndex, id: &str) -> Result<(), RebaseError> {
        let node = self.ensure_item(id);
        self.unlink(node);
        match self.nodes[target].prev {
            Some(prev) => {
                self.link_after(prev, node);
                Ok(())
            }
            None => Err(RebaseError::DetachedAnchor(id.to_string())),
        }
    }

    /// Item ids in chain order, skipping the head and every slot.
    pub fn item_ids(&self) -> impl Iterator<Item = &str> + '_ {
        std::iter::successors(self.nodes[HEAD].next, move |&index| self.nodes[index].next)
            .filter_map(move |index| self.nodes[index].item_id())
    }

    fn push(&mut self, node: Node) -> NodeIndex {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn ensure_item(&mut self, id: &str) -> NodeIndex {
        if let Some(index) = self.item_node(id) {
            return index;
        }
        let index = self.push(Node::item(id));
        self.items.insert(id.to_string(), index);
        index
    }

    fn link_after(&mut self, anchor: NodeIndex, node: NodeIndex) {
        let next = self.nodes[anchor].next;
        self.nodes[node].prev = Some(anchor);
        self.nodes[node].next = next;
        self.nodes[anchor].next = Some(node);
        if let Some(next) = next {
            self.nodes[next].prev = Some(node);
        }
    }

    fn unlink(&mut self, node: NodeIndex) -> bool {
        let Some(prev) = self.nodes[node].prev else {
            return false;
        };
        let next = self.nodes[node].next;
        self.nodes[prev].next = next;
        if let Some(next) = next {
            self.nodes[next].prev = Some(prev);
        }
        self.nodes[node].prev = None;
        self.nodes[node].next = None;
        true
    }
}

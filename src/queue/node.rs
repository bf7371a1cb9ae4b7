//! Node definition for the slot chain.
//!
//! The chain used during a rebase holds three kinds of nodes: a single head
//! sentinel, numbered slot markers, and queue items. Nodes live in an arena
//! and refer to their neighbours by index.

/// Position of a node inside the chain's arena.
pub type NodeIndex = usize;

/// What a chain node stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Fixed anchor in front of slot 0. Never detached.
    Head,
    /// The gap that was position `k` of the base order.
    Slot(usize),
    /// A queue item, by id.
    Item(String),
}

/// A single node of the doubly linked slot chain.
///
/// A detached node keeps its arena entry but has neither neighbour, so it
/// can be relinked later without reallocating.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub prev: Option<NodeIndex>,
    pub next: Option<NodeIndex>,
}

impl Node {
    /// Creates an unlinked node.
    pub fn new(kind: NodeKind) -> Self {
        Node {
            kind,
            prev: None,
            next: None,
        }
    }

    /// Creates the head sentinel.
    pub fn head() -> Self {
        Node::new(NodeKind::Head)
    }

    pub fn slot(k: usize) -> Self {
        Node::new(NodeKind::Slot(k))
    }

    pub fn item(id: impl Into<String>) -> Self {
        Node::new(NodeKind::Item(id.into()))
    }

    pub fn is_sentinel(&self) -> bool {
        self.kind == NodeKind::Head
    }

    /// Returns the item id if this node carries one.
    pub fn item_id(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Item(id) => Some(id),
            _ => None,
        }
    }

    /// Every linked node other than the head has a predecessor.
    pub fn is_linked(&self) -> bool {
        self.is_sentinel() || self.prev.is_some()
    }
}

//! Core in-memory data structures, wrapped in `Arc<Mutex<>>` by the caller.

use crate::domain::{FailureEvent, Node, NodeId};
use crate::error::{Error, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Node and edge storage (not thread-safe).
///
/// Invariant: every key of `nodes` has an entry in `node_map`, and every
/// graph node weight is the ID it is mapped from.
pub(crate) struct GraphStoreInner {
    /// Nodes indexed by ID
    pub(super) nodes: HashMap<NodeId, Node>,

    /// Dependency graph. Edge direction: source (child) -> target (parent).
    pub(super) graph: DiGraph<NodeId, ()>,

    /// NodeId -> graph index
    pub(super) node_map: HashMap<NodeId, NodeIndex>,

    /// Next identifier to hand out; never decreases
    next_id: u64,
}

impl GraphStoreInner {
    pub(crate) fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            graph: DiGraph::new(),
            node_map: HashMap::new(),
            next_id: 1,
        }
    }

    pub(super) fn allocate_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Insert a node under its own ID, keeping the ID counter ahead of it.
    ///
    /// Returns `false` (and changes nothing) if the ID is already taken.
    pub(super) fn insert_node(&mut self, node: Node) -> bool {
        if self.nodes.contains_key(&node.id) {
            return false;
        }
        self.reserve_through(node.id);
        let index = self.graph.add_node(node.id);
        self.node_map.insert(node.id, index);
        self.nodes.insert(node.id, node);
        true
    }

    /// Never hand out `id` or anything below it.
    pub(super) fn reserve_through(&mut self, id: NodeId) {
        self.next_id = self.next_id.max(id.get() + 1);
    }

    pub(super) fn index_of(&self, id: NodeId) -> Result<NodeIndex> {
        self.node_map
            .get(&id)
            .copied()
            .ok_or(Error::NodeNotFound(id))
    }

    /// Add `child -> parent` unless it already exists.
    pub(super) fn add_edge(&mut self, child: NodeId, parent: NodeId) -> Result<bool> {
        let from = self.index_of(child)?;
        let to = self.index_of(parent)?;
        if self.graph.find_edge(from, to).is_some() {
            return Ok(false);
        }
        self.graph.add_edge(from, to, ());
        Ok(true)
    }

    pub(super) fn clear(&mut self) {
        self.nodes.clear();
        self.graph.clear();
        self.node_map.clear();
    }
}

/// Event storage (not thread-safe).
#[derive(Default)]
pub(crate) struct LedgerInner {
    pub(super) events: Vec<FailureEvent>,
}

impl LedgerInner {
    /// Append, clamping the timestamp so order and time agree.
    pub(super) fn push(&mut self, mut event: FailureEvent) {
        if let Some(last) = self.events.last() {
            if event.timestamp < last.timestamp {
                event.timestamp = last.timestamp;
            }
        }
        self.events.push(event);
    }
}

//! In-memory storage backend using HashMap and petgraph.
//!
//! All data is held in RAM and **lost when the process exits** unless the
//! store is wrapped by the JSONL backend (see [`crate::storage::create_graph_store`])
//! or saved explicitly with [`save_graph_to_jsonl`].
//!
//! # Architecture
//!
//! The graph store uses:
//! - `HashMap<NodeId, Node>` for O(1) node lookups
//! - `petgraph::DiGraph<NodeId, ()>` for dependency edges
//! - `HashMap<NodeId, NodeIndex>` for mapping nodes to graph indices
//! - a monotonically increasing counter for node IDs
//!
//! The ledger is a `Vec<FailureEvent>` in insertion order.
//!
//! ## Edge Direction Convention
//!
//! Edges point from **child to parent**, the same way a [`Dependency`] reads:
//!
//! - **Edge source**: the dependent node (fails when the parent fails)
//! - **Edge target**: the node being depended upon
//!
//! So "who fails if X fails" is the set of *incoming* edges of X. For
//! example, if the Berlin plant depends on the power grid, the edge is
//! `plant -> grid`, and `list_children_of(grid)` returns the plant.
//!
//! Cycles and self-loops are stored as given. Graph walks in this module
//! track visited nodes, and the propagation engine does the same.
//!
//! # Thread Safety
//!
//! Both stores are wrapped in `Arc<Mutex<_>>` (tokio mutex), so every trait
//! call runs under the lock.
//!
//! [`Dependency`]: crate::domain::Dependency

mod graph;
mod inner;
mod jsonl;
mod ledger;
mod trait_impl;

use crate::storage::{EventLedger, GraphStore};
use inner::{GraphStoreInner, LedgerInner};
use std::sync::Arc;
use tokio::sync::Mutex;

// Re-export public API
pub use jsonl::{
    append_events_to_jsonl, load_graph_from_jsonl, load_ledger_from_jsonl, save_graph_to_jsonl,
    LoadWarning,
};
pub use ledger::aggregate_events;

/// Thread-safe in-memory graph store.
pub(crate) type InMemoryGraphStore = Arc<Mutex<GraphStoreInner>>;

/// Thread-safe in-memory event ledger.
pub(crate) type InMemoryLedger = Arc<Mutex<LedgerInner>>;

/// Create a new, empty in-memory graph store.
///
/// # Example
///
/// ```
/// use faultline::storage::in_memory::new_in_memory_graph_store;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let store = new_in_memory_graph_store();
///     assert!(store.list_all().await.unwrap().is_empty());
/// }
/// ```
#[must_use]
pub fn new_in_memory_graph_store() -> Box<dyn GraphStore> {
    Box::new(Arc::new(Mutex::new(GraphStoreInner::new())))
}

/// Create a new, empty in-memory event ledger.
#[must_use]
pub fn new_in_memory_ledger() -> Box<dyn EventLedger> {
    Box::new(Arc::new(Mutex::new(LedgerInner::default())))
}

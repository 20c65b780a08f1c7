//! Storage abstraction layer for faultline.
//!
//! The simulation engine talks to two collaborators:
//!
//! - [`GraphStore`]: nodes and directed child -> parent dependency edges
//! - [`EventLedger`]: the append-only log of failures and recoveries
//!
//! Both are async, object-safe traits so backends can be swapped behind
//! `Box<dyn ...>`. Two backends exist:
//!
//! - **In-memory**: `HashMap` + petgraph, ephemeral
//! - **JSONL**: the in-memory backend wrapped with file persistence
//!
//! # Example
//!
//! ```no_run
//! use faultline::domain::NewNode;
//! use faultline::storage::{create_graph_store, StorageBackend};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let mut store = create_graph_store(StorageBackend::InMemory).await?;
//!     let grid = store
//!         .create(NewNode {
//!             name: "Regional Power Grid".to_string(),
//!             node_type: "Utilities".to_string(),
//!             resilience_score: 99.5,
//!             is_critical: true,
//!             downtime_cost_per_hour: 1_000_000.0,
//!         })
//!         .await?;
//!     println!("created node {}", grid.id);
//!     Ok(())
//! }
//! ```

use crate::domain::{Dependency, EventKind, FailureEvent, FailureStats, NewNode, Node, NodeId};
use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

pub mod in_memory;

/// Node and dependency-edge storage.
///
/// Edges are stored once per directed pair. The store does not require the
/// graph to be acyclic; consumers walking it must guard against cycles.
///
/// # Errors
///
/// - `NodeNotFound`: an operation referenced an unknown node
/// - `Storage(Unavailable)`: the backend cannot serve the request
#[async_trait]
pub trait GraphStore: Send + Sync {
    // ========== Nodes ==========

    /// Create a node with a freshly assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidNode` if `node.validate()` fails.
    async fn create(&mut self, node: NewNode) -> Result<Node>;

    /// Get a node by ID. Returns `None` if it doesn't exist.
    async fn get(&self, id: NodeId) -> Result<Option<Node>>;

    /// Overwrite a stored node with `node`, returning the stored value.
    ///
    /// # Errors
    ///
    /// Returns `Error::NodeNotFound` if no node has `node.id`.
    async fn save(&mut self, node: Node) -> Result<Node>;

    /// All nodes, ordered by ID.
    async fn list_all(&self) -> Result<Vec<Node>>;

    // ========== Dependencies ==========

    /// Record that `child` depends on `parent`. Adding an existing edge is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `Error::NodeNotFound` if either node doesn't exist.
    async fn add_dependency(&mut self, child: NodeId, parent: NodeId) -> Result<()>;

    /// Edges whose parent is `parent`, ordered by child ID.
    async fn list_children_of(&self, parent: NodeId) -> Result<Vec<Dependency>>;

    /// Edges whose child is `child`, ordered by parent ID.
    async fn list_parents_of(&self, child: NodeId) -> Result<Vec<Dependency>>;

    /// Every edge in the graph.
    async fn list_dependencies(&self) -> Result<Vec<Dependency>>;

    /// Everything that transitively depends on `id`, breadth first.
    ///
    /// Each dependent appears once, paired with its depth (1 = direct child).
    ///
    /// # Errors
    ///
    /// Returns `Error::NodeNotFound` if `id` doesn't exist.
    async fn dependents_tree(
        &self,
        id: NodeId,
        max_depth: Option<usize>,
    ) -> Result<Vec<(Dependency, usize)>>;

    /// Whether the dependency graph contains a cycle.
    async fn is_cyclic(&self) -> Result<bool>;

    // ========== Bulk ==========

    /// Remove every node and edge. Identifiers are not reused afterwards.
    async fn clear(&mut self) -> Result<()>;

    /// Never hand out `id` or any lower identifier from now on.
    async fn reserve_ids_through(&mut self, id: NodeId) -> Result<()>;

    // ========== Persistence ==========

    /// Write pending changes to the backing store (no-op for in-memory).
    async fn persist(&self) -> Result<()>;

    /// Discard in-memory state and reload from the backing store.
    async fn reload(&mut self) -> Result<()>;
}

/// Append-only log of failure and recovery events.
#[async_trait]
pub trait EventLedger: Send + Sync {
    /// Append one event.
    ///
    /// Timestamps are clamped so they never go backwards in insertion order.
    async fn append(&mut self, event: FailureEvent) -> Result<()>;

    /// All events in insertion order.
    async fn history(&self) -> Result<Vec<FailureEvent>>;

    /// Number of events recorded.
    async fn len(&self) -> Result<usize>;

    /// Group events by node name, skipping events of kind `excluded`.
    ///
    /// Groups are ordered by event count, highest first.
    async fn aggregate_excluding(&self, excluded: EventKind) -> Result<Vec<FailureStats>>;

    /// Write unsaved events to the backing store (no-op for in-memory).
    async fn persist(&self) -> Result<()>;

    /// Discard in-memory state and reload from the backing store.
    async fn reload(&mut self) -> Result<()>;
}

/// Storage backend configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// In-memory storage (ephemeral)
    InMemory,

    /// JSONL file storage (persistent)
    Jsonl(PathBuf),
}

impl StorageBackend {
    /// Returns the data file path for file-based backends.
    #[must_use]
    pub fn data_path(&self) -> Option<&Path> {
        match self {
            StorageBackend::Jsonl(path) => Some(path),
            StorageBackend::InMemory => None,
        }
    }
}

/// Graph store that rewrites a JSONL snapshot on `persist()`.
struct JsonlBackedGraphStore {
    inner: Box<dyn GraphStore>,
    path: PathBuf,
}

#[async_trait]
impl GraphStore for JsonlBackedGraphStore {
    async fn create(&mut self, node: NewNode) -> Result<Node> {
        self.inner.create(node).await
    }

    async fn get(&self, id: NodeId) -> Result<Option<Node>> {
        self.inner.get(id).await
    }

    async fn save(&mut self, node: Node) -> Result<Node> {
        self.inner.save(node).await
    }

    async fn list_all(&self) -> Result<Vec<Node>> {
        self.inner.list_all().await
    }

    async fn add_dependency(&mut self, child: NodeId, parent: NodeId) -> Result<()> {
        self.inner.add_dependency(child, parent).await
    }

    async fn list_children_of(&self, parent: NodeId) -> Result<Vec<Dependency>> {
        self.inner.list_children_of(parent).await
    }

    async fn list_parents_of(&self, child: NodeId) -> Result<Vec<Dependency>> {
        self.inner.list_parents_of(child).await
    }

    async fn list_dependencies(&self) -> Result<Vec<Dependency>> {
        self.inner.list_dependencies().await
    }

    async fn dependents_tree(
        &self,
        id: NodeId,
        max_depth: Option<usize>,
    ) -> Result<Vec<(Dependency, usize)>> {
        self.inner.dependents_tree(id, max_depth).await
    }

    async fn is_cyclic(&self) -> Result<bool> {
        self.inner.is_cyclic().await
    }

    async fn clear(&mut self) -> Result<()> {
        self.inner.clear().await
    }

    async fn reserve_ids_through(&mut self, id: NodeId) -> Result<()> {
        self.inner.reserve_ids_through(id).await
    }

    async fn persist(&self) -> Result<()> {
        in_memory::save_graph_to_jsonl(self.inner.as_ref(), &self.path).await
    }

    async fn reload(&mut self) -> Result<()> {
        self.inner = load_graph_or_empty(&self.path).await?;
        Ok(())
    }
}

/// Ledger that appends unsaved events to a JSONL file on `persist()`.
struct JsonlBackedLedger {
    inner: Box<dyn EventLedger>,
    path: PathBuf,
    /// Number of leading events already present in the file.
    persisted: AtomicUsize,
}

#[async_trait]
impl EventLedger for JsonlBackedLedger {
    async fn append(&mut self, event: FailureEvent) -> Result<()> {
        self.inner.append(event).await
    }

    async fn history(&self) -> Result<Vec<FailureEvent>> {
        self.inner.history().await
    }

    async fn len(&self) -> Result<usize> {
        self.inner.len().await
    }

    async fn aggregate_excluding(&self, excluded: EventKind) -> Result<Vec<FailureStats>> {
        self.inner.aggregate_excluding(excluded).await
    }

    async fn persist(&self) -> Result<()> {
        let history = self.inner.history().await?;
        let already = self.persisted.load(Ordering::Acquire).min(history.len());
        let pending = &history[already..];
        if pending.is_empty() {
            return Ok(());
        }

        in_memory::append_events_to_jsonl(pending, &self.path).await?;
        self.persisted.store(history.len(), Ordering::Release);
        Ok(())
    }

    async fn reload(&mut self) -> Result<()> {
        let (inner, count) = load_ledger_or_empty(&self.path).await?;
        self.inner = inner;
        self.persisted.store(count, Ordering::Release);
        Ok(())
    }
}

async fn load_graph_or_empty(path: &Path) -> Result<Box<dyn GraphStore>> {
    if !path.exists() {
        return Ok(in_memory::new_in_memory_graph_store());
    }

    let (store, warnings) = in_memory::load_graph_from_jsonl(path).await?;
    for warning in &warnings {
        tracing::warn!(path = %path.display(), warning = ?warning, "node file load warning");
    }
    Ok(store)
}

async fn load_ledger_or_empty(path: &Path) -> Result<(Box<dyn EventLedger>, usize)> {
    if !path.exists() {
        return Ok((in_memory::new_in_memory_ledger(), 0));
    }

    let (ledger, warnings) = in_memory::load_ledger_from_jsonl(path).await?;
    for warning in &warnings {
        tracing::warn!(path = %path.display(), warning = %warning, "event ledger load warning");
    }
    let count = ledger.len().await?;
    Ok((ledger, count))
}

/// Create a graph store for the given backend.
///
/// # Errors
///
/// - `Error::Io` if the JSONL file exists but cannot be read
pub async fn create_graph_store(backend: StorageBackend) -> Result<Box<dyn GraphStore>> {
    match backend {
        StorageBackend::InMemory => Ok(in_memory::new_in_memory_graph_store()),
        StorageBackend::Jsonl(path) => {
            let inner = load_graph_or_empty(&path).await?;
            Ok(Box::new(JsonlBackedGraphStore { inner, path }))
        }
    }
}

/// Create an event ledger for the given backend.
///
/// # Errors
///
/// - `Error::Io` if the JSONL file exists but cannot be read
pub async fn create_event_ledger(backend: StorageBackend) -> Result<Box<dyn EventLedger>> {
    match backend {
        StorageBackend::InMemory => Ok(in_memory::new_in_memory_ledger()),
        StorageBackend::Jsonl(path) => {
            let (inner, count) = load_ledger_or_empty(&path).await?;
            Ok(Box::new(JsonlBackedLedger {
                inner,
                path,
                persisted: AtomicUsize::new(count),
            }))
        }
    }
}

// ========== Test Utilities ==========

/// Storage double whose every call fails with `StorageError::Unavailable`.
///
/// Implements both [`GraphStore`] and [`EventLedger`]. Available in tests and
/// with the `test-util` feature.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Clone, Copy, Default)]
#[non_exhaustive]
pub struct UnavailableStorage;

#[cfg(any(test, feature = "test-util"))]
impl UnavailableStorage {
    /// Create a new `UnavailableStorage`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn fail<T>() -> Result<T> {
        Err(crate::error::StorageError::Unavailable("storage offline".to_string()).into())
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl GraphStore for UnavailableStorage {
    async fn create(&mut self, _node: NewNode) -> Result<Node> {
        Self::fail()
    }

    async fn get(&self, _id: NodeId) -> Result<Option<Node>> {
        Self::fail()
    }

    async fn save(&mut self, _node: Node) -> Result<Node> {
        Self::fail()
    }

    async fn list_all(&self) -> Result<Vec<Node>> {
        Self::fail()
    }

    async fn add_dependency(&mut self, _child: NodeId, _parent: NodeId) -> Result<()> {
        Self::fail()
    }

    async fn list_children_of(&self, _parent: NodeId) -> Result<Vec<Dependency>> {
        Self::fail()
    }

    async fn list_parents_of(&self, _child: NodeId) -> Result<Vec<Dependency>> {
        Self::fail()
    }

    async fn list_dependencies(&self) -> Result<Vec<Dependency>> {
        Self::fail()
    }

    async fn dependents_tree(
        &self,
        _id: NodeId,
        _max_depth: Option<usize>,
    ) -> Result<Vec<(Dependency, usize)>> {
        Self::fail()
    }

    async fn is_cyclic(&self) -> Result<bool> {
        Self::fail()
    }

    async fn clear(&mut self) -> Result<()> {
        Self::fail()
    }

    async fn reserve_ids_through(&mut self, _id: NodeId) -> Result<()> {
        Self::fail()
    }

    async fn persist(&self) -> Result<()> {
        Self::fail()
    }

    async fn reload(&mut self) -> Result<()> {
        Self::fail()
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl EventLedger for UnavailableStorage {
    async fn append(&mut self, _event: FailureEvent) -> Result<()> {
        Self::fail()
    }

    async fn history(&self) -> Result<Vec<FailureEvent>> {
        Self::fail()
    }

    async fn len(&self) -> Result<usize> {
        Self::fail()
    }

    async fn aggregate_excluding(&self, _excluded: EventKind) -> Result<Vec<FailureStats>> {
        Self::fail()
    }

    async fn persist(&self) -> Result<()> {
        Self::fail()
    }

    async fn reload(&mut self) -> Result<()> {
        Self::fail()
    }
}

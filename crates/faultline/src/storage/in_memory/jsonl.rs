//! JSONL persistence for the in-memory stores.
//!
//! Node files hold one [`NodeRecord`] per line: the node's fields plus the IDs
//! it depends on. Ledger files hold one [`FailureEvent`] per line and are only
//! ever appended to.

use super::inner::{GraphStoreInner, LedgerInner};
use crate::domain::{FailureEvent, Node, NodeId, NodePatch};
use crate::error::Result;
use crate::storage::{EventLedger, GraphStore};
use faultline_jsonl::{append_jsonl, read_jsonl_resilient, write_jsonl_atomic_iter, Warning};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// On-disk shape of a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct NodeRecord {
    #[serde(flatten)]
    node: Node,

    /// Parents this node depends on
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    depends_on: Vec<NodeId>,
}

/// Non-fatal problems found while loading a node or event file.
///
/// The offending line, node or edge is skipped and loading continues.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadWarning {
    /// A line couldn't be parsed.
    MalformedJson { line_number: usize, error: String },

    /// A dependency names a node that isn't in the file; the edge is dropped.
    OrphanedDependency { from: NodeId, to: NodeId },

    /// Node data failed validation; the node is dropped.
    InvalidNodeData {
        node_id: NodeId,
        record_number: usize,
        error: String,
    },

    /// A second record reused an ID; the later record is dropped.
    DuplicateNode { node_id: NodeId },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::MalformedJson { line_number, error } => {
                write!(f, "skipped malformed line {line_number}: {error}")
            }
            LoadWarning::OrphanedDependency { from, to } => {
                write!(f, "dropped dependency {from} -> {to}: node {to} does not exist")
            }
            LoadWarning::InvalidNodeData {
                node_id,
                record_number,
                error,
            } => write!(f, "skipped invalid node {node_id} (record {record_number}): {error}"),
            LoadWarning::DuplicateNode { node_id } => {
                write!(f, "skipped duplicate record for node {node_id}")
            }
        }
    }
}

impl From<Warning> for LoadWarning {
    fn from(warning: Warning) -> Self {
        LoadWarning::MalformedJson {
            line_number: warning.line_number,
            error: warning.detail().to_string(),
        }
    }
}

/// Load a graph store from a JSONL node file.
///
/// Loading happens in three passes:
///
/// 1. Parse lines, turning malformed ones into warnings
/// 2. Validate and insert nodes (invalid or duplicate IDs are skipped)
/// 3. Recreate edges, skipping those that point at missing nodes
///
/// Cycles are kept; the store does not require an acyclic graph.
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be opened or read.
pub async fn load_graph_from_jsonl(path: &Path) -> Result<(Box<dyn GraphStore>, Vec<LoadWarning>)> {
    let (records, jsonl_warnings) = read_jsonl_resilient::<NodeRecord, _>(path).await?;
    let mut warnings: Vec<LoadWarning> = jsonl_warnings.into_iter().map(Into::into).collect();

    let mut inner = GraphStoreInner::new();
    let mut edges = Vec::new();

    for (index, record) in records.into_iter().enumerate() {
        let node_id = record.node.id;
        if let Err(error) = NodePatch::from_node(&record.node).validate() {
            warnings.push(LoadWarning::InvalidNodeData {
                node_id,
                record_number: index + 1,
                error,
            });
            continue;
        }
        if !inner.insert_node(record.node) {
            warnings.push(LoadWarning::DuplicateNode { node_id });
            continue;
        }
        edges.extend(record.depends_on.into_iter().map(|parent| (node_id, parent)));
    }

    for (child, parent) in edges {
        if !inner.nodes.contains_key(&parent) {
            warnings.push(LoadWarning::OrphanedDependency {
                from: child,
                to: parent,
            });
            continue;
        }
        inner.add_edge(child, parent)?;
    }

    tracing::debug!(
        path = %path.display(),
        nodes = inner.nodes.len(),
        edges = inner.graph.edge_count(),
        warnings = warnings.len(),
        "loaded node file"
    );

    Ok((Box::new(Arc::new(Mutex::new(inner))), warnings))
}

/// Save every node and edge to a JSONL file, replacing it atomically.
///
/// Records are sorted by ID, and each record's parents are sorted, so
/// repeated saves of the same graph produce identical files.
///
/// # Errors
///
/// Returns an error if the store cannot be read or the file cannot be written.
pub async fn save_graph_to_jsonl(store: &dyn GraphStore, path: &Path) -> Result<()> {
    let nodes = store.list_all().await?;
    let mut parents: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
    for dep in store.list_dependencies().await? {
        parents.entry(dep.node_id).or_default().push(dep.depends_on_id);
    }

    let records = nodes.into_iter().map(|node| {
        let mut depends_on = parents.remove(&node.id).unwrap_or_default();
        depends_on.sort();
        NodeRecord { node, depends_on }
    });

    write_jsonl_atomic_iter(path, records).await?;
    Ok(())
}

/// Load an event ledger from a JSONL file.
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be opened or read.
pub async fn load_ledger_from_jsonl(
    path: &Path,
) -> Result<(Box<dyn EventLedger>, Vec<LoadWarning>)> {
    let (events, jsonl_warnings) = read_jsonl_resilient::<FailureEvent, _>(path).await?;
    let warnings = jsonl_warnings.into_iter().map(Into::into).collect();

    let mut inner = LedgerInner::default();
    for event in events {
        inner.push(event);
    }

    Ok((Box::new(Arc::new(Mutex::new(inner))), warnings))
}

/// Append events to the end of a ledger file, creating it if needed.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or written.
pub async fn append_events_to_jsonl(events: &[FailureEvent], path: &Path) -> Result<()> {
    let written = append_jsonl(path, events.iter()).await?;
    tracing::debug!(path = %path.display(), events = written, "appended ledger events");
    Ok(())
}

//! Read-only reports over the ledger and the graph.

use crate::domain::{Dependency, EventKind, FailureStats, Health, Node, NodeId};
use crate::error::{Error, Result};
use crate::storage::{EventLedger, GraphStore};
use serde::Serialize;

/// Failure impact per node name, most frequent first. Recoveries are excluded.
///
/// # Errors
///
/// Ledger failures are returned unchanged.
pub async fn top_failures(ledger: &dyn EventLedger) -> Result<Vec<FailureStats>> {
    ledger.aggregate_excluding(EventKind::AutoRecovery).await
}

/// Snapshot of the whole scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactSummary {
    /// Number of nodes in the graph
    pub total_nodes: usize,

    /// Nodes flagged critical
    pub critical_nodes: usize,

    /// Nodes currently at score 0
    pub failed_nodes: usize,

    /// Nodes alive but below full health
    pub degraded_nodes: usize,

    /// Combined downtime cost per hour of the failed nodes
    pub hourly_loss_rate: f64,

    /// Events in the ledger, recoveries included
    pub total_events: usize,

    /// Sum of the cost snapshots of all failure events
    pub total_lost: f64,
}

/// Build an [`ImpactSummary`] from the current graph and ledger.
///
/// # Errors
///
/// Store failures are returned unchanged.
pub async fn summary(store: &dyn GraphStore, ledger: &dyn EventLedger) -> Result<ImpactSummary> {
    let nodes = store.list_all().await?;
    let history = ledger.history().await?;

    let failed: Vec<&Node> = nodes.iter().filter(|n| !n.is_alive()).collect();

    Ok(ImpactSummary {
        total_nodes: nodes.len(),
        critical_nodes: nodes.iter().filter(|n| n.is_critical).count(),
        failed_nodes: failed.len(),
        degraded_nodes: nodes
            .iter()
            .filter(|n| n.health() == Health::Degraded)
            .count(),
        hourly_loss_rate: failed.iter().map(|n| n.downtime_cost_per_hour).sum(),
        total_events: history.len(),
        total_lost: history
            .iter()
            .filter(|e| e.kind.is_failure())
            .map(|e| e.cost_at_failure)
            .sum(),
    })
}

/// One node reached by an impact walk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactEntry {
    /// The dependent node
    pub node: Node,

    /// The parent it was reached through
    pub via: NodeId,

    /// Distance from the root (1 = direct dependent)
    pub depth: usize,
}

/// What a failure of `root` would reach, without changing anything.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactReport {
    /// The node being analysed
    pub root: Node,

    /// Transitive dependents, breadth first
    pub dependents: Vec<ImpactEntry>,

    /// Hourly cost of the root and every dependent that is still alive
    pub cost_at_risk: f64,
}

/// Dry-run of a kill: everything that depends on `id`, up to `max_depth`.
///
/// # Errors
///
/// Returns `Error::NodeNotFound` if `id` doesn't exist.
pub async fn impact(
    store: &dyn GraphStore,
    id: NodeId,
    max_depth: Option<usize>,
) -> Result<ImpactReport> {
    let root = store.get(id).await?.ok_or(Error::NodeNotFound(id))?;
    let tree = store.dependents_tree(id, max_depth).await?;

    let mut dependents = Vec::with_capacity(tree.len());
    for (Dependency { node_id, depends_on_id }, depth) in tree {
        if let Some(node) = store.get(node_id).await? {
            dependents.push(ImpactEntry {
                node,
                via: depends_on_id,
                depth,
            });
        }
    }

    let cost_at_risk = std::iter::once(&root)
        .chain(dependents.iter().map(|entry| &entry.node))
        .filter(|node| node.is_alive())
        .map(|node| node.downtime_cost_per_hour)
        .sum();

    Ok(ImpactReport {
        root,
        dependents,
        cost_at_risk,
    })
}

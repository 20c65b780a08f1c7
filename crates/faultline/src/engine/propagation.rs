//! Cascading failure propagation.
//!
//! When a node fails, every node that depends on it (directly or
//! transitively) fails too. The walk is depth first: all of one node's
//! dependents, including their own sub-cascades, are handled before moving
//! on to its next sibling.

use crate::domain::{EventKind, FailureEvent, Node, NodeId, FAILED};
use crate::error::Result;
use crate::storage::{EventLedger, GraphStore};
use std::collections::HashSet;

/// Fail everything downstream of `failed`, which must already be at score 0.
///
/// Each node that changes state is saved and gets exactly one
/// `CASCADE_FAILURE` event. Nodes that are already down are left alone and
/// their dependents are not walked through them. A node is visited at most
/// once per call, so cycles terminate.
///
/// Returns the nodes failed by this call, in failure order.
///
/// # Errors
///
/// Store failures are returned unchanged. Work done before the failure stays
/// written.
pub async fn propagate(
    store: &mut dyn GraphStore,
    ledger: &mut dyn EventLedger,
    failed: NodeId,
) -> Result<Vec<Node>> {
    let mut visited = HashSet::from([failed]);
    let mut cascaded = Vec::new();
    let mut stack = children_in_visit_order(store, failed).await?;

    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }

        let Some(mut child) = store.get(id).await? else {
            tracing::debug!(node_id = %id, "skipping dependency on missing node");
            continue;
        };
        if !child.is_alive() {
            continue;
        }

        child.resilience_score = FAILED;
        let child = store.save(child).await?;
        ledger
            .append(FailureEvent::for_node(&child, EventKind::CascadeFailure))
            .await?;
        tracing::info!(
            node_id = %child.id,
            name = %child.name,
            cost = child.downtime_cost_per_hour,
            "cascade failure"
        );

        stack.extend(children_in_visit_order(store, id).await?);
        cascaded.push(child);
    }

    Ok(cascaded)
}

/// Children of `parent`, reversed so popping the stack yields ascending IDs.
async fn children_in_visit_order(store: &dyn GraphStore, parent: NodeId) -> Result<Vec<NodeId>> {
    Ok(store
        .list_children_of(parent)
        .await?
        .into_iter()
        .rev()
        .map(|dep| dep.node_id)
        .collect())
}

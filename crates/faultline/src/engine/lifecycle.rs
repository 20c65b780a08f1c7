//! Node lifecycle operations: kill, reset and update.

use super::analytics::{self, ImpactReport, ImpactSummary};
use super::mitigation::{MitigationOutcome, MitigationPolicy};
use super::propagation;
use crate::domain::{EventKind, FailureEvent, FailureStats, Node, NodeId, NodePatch, FAILED, FULL_HEALTH};
use crate::error::{Error, Result};
use crate::storage::{EventLedger, GraphStore};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Controller shared between concurrent callers.
pub type SharedController = Arc<Mutex<LifecycleController>>;

/// Result of a kill.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KillOutcome {
    /// The killed node as stored after propagation and failover
    pub node: Node,

    /// Whether the node was alive before the call
    pub changed: bool,

    /// Dependents failed by the cascade, in failure order
    pub cascaded: Vec<Node>,

    /// Failover that ran after the kill, if any
    pub mitigation: Option<MitigationOutcome>,
}

/// Entry point for every state change in the simulation.
///
/// Owns the graph store, the event ledger and the failover policy. Mutating
/// operations take `&mut self`, so a kill together with its cascade and
/// failover never interleaves with another operation.
pub struct LifecycleController {
    store: Box<dyn GraphStore>,
    ledger: Box<dyn EventLedger>,
    policy: MitigationPolicy,
}

impl LifecycleController {
    /// Create a controller with the default failover rules.
    #[must_use]
    pub fn new(store: Box<dyn GraphStore>, ledger: Box<dyn EventLedger>) -> Self {
        Self {
            store,
            ledger,
            policy: MitigationPolicy::default(),
        }
    }

    /// Replace the failover policy.
    #[must_use]
    pub fn with_policy(mut self, policy: MitigationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The active failover policy.
    pub fn policy(&self) -> &MitigationPolicy {
        &self.policy
    }

    /// Read access to the graph store.
    pub fn store(&self) -> &dyn GraphStore {
        self.store.as_ref()
    }

    /// Write access to the graph store, for scenario editing (adding nodes
    /// and edges). Health changes should go through the controller.
    pub fn store_mut(&mut self) -> &mut dyn GraphStore {
        self.store.as_mut()
    }

    /// Read access to the event ledger.
    pub fn ledger(&self) -> &dyn EventLedger {
        self.ledger.as_ref()
    }

    /// Wrap the controller for use from concurrent tasks.
    #[must_use]
    pub fn into_shared(self) -> SharedController {
        Arc::new(Mutex::new(self))
    }

    /// Keep the store from handing out any ID the ledger already mentions.
    ///
    /// The node file only remembers IDs of nodes that still exist, so after
    /// a clear and reload the counter could restart below IDs that past
    /// events point at.
    ///
    /// # Errors
    ///
    /// Store or ledger failures, returned unchanged.
    pub async fn reserve_recorded_ids(&mut self) -> Result<()> {
        let highest = self
            .ledger
            .history()
            .await?
            .into_iter()
            .filter_map(|event| event.node_id)
            .max();
        if let Some(id) = highest {
            self.store.reserve_ids_through(id).await?;
        }
        Ok(())
    }

    async fn fetch(&self, id: NodeId) -> Result<Node> {
        self.store.get(id).await?.ok_or(Error::NodeNotFound(id))
    }

    /// Kill a node, cascade the failure and run failover.
    ///
    /// Killing a node that is already down changes nothing and records no
    /// events; the current node is returned with `changed == false`.
    ///
    /// # Errors
    ///
    /// - `Error::NodeNotFound` if `id` doesn't exist (nothing is written)
    /// - store failures, returned unchanged; earlier writes are kept
    pub async fn kill(&mut self, id: NodeId) -> Result<KillOutcome> {
        let mut node = self.fetch(id).await?;
        if !node.is_alive() {
            tracing::debug!(node_id = %id, name = %node.name, "node already failed");
            return Ok(KillOutcome {
                node,
                changed: false,
                cascaded: Vec::new(),
                mitigation: None,
            });
        }

        node.resilience_score = FAILED;
        let node = self.store.save(node).await?;
        self.ledger
            .append(FailureEvent::for_node(&node, EventKind::ManualKill))
            .await?;
        tracing::info!(
            node_id = %id,
            name = %node.name,
            cost = node.downtime_cost_per_hour,
            "node killed"
        );

        let cascaded = propagation::propagate(self.store.as_mut(), self.ledger.as_mut(), id).await?;
        let mitigation = self
            .policy
            .apply(self.store.as_mut(), self.ledger.as_mut(), &node)
            .await?;

        if !cascaded.is_empty() {
            tracing::info!(node_id = %id, cascaded = cascaded.len(), "cascade finished");
        }

        Ok(KillOutcome {
            node: self.fetch(id).await?,
            changed: true,
            cascaded,
            mitigation,
        })
    }

    /// Restore a node to full health.
    ///
    /// No event is recorded and dependents are left as they are.
    ///
    /// # Errors
    ///
    /// Returns `Error::NodeNotFound` if `id` doesn't exist.
    pub async fn reset(&mut self, id: NodeId) -> Result<Node> {
        let mut node = self.fetch(id).await?;
        node.resilience_score = FULL_HEALTH;
        let node = self.store.save(node).await?;
        tracing::info!(node_id = %id, name = %node.name, "node reset");
        Ok(node)
    }

    /// Overwrite a node's name, cost and score.
    ///
    /// This is an editing path: nothing cascades and no event is recorded,
    /// even if the new score brings a failed node back or takes a live one
    /// down. Such flips are logged as warnings.
    ///
    /// # Errors
    ///
    /// - `Error::NodeNotFound` if `id` doesn't exist
    /// - `Error::InvalidNode` if the patch fails validation
    pub async fn update(&mut self, id: NodeId, patch: NodePatch) -> Result<Node> {
        let mut node = self.fetch(id).await?;
        patch.validate().map_err(Error::InvalidNode)?;
        let was_alive = node.is_alive();

        node.name = patch.name;
        node.downtime_cost_per_hour = patch.downtime_cost_per_hour;
        node.resilience_score = patch.resilience_score;
        let node = self.store.save(node).await?;

        if was_alive != node.is_alive() {
            tracing::warn!(
                node_id = %id,
                name = %node.name,
                alive = node.is_alive(),
                "update changed node liveness without an event or cascade"
            );
        }
        Ok(node)
    }

    /// Failure impact per node name, most frequent first.
    ///
    /// # Errors
    ///
    /// Ledger failures are returned unchanged.
    pub async fn top_failures(&self) -> Result<Vec<FailureStats>> {
        analytics::top_failures(self.ledger.as_ref()).await
    }

    /// The `limit` most frequently failing node names.
    ///
    /// # Errors
    ///
    /// Ledger failures are returned unchanged.
    pub async fn top_failures_limited(&self, limit: usize) -> Result<Vec<FailureStats>> {
        let mut stats = self.top_failures().await?;
        stats.truncate(limit);
        Ok(stats)
    }

    /// Scenario-wide counts and losses.
    ///
    /// # Errors
    ///
    /// Store failures are returned unchanged.
    pub async fn summary(&self) -> Result<ImpactSummary> {
        analytics::summary(self.store.as_ref(), self.ledger.as_ref()).await
    }

    /// What killing `id` would reach, without changing anything.
    ///
    /// # Errors
    ///
    /// Returns `Error::NodeNotFound` if `id` doesn't exist.
    pub async fn impact(&self, id: NodeId, max_depth: Option<usize>) -> Result<ImpactReport> {
        analytics::impact(self.store.as_ref(), id, max_depth).await
    }

    /// Persist both stores.
    ///
    /// # Errors
    ///
    /// Returns the first persistence failure.
    pub async fn persist(&self) -> Result<()> {
        self.store.persist().await?;
        self.ledger.persist().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewNode;
    use crate::engine::mitigation::MitigationRule;
    use crate::storage::in_memory::{new_in_memory_graph_store, new_in_memory_ledger};
    use crate::storage::UnavailableStorage;

    async fn controller_with(names: &[&str]) -> (LifecycleController, Vec<NodeId>) {
        let mut store = new_in_memory_graph_store();
        let mut ids = Vec::new();
        for name in names {
            let node = store
                .create(NewNode {
                    name: (*name).to_string(),
                    node_type: "Test".to_string(),
                    resilience_score: 90.0,
                    is_critical: false,
                    downtime_cost_per_hour: 25.0,
                })
                .await
                .unwrap();
            ids.push(node.id);
        }
        (LifecycleController::new(store, new_in_memory_ledger()), ids)
    }

    #[tokio::test]
    async fn kill_records_manual_kill_with_cost() {
        let (mut ctl, ids) = controller_with(&["Salesforce CRM"]).await;

        let outcome = ctl.kill(ids[0]).await.unwrap();

        assert!(outcome.changed);
        assert!(!outcome.node.is_alive());
        assert!(outcome.mitigation.is_none());
        let history = ctl.ledger().history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, EventKind::ManualKill);
        assert_eq!(history[0].cost_at_failure, 25.0);
    }

    #[tokio::test]
    async fn kill_returns_state_after_failover() {
        // The killed node is its own failover victim here.
        let (ctl, ids) = controller_with(&["Power Grid", "Diesel Generators"]).await;
        let mut ctl = ctl.with_policy(MitigationPolicy::new(vec![MitigationRule::by_name(
            "Power Grid",
            "Diesel Generators",
            "Power Grid",
        )]));

        let outcome = ctl.kill(ids[0]).await.unwrap();

        assert_eq!(outcome.node.resilience_score, FULL_HEALTH);
        assert!(outcome.mitigation.is_some());
    }

    #[tokio::test]
    async fn kill_unknown_node_writes_nothing() {
        let (mut ctl, _) = controller_with(&[]).await;

        let err = ctl.kill(NodeId(99)).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(ctl.ledger().len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_rejects_invalid_patch() {
        let (mut ctl, ids) = controller_with(&["Paint Shop"]).await;
        let patch = NodePatch {
            name: "Paint Shop".to_string(),
            downtime_cost_per_hour: 10.0,
            resilience_score: 140.0,
        };

        let err = ctl.update(ids[0], patch).await.unwrap_err();
        assert!(matches!(err, Error::InvalidNode(_)));
    }

    #[tokio::test]
    async fn update_can_revive_without_events() {
        let (mut ctl, ids) = controller_with(&["Paint Shop"]).await;
        ctl.kill(ids[0]).await.unwrap();

        let node = ctl.store().get(ids[0]).await.unwrap().unwrap();
        let patch = NodePatch {
            resilience_score: 60.0,
            ..NodePatch::from_node(&node)
        };
        let updated = ctl.update(ids[0], patch).await.unwrap();

        assert!(updated.is_alive());
        assert_eq!(ctl.ledger().len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn top_failures_limited_truncates() {
        let (mut ctl, ids) = controller_with(&["a", "b", "c"]).await;
        for id in &ids {
            ctl.kill(*id).await.unwrap();
        }

        assert_eq!(ctl.top_failures().await.unwrap().len(), 3);
        assert_eq!(ctl.top_failures_limited(2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unavailable_store_is_fatal() {
        let mut ctl = LifecycleController::new(
            Box::new(UnavailableStorage::new()),
            Box::new(UnavailableStorage::new()),
        );

        assert!(ctl.kill(NodeId(1)).await.is_err());
        assert!(ctl.reset(NodeId(1)).await.is_err());
        assert!(ctl.top_failures().await.is_err());
    }

    #[tokio::test]
    async fn shared_controller_serializes_callers() {
        let (ctl, ids) = controller_with(&["a"]).await;
        let shared = ctl.into_shared();

        let first = {
            let shared = Arc::clone(&shared);
            let id = ids[0];
            tokio::spawn(async move { shared.lock().await.kill(id).await.unwrap().changed })
        };
        let second = {
            let shared = Arc::clone(&shared);
            let id = ids[0];
            tokio::spawn(async move { shared.lock().await.kill(id).await.unwrap().changed })
        };

        let changed = [first.await.unwrap(), second.await.unwrap()];
        assert_eq!(changed.iter().filter(|c| **c).count(), 1);
        assert_eq!(shared.lock().await.ledger().len().await.unwrap(), 1);
    }
}

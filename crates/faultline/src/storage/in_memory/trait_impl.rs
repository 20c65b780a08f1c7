//! `GraphStore` and `EventLedger` implementations for the in-memory stores.

use super::graph::{all_edges, children_of, dependents_tree_impl, is_cyclic_impl, parents_of};
use super::ledger::aggregate_events;
use super::{InMemoryGraphStore, InMemoryLedger};
use crate::domain::{Dependency, EventKind, FailureEvent, FailureStats, NewNode, Node, NodeId, NodePatch};
use crate::error::{Error, Result};
use crate::storage::{EventLedger, GraphStore};
use async_trait::async_trait;

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn create(&mut self, node: NewNode) -> Result<Node> {
        node.validate().map_err(Error::InvalidNode)?;

        let mut inner = self.lock().await;
        let id = inner.allocate_id();
        let created = Node {
            id,
            name: node.name,
            node_type: node.node_type,
            resilience_score: node.resilience_score,
            is_critical: node.is_critical,
            downtime_cost_per_hour: node.downtime_cost_per_hour,
        };
        inner.insert_node(created.clone());

        tracing::debug!(node_id = %id, name = %created.name, "created node");
        Ok(created)
    }

    async fn get(&self, id: NodeId) -> Result<Option<Node>> {
        let inner = self.lock().await;
        Ok(inner.nodes.get(&id).cloned())
    }

    async fn save(&mut self, node: Node) -> Result<Node> {
        NodePatch::from_node(&node)
            .validate()
            .map_err(Error::InvalidNode)?;

        let mut inner = self.lock().await;
        let slot = inner
            .nodes
            .get_mut(&node.id)
            .ok_or(Error::NodeNotFound(node.id))?;
        *slot = node.clone();
        Ok(node)
    }

    async fn list_all(&self) -> Result<Vec<Node>> {
        let inner = self.lock().await;
        let mut nodes: Vec<Node> = inner.nodes.values().cloned().collect();
        nodes.sort_by_key(|node| node.id);
        Ok(nodes)
    }

    async fn add_dependency(&mut self, child: NodeId, parent: NodeId) -> Result<()> {
        let mut inner = self.lock().await;
        if inner.add_edge(child, parent)? {
            tracing::debug!(child = %child, parent = %parent, "added dependency");
        }
        Ok(())
    }

    async fn list_children_of(&self, parent: NodeId) -> Result<Vec<Dependency>> {
        let inner = self.lock().await;
        Ok(children_of(&inner.graph, &inner.node_map, parent))
    }

    async fn list_parents_of(&self, child: NodeId) -> Result<Vec<Dependency>> {
        let inner = self.lock().await;
        Ok(parents_of(&inner.graph, &inner.node_map, child))
    }

    async fn list_dependencies(&self) -> Result<Vec<Dependency>> {
        let inner = self.lock().await;
        Ok(all_edges(&inner.graph))
    }

    async fn dependents_tree(
        &self,
        id: NodeId,
        max_depth: Option<usize>,
    ) -> Result<Vec<(Dependency, usize)>> {
        let inner = self.lock().await;
        dependents_tree_impl(&inner.graph, &inner.node_map, id, max_depth)
    }

    async fn is_cyclic(&self) -> Result<bool> {
        let inner = self.lock().await;
        Ok(is_cyclic_impl(&inner.graph))
    }

    async fn clear(&mut self) -> Result<()> {
        self.lock().await.clear();
        Ok(())
    }

    async fn reserve_ids_through(&mut self, id: NodeId) -> Result<()> {
        self.lock().await.reserve_through(id);
        Ok(())
    }

    async fn persist(&self) -> Result<()> {
        Ok(())
    }

    async fn reload(&mut self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl EventLedger for InMemoryLedger {
    async fn append(&mut self, event: FailureEvent) -> Result<()> {
        tracing::debug!(
            node = %event.node_name,
            kind = %event.kind,
            cost = event.cost_at_failure,
            "recorded event"
        );
        self.lock().await.push(event);
        Ok(())
    }

    async fn history(&self) -> Result<Vec<FailureEvent>> {
        Ok(self.lock().await.events.clone())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.lock().await.events.len())
    }

    async fn aggregate_excluding(&self, excluded: EventKind) -> Result<Vec<FailureStats>> {
        let inner = self.lock().await;
        Ok(aggregate_events(&inner.events, excluded))
    }

    async fn persist(&self) -> Result<()> {
        Ok(())
    }

    async fn reload(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::{EventKind, FailureEvent, NewNode, NodeId};
    use crate::error::Error;
    use crate::storage::in_memory::{new_in_memory_graph_store, new_in_memory_ledger};

    fn new_node(name: &str, score: f64) -> NewNode {
        NewNode {
            name: name.to_string(),
            node_type: "Manufacturing".to_string(),
            resilience_score: score,
            is_critical: false,
            downtime_cost_per_hour: 30_000.0,
        }
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let mut store = new_in_memory_graph_store();
        let a = store.create(new_node("Robotic Welding Unit A", 89.5)).await.unwrap();
        let b = store.create(new_node("Automated Paint Shop", 91.0)).await.unwrap();

        assert_eq!(a.id, NodeId(1));
        assert_eq!(b.id, NodeId(2));
        assert_eq!(store.get(b.id).await.unwrap(), Some(b));
    }

    #[tokio::test]
    async fn create_rejects_invalid_data() {
        let mut store = new_in_memory_graph_store();
        let err = store.create(new_node("", 50.0)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidNode(_)));
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_unknown_node_is_not_found() {
        let mut store = new_in_memory_graph_store();
        let mut node = store.create(new_node("Paint", 91.0)).await.unwrap();
        node.id = NodeId(42);

        let err = store.save(node).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn save_overwrites_and_keeps_edges() {
        let mut store = new_in_memory_graph_store();
        let plant = store.create(new_node("Plant", 94.0)).await.unwrap();
        let mut paint = store.create(new_node("Paint", 91.0)).await.unwrap();
        store.add_dependency(paint.id, plant.id).await.unwrap();

        paint.resilience_score = 0.0;
        store.save(paint.clone()).await.unwrap();

        assert_eq!(store.get(paint.id).await.unwrap().unwrap().resilience_score, 0.0);
        assert_eq!(store.list_children_of(plant.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn children_of_unknown_parent_is_empty() {
        let store = new_in_memory_graph_store();
        assert!(store.list_children_of(NodeId(9)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_dependency_requires_both_nodes() {
        let mut store = new_in_memory_graph_store();
        let plant = store.create(new_node("Plant", 94.0)).await.unwrap();

        let err = store.add_dependency(plant.id, NodeId(5)).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn clear_empties_store_without_reusing_ids() {
        let mut store = new_in_memory_graph_store();
        store.create(new_node("Plant", 94.0)).await.unwrap();
        store.clear().await.unwrap();

        assert!(store.list_all().await.unwrap().is_empty());
        let next = store.create(new_node("Plant", 94.0)).await.unwrap();
        assert_eq!(next.id, NodeId(2));
    }

    #[tokio::test]
    async fn reserved_ids_are_skipped() {
        let mut store = new_in_memory_graph_store();
        store.reserve_ids_through(NodeId(7)).await.unwrap();
        store.reserve_ids_through(NodeId(3)).await.unwrap();

        let node = store.create(new_node("Plant", 94.0)).await.unwrap();
        assert_eq!(node.id, NodeId(8));
    }

    #[tokio::test]
    async fn ledger_keeps_insertion_order() {
        let mut store = new_in_memory_graph_store();
        let node = store.create(new_node("Plant", 94.0)).await.unwrap();

        let mut ledger = new_in_memory_ledger();
        for kind in [EventKind::ManualKill, EventKind::CascadeFailure, EventKind::AutoRecovery] {
            ledger.append(FailureEvent::for_node(&node, kind)).await.unwrap();
        }

        let kinds: Vec<EventKind> = ledger
            .history()
            .await
            .unwrap()
            .iter()
            .map(|event| event.kind)
            .collect();
        assert_eq!(
            kinds,
            [EventKind::ManualKill, EventKind::CascadeFailure, EventKind::AutoRecovery]
        );

        let stats = ledger
            .aggregate_excluding(EventKind::AutoRecovery)
            .await
            .unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].failure_count, 2);
    }
}

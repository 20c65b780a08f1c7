//! Dependency graph queries using petgraph.
//!
//! - Direct children / parents of a node
//! - Transitive dependents (BFS over incoming edges)
//! - Cycle detection

use crate::domain::{Dependency, NodeId};
use crate::error::Result;
use petgraph::algo;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet, VecDeque};

/// Edges whose target is `parent`, sorted by child ID.
///
/// An unknown parent simply has no children.
pub(super) fn children_of(
    graph: &DiGraph<NodeId, ()>,
    node_map: &HashMap<NodeId, NodeIndex>,
    parent: NodeId,
) -> Vec<Dependency> {
    let Some(&index) = node_map.get(&parent) else {
        return Vec::new();
    };

    let mut deps: Vec<Dependency> = graph
        .edges_directed(index, Direction::Incoming)
        .map(|edge| Dependency::new(graph[edge.source()], parent))
        .collect();
    deps.sort();
    deps
}

/// Edges whose source is `child`, sorted by parent ID.
pub(super) fn parents_of(
    graph: &DiGraph<NodeId, ()>,
    node_map: &HashMap<NodeId, NodeIndex>,
    child: NodeId,
) -> Vec<Dependency> {
    let Some(&index) = node_map.get(&child) else {
        return Vec::new();
    };

    let mut deps: Vec<Dependency> = graph
        .edges(index)
        .map(|edge| Dependency::new(child, graph[edge.target()]))
        .collect();
    deps.sort();
    deps
}

/// Every edge, sorted by (child, parent).
pub(super) fn all_edges(graph: &DiGraph<NodeId, ()>) -> Vec<Dependency> {
    let mut deps: Vec<Dependency> = graph
        .edge_references()
        .map(|edge| Dependency::new(graph[edge.source()], graph[edge.target()]))
        .collect();
    deps.sort();
    deps
}

/// Breadth-first walk of everything that depends on `id`.
///
/// Each dependent is reported once, with the edge through which it was first
/// reached and its depth (1 = direct child). The start node is never reported,
/// even when a cycle leads back to it.
pub(super) fn dependents_tree_impl(
    graph: &DiGraph<NodeId, ()>,
    node_map: &HashMap<NodeId, NodeIndex>,
    id: NodeId,
    max_depth: Option<usize>,
) -> Result<Vec<(Dependency, usize)>> {
    let start = node_map
        .get(&id)
        .copied()
        .ok_or(crate::error::Error::NodeNotFound(id))?;

    let mut result = Vec::new();
    let mut visited = HashSet::from([start]);
    let mut queue: VecDeque<(NodeIndex, usize)> = VecDeque::from([(start, 0)]);

    while let Some((current, depth)) = queue.pop_front() {
        if max_depth.is_some_and(|max| depth >= max) {
            continue;
        }

        let mut children: Vec<NodeIndex> = graph
            .edges_directed(current, Direction::Incoming)
            .map(|edge| edge.source())
            .collect();
        children.sort_by_key(|&index| graph[index]);

        for child in children {
            if visited.insert(child) {
                result.push((Dependency::new(graph[child], graph[current]), depth + 1));
                queue.push_back((child, depth + 1));
            }
        }
    }

    Ok(result)
}

/// Whether the graph contains any cycle, self-loops included.
pub(super) fn is_cyclic_impl(graph: &DiGraph<NodeId, ()>) -> bool {
    algo::is_cyclic_directed(graph)
}

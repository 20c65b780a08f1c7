//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use faultline::domain::{NewNode, NodeId};
use faultline::engine::LifecycleController;
use faultline::storage::in_memory::{new_in_memory_graph_store, new_in_memory_ledger};
use std::path::Path;
use std::process::{Command, Output};

/// Run the faultline binary in the specified directory
pub fn run_faultline_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_faultline"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute faultline binary")
}

/// Creation data for a live test node
pub fn node(name: &str, cost: f64) -> NewNode {
    NewNode {
        name: name.to_string(),
        node_type: "Test".to_string(),
        resilience_score: 100.0,
        is_critical: false,
        downtime_cost_per_hour: cost,
    }
}

/// In-memory controller with one node per name (IDs 1, 2, ... in order) and
/// the given `(child, parent)` edges, indexed into `names`.
pub async fn controller(names: &[&str], edges: &[(usize, usize)]) -> (LifecycleController, Vec<NodeId>) {
    let mut store = new_in_memory_graph_store();
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        ids.push(store.create(node(name, 10.0)).await.unwrap().id);
    }
    for &(child, parent) in edges {
        store.add_dependency(ids[child], ids[parent]).await.unwrap();
    }
    (LifecycleController::new(store, new_in_memory_ledger()), ids)
}

//! Integration tests for the kill/reset/update lifecycle, cascades, failover
//! and failure analytics, run against the in-memory stores.

use faultline::commands::seed;
use faultline::domain::{EventKind, FailureEvent, NewNode, NodeId, NodePatch, FULL_HEALTH};
use faultline::engine::{LifecycleController, MitigationPolicy};
use faultline::error::{Error, StorageError};
use faultline::storage::in_memory::{new_in_memory_graph_store, new_in_memory_ledger};
use faultline::storage::UnavailableStorage;
use rstest::rstest;

mod common;
use common::controller;

async fn kinds(ctl: &LifecycleController) -> Vec<(String, EventKind)> {
    ctl.ledger()
        .history()
        .await
        .unwrap()
        .into_iter()
        .map(|e| (e.node_name, e.kind))
        .collect()
}

async fn score(ctl: &LifecycleController, id: NodeId) -> f64 {
    ctl.store().get(id).await.unwrap().unwrap().resilience_score
}

async fn seeded() -> LifecycleController {
    let mut store = new_in_memory_graph_store();
    seed::seed(store.as_mut()).await.unwrap();
    LifecycleController::new(store, new_in_memory_ledger())
}

// ========== Cascade ==========

#[tokio::test]
async fn chain_fails_in_causal_order() {
    // C depends on B depends on A
    let (mut ctl, ids) = controller(&["A", "B", "C"], &[(1, 0), (2, 1)]).await;

    let outcome = ctl.kill(ids[0]).await.unwrap();

    for id in &ids {
        assert_eq!(score(&ctl, *id).await, 0.0);
    }
    assert_eq!(
        kinds(&ctl).await,
        vec![
            ("A".to_string(), EventKind::ManualKill),
            ("B".to_string(), EventKind::CascadeFailure),
            ("C".to_string(), EventKind::CascadeFailure),
        ]
    );
    let cascaded: Vec<&str> = outcome.cascaded.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(cascaded, ["B", "C"]);
}

#[tokio::test]
async fn killing_dead_node_changes_nothing() {
    let (mut ctl, ids) = controller(&["A", "B"], &[(1, 0)]).await;
    ctl.kill(ids[0]).await.unwrap();
    let before = ctl.store().list_all().await.unwrap();

    let outcome = ctl.kill(ids[0]).await.unwrap();

    assert!(!outcome.changed);
    assert!(outcome.cascaded.is_empty());
    assert_eq!(ctl.ledger().len().await.unwrap(), 2);
    assert_eq!(ctl.store().list_all().await.unwrap(), before);
}

#[tokio::test]
async fn two_node_cycle_terminates() {
    let (mut ctl, ids) = controller(&["A", "B"], &[(1, 0), (0, 1)]).await;

    ctl.kill(ids[0]).await.unwrap();

    assert_eq!(score(&ctl, ids[0]).await, 0.0);
    assert_eq!(score(&ctl, ids[1]).await, 0.0);
    assert_eq!(ctl.ledger().len().await.unwrap(), 2);
}

#[tokio::test]
async fn already_failed_dependents_are_not_walked() {
    // B depends on A, C depends on B; B is already down, so C survives.
    let (mut ctl, ids) = controller(&["A", "B", "C"], &[(1, 0), (2, 1)]).await;
    let b = ctl.store().get(ids[1]).await.unwrap().unwrap();
    ctl.update(
        ids[1],
        NodePatch {
            resilience_score: 0.0,
            ..NodePatch::from_node(&b)
        },
    )
    .await
    .unwrap();

    ctl.kill(ids[0]).await.unwrap();

    assert!(score(&ctl, ids[2]).await > 0.0);
    assert_eq!(ctl.ledger().len().await.unwrap(), 1);
}

#[tokio::test]
async fn independent_nodes_are_untouched() {
    let (mut ctl, ids) = controller(&["A", "B", "Other"], &[(1, 0)]).await;

    ctl.kill(ids[0]).await.unwrap();

    assert_eq!(score(&ctl, ids[2]).await, FULL_HEALTH);
    assert_eq!(ctl.ledger().len().await.unwrap(), 2);
}

// ========== Failover ==========

#[tokio::test]
async fn power_grid_failover_restores_plant() {
    let mut store = new_in_memory_graph_store();
    let grid = store
        .create(common::node("Regional Power Grid (Munich)", 1_000_000.0))
        .await
        .unwrap();
    let diesel = store
        .create(NewNode {
            resilience_score: 0.0,
            ..common::node("Diesel Generators (Backup)", 0.0)
        })
        .await
        .unwrap();
    let plant = store
        .create(common::node("Berlin Assembly Plant", 450_000.0))
        .await
        .unwrap();
    store.add_dependency(plant.id, grid.id).await.unwrap();
    let mut ctl = LifecycleController::new(store, new_in_memory_ledger());

    let outcome = ctl.kill(grid.id).await.unwrap();

    assert_eq!(score(&ctl, diesel.id).await, FULL_HEALTH);
    assert_eq!(score(&ctl, plant.id).await, FULL_HEALTH);
    assert_eq!(score(&ctl, grid.id).await, 0.0);

    let history = ctl.ledger().history().await.unwrap();
    let recoveries: Vec<&FailureEvent> = history
        .iter()
        .filter(|e| e.kind == EventKind::AutoRecovery)
        .collect();
    assert_eq!(recoveries.len(), 1);
    assert_eq!(recoveries[0].node_name, "Berlin Assembly Plant");
    assert_eq!(recoveries[0].cost_at_failure, 0.0);

    let mitigation = outcome.mitigation.unwrap();
    assert_eq!(mitigation.backup.id, diesel.id);
    assert_eq!(mitigation.victim.id, plant.id);
}

#[tokio::test]
async fn failover_runs_only_after_manual_kill() {
    // The grid fails by cascade, not by a manual kill: no rule fires.
    let (mut ctl, ids) = controller(
        &["Substation", "Power Grid", "Diesel Generators", "Berlin Assembly Plant"],
        &[(1, 0)],
    )
    .await;

    let outcome = ctl.kill(ids[0]).await.unwrap();

    assert!(outcome.mitigation.is_none());
    assert!(kinds(&ctl).await.iter().all(|(_, k)| *k != EventKind::AutoRecovery));
}

#[tokio::test]
async fn failover_with_missing_backup_is_skipped() {
    let (mut ctl, ids) = controller(&["AWS region", "Web Storefront"], &[(1, 0)]).await;

    let outcome = ctl.kill(ids[0]).await.unwrap();

    assert!(outcome.mitigation.is_none());
    assert_eq!(score(&ctl, ids[1]).await, 0.0);
}

#[tokio::test]
async fn disabled_policy_never_recovers() {
    let (ctl, ids) = controller(
        &["Power Grid", "Diesel Generators", "Berlin Assembly Plant"],
        &[(2, 0)],
    )
    .await;
    let mut ctl = ctl.with_policy(MitigationPolicy::disabled());

    ctl.kill(ids[0]).await.unwrap();

    assert_eq!(score(&ctl, ids[2]).await, 0.0);
}

#[rstest]
#[case::power_grid(3, &[7, 8, 9, 17, 10, 23, 28], 4, 7)]
#[case::aws(1, &[16, 18], 2, 16)]
#[case::port_of_hamburg(12, &[20, 22], 13, 20)]
#[tokio::test]
async fn seeded_scenario_kills(
    #[case] killed: u64,
    #[case] cascade: &[u64],
    #[case] backup: u64,
    #[case] victim: u64,
) {
    let mut ctl = seeded().await;

    let outcome = ctl.kill(NodeId(killed)).await.unwrap();

    let cascaded: Vec<u64> = outcome.cascaded.iter().map(|n| n.id.get()).collect();
    assert_eq!(cascaded, cascade);
    let mitigation = outcome.mitigation.unwrap();
    assert_eq!(mitigation.backup.id, NodeId(backup));
    assert_eq!(mitigation.victim.id, NodeId(victim));
    assert_eq!(score(&ctl, NodeId(victim)).await, FULL_HEALTH);
    // kill + cascades + one recovery
    assert_eq!(ctl.ledger().len().await.unwrap(), cascade.len() + 2);
}

// ========== Reset and update ==========

#[rstest]
#[case::alive(false)]
#[case::dead(true)]
#[tokio::test]
async fn reset_restores_full_health_without_events(#[case] kill_first: bool) {
    let (mut ctl, ids) = controller(&["A", "B"], &[(1, 0)]).await;
    if kill_first {
        ctl.kill(ids[0]).await.unwrap();
    }
    let events_before = ctl.ledger().len().await.unwrap();

    let node = ctl.reset(ids[0]).await.unwrap();

    assert_eq!(node.resilience_score, FULL_HEALTH);
    assert_eq!(ctl.ledger().len().await.unwrap(), events_before);
    if kill_first {
        // resets don't cascade
        assert_eq!(score(&ctl, ids[1]).await, 0.0);
    }
}

#[tokio::test]
async fn update_overwrites_fields_and_keeps_edges() {
    let (mut ctl, ids) = controller(&["A", "B", "C"], &[(1, 0), (2, 1)]).await;
    let before = ctl.store().get(ids[1]).await.unwrap().unwrap();
    let edges_before = ctl.store().list_dependencies().await.unwrap();

    let updated = ctl
        .update(
            ids[1],
            NodePatch {
                name: "B (renamed)".to_string(),
                downtime_cost_per_hour: 999.0,
                resilience_score: 42.0,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "B (renamed)");
    assert_eq!(updated.downtime_cost_per_hour, 999.0);
    assert_eq!(updated.resilience_score, 42.0);
    assert_eq!(updated.node_type, before.node_type);
    assert_eq!(updated.is_critical, before.is_critical);
    assert_eq!(ctl.store().list_dependencies().await.unwrap(), edges_before);
    assert_eq!(ctl.ledger().len().await.unwrap(), 0);
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let (mut ctl, _) = controller(&["A"], &[]).await;
    let missing = NodeId(404);

    assert!(ctl.kill(missing).await.unwrap_err().is_not_found());
    assert!(ctl.reset(missing).await.unwrap_err().is_not_found());
    let patch = NodePatch {
        name: "X".to_string(),
        downtime_cost_per_hour: 1.0,
        resilience_score: 1.0,
    };
    assert!(ctl.update(missing, patch).await.unwrap_err().is_not_found());
    assert!(ctl.impact(missing, None).await.unwrap_err().is_not_found());
    assert_eq!(ctl.ledger().len().await.unwrap(), 0);
}

#[tokio::test]
async fn update_checks_the_id_before_the_patch() {
    let (mut ctl, ids) = controller(&["A"], &[]).await;
    let invalid = NodePatch {
        name: "A".to_string(),
        downtime_cost_per_hour: 1.0,
        resilience_score: 150.0,
    };

    let err = ctl.update(NodeId(42), invalid.clone()).await.unwrap_err();
    assert!(err.is_not_found(), "got: {err:?}");

    let err = ctl.update(ids[0], invalid).await.unwrap_err();
    assert!(matches!(err, Error::InvalidNode(_)), "got: {err:?}");
}

// ========== Analytics ==========

#[tokio::test]
async fn top_failures_excludes_recoveries() {
    let mut ledger = new_in_memory_ledger();
    for (kind, cost) in [
        (EventKind::ManualKill, 100.0),
        (EventKind::CascadeFailure, 50.0),
        (EventKind::AutoRecovery, 0.0),
    ] {
        ledger
            .append(FailureEvent {
                node_id: None,
                node_name: "X".to_string(),
                kind,
                cost_at_failure: cost,
                timestamp: chrono::Utc::now(),
            })
            .await
            .unwrap();
    }
    let ctl = LifecycleController::new(new_in_memory_graph_store(), ledger);

    let stats = ctl.top_failures().await.unwrap();

    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].node_name, "X");
    assert_eq!(stats[0].failure_count, 2);
    assert_eq!(stats[0].total_lost, 150.0);
}

#[tokio::test]
async fn top_failures_ranks_by_count() {
    let (mut ctl, ids) = controller(&["Grid", "Plant"], &[(1, 0)]).await;
    ctl.kill(ids[1]).await.unwrap();
    ctl.reset(ids[1]).await.unwrap();
    ctl.kill(ids[0]).await.unwrap();

    let stats = ctl.top_failures().await.unwrap();

    assert_eq!(stats[0].node_name, "Plant");
    assert_eq!(stats[0].failure_count, 2);
    assert_eq!(stats[1].node_name, "Grid");
    assert_eq!(stats[1].failure_count, 1);
}

#[tokio::test]
async fn ledger_timestamps_never_decrease() {
    let mut ctl = seeded().await;
    ctl.kill(NodeId(3)).await.unwrap();
    ctl.kill(NodeId(1)).await.unwrap();

    let history = ctl.ledger().history().await.unwrap();

    assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[tokio::test]
async fn summary_after_grid_failure() {
    let mut ctl = seeded().await;
    ctl.kill(NodeId(3)).await.unwrap();

    let summary = ctl.summary().await.unwrap();

    assert_eq!(summary.total_nodes, 30);
    // grid plus six dependents; the plant was restored
    assert_eq!(summary.failed_nodes, 7);
    assert_eq!(summary.total_events, 9);
}

#[tokio::test]
async fn impact_is_a_dry_run() {
    let ctl = seeded().await;

    let report = ctl.impact(NodeId(3), None).await.unwrap();

    assert_eq!(report.dependents.len(), 7);
    assert_eq!(ctl.ledger().len().await.unwrap(), 0);
    assert!(ctl.store().get(NodeId(3)).await.unwrap().unwrap().is_alive());

    let shallow = ctl.impact(NodeId(3), Some(1)).await.unwrap();
    assert_eq!(shallow.dependents.len(), 4);
}

// ========== Store failures ==========

#[tokio::test]
async fn unavailable_storage_is_surfaced() {
    let mut ctl = LifecycleController::new(
        Box::new(UnavailableStorage::new()),
        Box::new(UnavailableStorage::new()),
    );

    let err = ctl.kill(NodeId(1)).await.unwrap_err();
    assert!(matches!(err, Error::Storage(StorageError::Unavailable(_))));
    assert!(ctl.top_failures().await.is_err());
    assert!(ctl.summary().await.is_err());
}

//! Integration tests for the `faultline` binary.
//!
//! These tests run the built CLI in temporary directories and check both the
//! files it writes and its `--json` output.

use rstest::{fixture, rstest};
use serde_json::Value;
use tempfile::TempDir;

mod common;
use common::run_faultline_in_dir;

// ============================================================================
// Test Fixtures
// ============================================================================

/// Provides a fresh temporary directory for each test
#[fixture]
fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Provides a workspace loaded with the demo scenario
#[fixture]
fn seeded_dir() -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp directory");
    let output = run_faultline_in_dir(temp.path(), &["init", "--seed", "--quiet"]);
    assert!(
        output.status.success(),
        "Failed to initialize faultline: {:?}",
        String::from_utf8_lossy(&output.stderr)
    );
    temp
}

fn json(dir: &TempDir, args: &[&str]) -> Value {
    let mut full = args.to_vec();
    full.push("--json");
    let output = run_faultline_in_dir(dir.path(), &full);
    assert!(
        output.status.success(),
        "faultline {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

// ============================================================================
// Init Command
// ============================================================================

#[rstest]
fn test_init_creates_workspace(temp_dir: TempDir) {
    let output = run_faultline_in_dir(temp_dir.path(), &["init", "--quiet"]);
    assert!(output.status.success(), "Init command should succeed");

    let faultline_dir = temp_dir.path().join(".faultline");
    assert!(faultline_dir.is_dir(), ".faultline should be a directory");
    for file in ["config.yaml", "nodes.jsonl", "events.jsonl", ".gitignore"] {
        assert!(faultline_dir.join(file).exists(), "{file} should exist");
    }

    let config = std::fs::read_to_string(faultline_dir.join("config.yaml")).unwrap();
    assert!(config.contains("backend: jsonl"), "got: {config}");
    assert!(config.contains("name_contains: Power Grid"), "got: {config}");
}

#[rstest]
fn test_init_fails_if_already_initialized(temp_dir: TempDir) {
    let first = run_faultline_in_dir(temp_dir.path(), &["init", "--quiet"]);
    assert!(first.status.success());

    let second = run_faultline_in_dir(temp_dir.path(), &["init", "--quiet"]);
    assert!(!second.status.success(), "Second init should fail");

    let stderr = String::from_utf8_lossy(&second.stderr);
    assert!(stderr.contains("already initialized"), "got: {stderr}");
}

#[rstest]
fn test_init_quiet_flag_suppresses_output(temp_dir: TempDir) {
    let output = run_faultline_in_dir(temp_dir.path(), &["init", "-q"]);

    assert!(output.status.success());
    assert!(output.stdout.is_empty(), "Quiet init should print nothing");
}

#[rstest]
fn test_init_reports_paths(temp_dir: TempDir) {
    let output = run_faultline_in_dir(temp_dir.path(), &["init"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Initialized faultline"), "got: {stdout}");
    assert!(stdout.contains("events.jsonl"), "got: {stdout}");
}

#[rstest]
fn test_commands_require_workspace(temp_dir: TempDir) {
    let output = run_faultline_in_dir(temp_dir.path(), &["list"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("faultline init"), "got: {stderr}");
}

// ============================================================================
// Scenario Commands
// ============================================================================

#[rstest]
fn test_seed_loads_scenario(seeded_dir: TempDir) {
    let nodes = json(&seeded_dir, &["list"]);
    assert_eq!(nodes.as_array().unwrap().len(), 30);

    let deps = json(&seeded_dir, &["deps"]);
    assert_eq!(deps.as_array().unwrap().len(), 15);
}

#[rstest]
fn test_seed_refuses_to_replace_without_force(seeded_dir: TempDir) {
    let output = run_faultline_in_dir(seeded_dir.path(), &["seed"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--force"));

    let output = run_faultline_in_dir(seeded_dir.path(), &["seed", "--force"]);
    assert!(output.status.success());
}

#[rstest]
fn test_kill_cascades_and_persists(seeded_dir: TempDir) {
    let outcome = json(&seeded_dir, &["kill", "3"]);

    assert_eq!(outcome["changed"], true);
    assert_eq!(outcome["cascaded"].as_array().unwrap().len(), 7);
    assert_eq!(outcome["mitigation"]["victim"]["name"], "Berlin Assembly Plant");

    let history = json(&seeded_dir, &["history"]);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 9);
    assert_eq!(history[0]["kind"], "MANUAL_KILL");
    assert_eq!(history[8]["kind"], "AUTO_RECOVERY");

    let failed = json(&seeded_dir, &["list", "--failed"]);
    assert_eq!(failed.as_array().unwrap().len(), 7);

    let again = json(&seeded_dir, &["kill", "3"]);
    assert_eq!(again["changed"], false);
    assert_eq!(json(&seeded_dir, &["history"]).as_array().unwrap().len(), 9);
}

#[rstest]
fn test_reset_and_update(seeded_dir: TempDir) {
    json(&seeded_dir, &["kill", "5"]);

    let reset = json(&seeded_dir, &["reset", "5"]);
    assert_eq!(reset["resilience_score"], 100.0);

    let updated = json(&seeded_dir, &["update", "5", "--name", "Corporate VPN", "--score", "60"]);
    assert_eq!(updated["name"], "Corporate VPN");
    assert_eq!(updated["resilience_score"], 60.0);
    assert_eq!(updated["downtime_cost_per_hour"], 5000.0);

    let shown = json(&seeded_dir, &["show", "5"]);
    assert_eq!(shown["node"]["name"], "Corporate VPN");
    assert_eq!(shown["dependents"].as_array().unwrap().len(), 2);
}

#[rstest]
fn test_add_and_link(seeded_dir: TempDir) {
    let added = json(
        &seeded_dir,
        &["add", "--name", "Backup Data Center", "--type", "IT_Infrastructure", "--cost", "40000"],
    );
    assert_eq!(added["id"], 31);

    let linked = json(&seeded_dir, &["link", "31", "1"]);
    assert_eq!(linked["cyclic"], false);

    let impact = json(&seeded_dir, &["impact", "1"]);
    assert_eq!(impact["dependents"].as_array().unwrap().len(), 3);
}

#[rstest]
fn test_link_unknown_node_fails(seeded_dir: TempDir) {
    let output = run_faultline_in_dir(seeded_dir.path(), &["link", "99", "1"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not found"));
}

#[rstest]
fn test_stats_rank_failures(seeded_dir: TempDir) {
    json(&seeded_dir, &["kill", "15"]);
    json(&seeded_dir, &["reset", "15"]);
    json(&seeded_dir, &["reset", "12"]);
    json(&seeded_dir, &["kill", "15"]);

    let stats = json(&seeded_dir, &["stats", "--top", "1"]);

    let top = stats["top_failures"].as_array().unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0]["failure_count"], 2);
    assert_eq!(stats["summary"]["total_nodes"], 30);
}

#[rstest]
fn test_text_output_without_colors(seeded_dir: TempDir) {
    let output = run_faultline_in_dir(seeded_dir.path(), &["impact", "3"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("#3 Regional Power Grid (Munich)"), "got: {stdout}");
    assert!(!stdout.contains("\x1b["), "NO_COLOR should disable ANSI codes");
}

//! Command execution logic.
//!
//! This module contains the implementation of all CLI commands. Commands
//! that change the graph or the ledger save both stores before printing.

use anyhow::{Context, Result};

use super::args::{
    AddArgs, HistoryArgs, ImpactArgs, InitArgs, KillArgs, LinkArgs, ListArgs, ResetArgs, SeedArgs,
    ShowArgs, StatsArgs, UpdateArgs,
};
use crate::app::App;
use crate::domain::{Dependency, NewNode, Node, NodeId, NodePatch};
use crate::error::Error;
use crate::output::{self, OutputMode};
use crate::storage::GraphStore;

/// Execute the init command
pub async fn execute_init(args: &InitArgs, output_mode: OutputMode) -> Result<()> {
    use crate::commands::{init, seed};

    let current_dir = std::env::current_dir()?;
    let result = init::init(&current_dir).await?;

    let seeded = if args.seed {
        let mut app = App::from_directory(&current_dir).await?;
        let seeded = seed::seed(app.controller_mut().store_mut()).await?;
        app.save().await?;
        Some(seeded)
    } else {
        None
    };

    match output_mode {
        OutputMode::Json => {
            output::print_json(&serde_json::json!({
                "faultline_dir": result.faultline_dir.display().to_string(),
                "config_file": result.config_file.display().to_string(),
                "nodes_file": result.nodes_file.display().to_string(),
                "events_file": result.events_file.display().to_string(),
                "seeded_nodes": seeded.map(|s| s.nodes),
            }))?;
        }
        OutputMode::Text if !args.quiet => {
            println!("Initialized faultline in {}", result.faultline_dir.display());
            println!("  Config: {}", result.config_file.display());
            println!("  Nodes:  {}", result.nodes_file.display());
            println!("  Events: {}", result.events_file.display());
            if let Some(seeded) = seeded {
                println!(
                    "Loaded demo scenario: {} nodes, {} dependencies",
                    seeded.nodes, seeded.dependencies
                );
            }
        }
        OutputMode::Text => {}
    }

    Ok(())
}

/// Execute the seed command
pub async fn execute_seed(app: &mut App, args: &SeedArgs, output_mode: OutputMode) -> Result<()> {
    use crate::commands::seed;

    let existing = app.controller().store().list_all().await?.len();
    if existing > 0 && !args.force {
        anyhow::bail!(
            "The graph already has {existing} node(s). Use --force to replace it with the demo scenario."
        );
    }

    let result = seed::seed(app.controller_mut().store_mut()).await?;
    app.save().await?;

    match output_mode {
        OutputMode::Json => {
            output::print_json(&serde_json::json!({
                "nodes": result.nodes,
                "dependencies": result.dependencies,
                "replaced": existing,
            }))?;
        }
        OutputMode::Text => {
            println!(
                "Loaded demo scenario: {} nodes, {} dependencies",
                result.nodes, result.dependencies
            );
        }
    }

    Ok(())
}

/// Execute the info command
pub async fn execute_info(app: &App, output_mode: OutputMode) -> Result<()> {
    let controller = app.controller();
    let summary = controller.summary().await?;
    let edges = controller.store().list_dependencies().await?.len();
    let cyclic = controller.store().is_cyclic().await?;
    let rules = controller.policy().rules();

    let path_of = |backend: &crate::storage::StorageBackend| {
        backend
            .data_path()
            .map_or_else(|| "(in memory)".to_string(), |p| p.display().to_string())
    };

    match output_mode {
        OutputMode::Json => {
            output::print_json(&serde_json::json!({
                "faultline_dir": app.faultline_dir().display().to_string(),
                "nodes_file": path_of(app.nodes_backend()),
                "events_file": path_of(app.events_backend()),
                "nodes": summary.total_nodes,
                "dependencies": edges,
                "cyclic": cyclic,
                "events": summary.total_events,
                "mitigation_rules": rules,
            }))?;
        }
        OutputMode::Text => {
            println!("Faultline Workspace Information");
            println!("==============================");
            println!();
            println!("Nodes file:  {}", path_of(app.nodes_backend()));
            println!("Events file: {}", path_of(app.events_backend()));
            println!();
            println!(
                "Graph: {} node(s), {} dependency edge(s){}",
                summary.total_nodes,
                edges,
                if cyclic { ", contains cycles" } else { "" }
            );
            println!("Ledger: {} event(s)", summary.total_events);
            println!();
            if rules.is_empty() {
                println!("Failover rules: none");
            } else {
                println!("Failover rules:");
                for rule in rules {
                    println!(
                        "  when {} fails: activate {}, restore {}",
                        rule.trigger, rule.backup, rule.victim
                    );
                }
            }
        }
    }

    Ok(())
}

/// Execute the list command
pub async fn execute_list(app: &App, args: &ListArgs, output_mode: OutputMode) -> Result<()> {
    let filter = args.filter();
    let nodes: Vec<Node> = app
        .controller()
        .store()
        .list_all()
        .await?
        .into_iter()
        .filter(|n| filter.matches(n))
        .collect();

    output::print_nodes(&nodes, output_mode)?;
    Ok(())
}

/// Look up the nodes behind a set of IDs, skipping IDs that no longer exist.
async fn resolve_nodes(store: &dyn GraphStore, ids: impl IntoIterator<Item = NodeId>) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    for id in ids {
        if let Some(node) = store.get(id).await? {
            nodes.push(node);
        }
    }
    Ok(nodes)
}

/// Execute the show command
pub async fn execute_show(app: &App, args: &ShowArgs, output_mode: OutputMode) -> Result<()> {
    let store = app.controller().store();
    let node = store
        .get(args.node_id)
        .await?
        .ok_or(Error::NodeNotFound(args.node_id))?;

    let parents = store.list_parents_of(node.id).await?;
    let children = store.list_children_of(node.id).await?;
    let depends_on = resolve_nodes(store, parents.iter().map(|d| d.depends_on_id)).await?;
    let dependents = resolve_nodes(store, children.iter().map(|d| d.node_id)).await?;

    output::print_node_details(&node, &depends_on, &dependents, output_mode)?;
    Ok(())
}

/// Execute the add command
pub async fn execute_add(app: &mut App, args: &AddArgs, output_mode: OutputMode) -> Result<()> {
    let node = app
        .controller_mut()
        .store_mut()
        .create(NewNode {
            name: args.name.clone(),
            node_type: args.node_type.clone(),
            resilience_score: args.score,
            is_critical: args.critical,
            downtime_cost_per_hour: args.cost,
        })
        .await?;
    app.save().await?;

    if output_mode == OutputMode::Text {
        println!("Added node #{}", node.id);
    }
    output::print_node(&node, output_mode)?;
    Ok(())
}

/// Execute the link command
pub async fn execute_link(app: &mut App, args: &LinkArgs, output_mode: OutputMode) -> Result<()> {
    app.controller_mut()
        .store_mut()
        .add_dependency(args.child, args.parent)
        .await
        .with_context(|| format!("Failed to link #{} to #{}", args.child, args.parent))?;
    app.save().await?;

    let cyclic = app.controller().store().is_cyclic().await?;
    if cyclic {
        tracing::warn!(child = %args.child, parent = %args.parent, "dependency graph now contains a cycle");
    }

    match output_mode {
        OutputMode::Json => {
            output::print_json(&serde_json::json!({
                "dependency": Dependency::new(args.child, args.parent),
                "cyclic": cyclic,
            }))?;
        }
        OutputMode::Text => {
            println!("#{} now depends on #{}", args.child, args.parent);
        }
    }

    Ok(())
}

/// Execute the deps command
pub async fn execute_deps(app: &App, output_mode: OutputMode) -> Result<()> {
    let store = app.controller().store();
    let deps = store.list_dependencies().await?;
    let nodes = store.list_all().await?;

    output::print_dependencies(&deps, &nodes, output_mode)?;
    Ok(())
}

/// Execute the kill command
pub async fn execute_kill(app: &mut App, args: &KillArgs, output_mode: OutputMode) -> Result<()> {
    let outcome = app.controller_mut().kill(args.node_id).await?;
    if outcome.changed {
        app.save().await?;
    }

    output::print_kill_outcome(&outcome, output_mode)?;
    Ok(())
}

/// Execute the reset command
pub async fn execute_reset(app: &mut App, args: &ResetArgs, output_mode: OutputMode) -> Result<()> {
    let node = app.controller_mut().reset(args.node_id).await?;
    app.save().await?;

    if output_mode == OutputMode::Text {
        println!("Restored #{} to full health", node.id);
    }
    output::print_node(&node, output_mode)?;
    Ok(())
}

/// Execute the update command
///
/// Unspecified fields keep their current values, then the full patch is
/// applied.
pub async fn execute_update(app: &mut App, args: &UpdateArgs, output_mode: OutputMode) -> Result<()> {
    if args.name.is_none() && args.cost.is_none() && args.score.is_none() {
        anyhow::bail!("Nothing to update. Pass at least one of --name, --cost or --score.");
    }

    let current = app
        .controller()
        .store()
        .get(args.node_id)
        .await?
        .ok_or(Error::NodeNotFound(args.node_id))?;

    let base = NodePatch::from_node(&current);
    let patch = NodePatch {
        name: args.name.clone().unwrap_or(base.name),
        downtime_cost_per_hour: args.cost.unwrap_or(base.downtime_cost_per_hour),
        resilience_score: args.score.unwrap_or(base.resilience_score),
    };

    let node = app.controller_mut().update(args.node_id, patch).await?;
    app.save().await?;

    if output_mode == OutputMode::Text {
        println!("Updated #{}", node.id);
    }
    output::print_node(&node, output_mode)?;
    Ok(())
}

/// Execute the impact command
pub async fn execute_impact(app: &App, args: &ImpactArgs, output_mode: OutputMode) -> Result<()> {
    let report = app.controller().impact(args.node_id, args.depth).await?;
    output::print_impact(&report, output_mode)?;
    Ok(())
}

/// Execute the history command
pub async fn execute_history(app: &App, args: &HistoryArgs, output_mode: OutputMode) -> Result<()> {
    let mut events = app.controller().ledger().history().await?;
    if let Some(limit) = args.limit {
        let skip = events.len().saturating_sub(limit);
        events.drain(..skip);
    }

    output::print_history(&events, output_mode)?;
    Ok(())
}

/// Execute the stats command
pub async fn execute_stats(app: &App, args: &StatsArgs, output_mode: OutputMode) -> Result<()> {
    let controller = app.controller();
    let summary = controller.summary().await?;
    let top = controller.top_failures_limited(args.top).await?;

    output::print_stats(&summary, &top, output_mode)?;
    Ok(())
}

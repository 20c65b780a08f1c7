//! CLI argument structs for all commands.
//!
//! Each command has its own argument struct with clap derive attributes
//! for parsing and validation.

use clap::Parser;

use super::validators::{validate_category, validate_cost, validate_name, validate_node_id, validate_score};
use crate::domain::{NodeFilter, NodeId};

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Load the demo enterprise scenario after initializing
    #[arg(long)]
    pub seed: bool,

    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `seed` command
#[derive(Parser, Debug, Clone)]
pub struct SeedArgs {
    /// Replace a graph that already has nodes
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the `list` command
#[derive(Parser, Debug, Clone)]
pub struct ListArgs {
    /// Only nodes of this category (case-insensitive)
    #[arg(short = 't', long = "type")]
    pub node_type: Option<String>,

    /// Only failed nodes
    #[arg(long)]
    pub failed: bool,

    /// Only nodes flagged critical
    #[arg(long)]
    pub critical: bool,
}

impl ListArgs {
    /// The node filter these flags describe
    #[must_use]
    pub fn filter(&self) -> NodeFilter {
        NodeFilter {
            node_type: self.node_type.clone(),
            failed_only: self.failed,
            critical_only: self.critical,
        }
    }
}

/// Arguments for the `show` command
#[derive(Parser, Debug, Clone)]
pub struct ShowArgs {
    /// Node ID to show
    #[arg(value_parser = validate_node_id)]
    pub node_id: NodeId,
}

/// Arguments for the `add` command
#[derive(Parser, Debug, Clone)]
pub struct AddArgs {
    /// Display name
    #[arg(short, long, value_parser = validate_name)]
    pub name: String,

    /// Category label (e.g. `IT_Infrastructure`)
    #[arg(short = 't', long = "type", value_parser = validate_category)]
    pub node_type: String,

    /// Downtime cost per hour
    #[arg(short, long, value_parser = validate_cost)]
    pub cost: f64,

    /// Initial resilience score (0-100)
    #[arg(short, long, value_parser = validate_score, default_value = "100")]
    pub score: f64,

    /// Flag the node as a single point of failure
    #[arg(long)]
    pub critical: bool,
}

/// Arguments for the `link` command
#[derive(Parser, Debug, Clone)]
pub struct LinkArgs {
    /// The dependent node (fails when the parent fails)
    #[arg(value_parser = validate_node_id)]
    pub child: NodeId,

    /// The node it depends on
    #[arg(value_parser = validate_node_id)]
    pub parent: NodeId,
}

/// Arguments for the `kill` command
#[derive(Parser, Debug, Clone)]
pub struct KillArgs {
    /// Node ID to kill
    #[arg(value_parser = validate_node_id)]
    pub node_id: NodeId,
}

/// Arguments for the `reset` command
#[derive(Parser, Debug, Clone)]
pub struct ResetArgs {
    /// Node ID to restore to full health
    #[arg(value_parser = validate_node_id)]
    pub node_id: NodeId,
}

/// Arguments for the `update` command
///
/// Fields left out keep their current values.
#[derive(Parser, Debug, Clone)]
pub struct UpdateArgs {
    /// Node ID to update
    #[arg(value_parser = validate_node_id)]
    pub node_id: NodeId,

    /// New display name
    #[arg(short, long, value_parser = validate_name)]
    pub name: Option<String>,

    /// New downtime cost per hour
    #[arg(short, long, value_parser = validate_cost)]
    pub cost: Option<f64>,

    /// New resilience score (0-100)
    #[arg(short, long, value_parser = validate_score)]
    pub score: Option<f64>,
}

/// Arguments for the `impact` command
#[derive(Parser, Debug, Clone)]
pub struct ImpactArgs {
    /// Node whose failure to simulate
    #[arg(value_parser = validate_node_id)]
    pub node_id: NodeId,

    /// Maximum depth to follow dependents
    #[arg(short, long)]
    pub depth: Option<usize>,
}

/// Arguments for the `history` command
#[derive(Parser, Debug, Clone)]
pub struct HistoryArgs {
    /// Show only the most recent N events
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

/// Arguments for the `stats` command
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    /// Number of node names in the top failures ranking
    #[arg(short, long, default_value = "5")]
    pub top: usize,
}

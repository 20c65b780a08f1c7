//! CLI argument parsing and command dispatch.
//!
//! This module provides the command-line interface for faultline using clap's
//! derive API. Each command has its own argument struct with validation and
//! helpful error messages.
//!
//! # Commands
//!
//! - `init`: Create a `.faultline/` workspace
//! - `seed`: Load the demo enterprise scenario
//! - `list` / `show` / `deps`: Inspect the dependency graph
//! - `add` / `link` / `update`: Edit the scenario
//! - `kill` / `reset`: Fail a node (with cascade and failover) or restore it
//! - `impact`: Dry-run what a failure would reach
//! - `history` / `stats`: Read the failure ledger
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//!
//! # Example
//!
//! ```bash
//! faultline init --seed
//! faultline impact 3
//! faultline kill 3
//! faultline stats --top 3
//! ```

mod args;
mod execute;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use args::{
    AddArgs, HistoryArgs, ImpactArgs, InitArgs, KillArgs, LinkArgs, ListArgs, ResetArgs, SeedArgs,
    ShowArgs, StatsArgs, UpdateArgs,
};

pub use validators::{validate_category, validate_cost, validate_name, validate_node_id, validate_score};

/// Faultline - simulate outages across an infrastructure dependency graph
///
/// Kill a node and watch the failure cascade to everything that depends on
/// it, with automated failover restoring what it can. Every transition is
/// recorded in `.faultline/events.jsonl`.
#[derive(Parser, Debug)]
#[command(name = "faultline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a new faultline workspace
    ///
    /// Creates the `.faultline/` directory with configuration, an empty node
    /// graph and an empty event ledger.
    Init(InitArgs),

    /// Load the demo enterprise scenario
    ///
    /// Replaces the graph with 30 nodes and 15 dependencies. The event ledger
    /// is kept.
    Seed(SeedArgs),

    /// Show workspace information
    ///
    /// Displays storage paths, graph size and the active failover rules.
    Info,

    /// List nodes with optional filters
    List(ListArgs),

    /// Show a node with its dependencies and dependents
    Show(ShowArgs),

    /// Add a node to the graph
    Add(AddArgs),

    /// Make one node depend on another
    ///
    /// The child fails whenever the parent fails.
    Link(LinkArgs),

    /// List every dependency edge
    Deps,

    /// Kill a node
    ///
    /// Sets its score to 0, cascades the failure to every live dependent and
    /// runs the first matching failover rule.
    Kill(KillArgs),

    /// Restore a node to full health
    ///
    /// Dependents are not restored and no event is recorded.
    Reset(ResetArgs),

    /// Edit a node's name, cost or score
    ///
    /// Fields left out keep their current values. No cascade runs and no event
    /// is recorded.
    Update(UpdateArgs),

    /// Show what killing a node would reach, without killing it
    Impact(ImpactArgs),

    /// Show the failure ledger, oldest first
    History(HistoryArgs),

    /// Show scenario statistics and the most frequent failures
    Stats(StatsArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    #[must_use]
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    ///
    /// # Errors
    ///
    /// Returns the clap error for invalid arguments.
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command
    ///
    /// # Errors
    ///
    /// Returns any workspace, storage or output failure.
    pub async fn execute(&self) -> Result<()> {
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        let Some(command) = &self.command else {
            println!("Faultline - dependency-graph outage simulator");
            println!();
            println!("Run 'faultline --help' for usage information.");
            println!("Run 'faultline init --seed' to start with the demo scenario.");
            return Ok(());
        };

        match command {
            Commands::Init(args) => execute::execute_init(args, output_mode).await,
            Commands::Seed(args) => {
                let mut app = open_app().await?;
                execute::execute_seed(&mut app, args, output_mode).await
            }
            Commands::Info => execute::execute_info(&open_app().await?, output_mode).await,
            Commands::List(args) => execute::execute_list(&open_app().await?, args, output_mode).await,
            Commands::Show(args) => execute::execute_show(&open_app().await?, args, output_mode).await,
            Commands::Add(args) => {
                let mut app = open_app().await?;
                execute::execute_add(&mut app, args, output_mode).await
            }
            Commands::Link(args) => {
                let mut app = open_app().await?;
                execute::execute_link(&mut app, args, output_mode).await
            }
            Commands::Deps => execute::execute_deps(&open_app().await?, output_mode).await,
            Commands::Kill(args) => {
                let mut app = open_app().await?;
                execute::execute_kill(&mut app, args, output_mode).await
            }
            Commands::Reset(args) => {
                let mut app = open_app().await?;
                execute::execute_reset(&mut app, args, output_mode).await
            }
            Commands::Update(args) => {
                let mut app = open_app().await?;
                execute::execute_update(&mut app, args, output_mode).await
            }
            Commands::Impact(args) => {
                execute::execute_impact(&open_app().await?, args, output_mode).await
            }
            Commands::History(args) => {
                execute::execute_history(&open_app().await?, args, output_mode).await
            }
            Commands::Stats(args) => execute::execute_stats(&open_app().await?, args, output_mode).await,
        }
    }
}

/// Open the workspace containing the current directory.
async fn open_app() -> Result<crate::app::App> {
    Ok(crate::app::App::from_directory(&std::env::current_dir()?).await?)
}

//! Output formatting for CLI commands.
//!
//! Every printer renders either human-readable text or JSON for programmatic
//! use. Text writers are generic over [`Write`] so they can be tested against
//! an in-memory buffer.
//!
//! Submodules:
//! - [`color`]: Color and styling helpers (semantic colors, icons)
//! - [`tree`]: Impact tree rendering with ASCII/Unicode connectors

pub mod color;
pub mod tree;

use crate::domain::{Dependency, FailureEvent, FailureStats, Node, NodeId};
use crate::engine::{ImpactReport, ImpactSummary, KillOutcome};
use serde::Serialize;
use std::collections::HashMap;
use std::env;
use std::io::{self, Write};

pub use color::{error, info, success, warning};
pub use tree::ImpactTreeNode;

use color::{bold, colored_health_icon, colorize_health, colorize_id, colorize_kind, critical_marker, dimmed};

// ============================================================================
// Output Configuration
// ============================================================================

const DEFAULT_TERMINAL_WIDTH: usize = 80;
const DEFAULT_MAX_CONTENT_WIDTH: usize = 80;

/// Configuration for output formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Maximum content width for text wrapping.
    pub max_width: usize,
    /// Whether to use ASCII-only icons instead of Unicode.
    pub use_ascii: bool,
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create a new `OutputConfig` with explicit values.
    #[must_use]
    pub fn new(max_width: usize, use_ascii: bool, use_colors: bool) -> Self {
        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }

    /// Create an `OutputConfig` by reading from environment variables.
    ///
    /// Reads:
    /// - `FAULTLINE_MAX_WIDTH`: Maximum content width (default: 80)
    /// - `FAULTLINE_ASCII`: Set to "1" or "true" for ASCII-only icons
    /// - `NO_COLOR`: Standard env var to disable colors (any value disables colors)
    /// - `FAULTLINE_COLOR`: Set to "0" or "false" to disable colors
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_width = match lookup("FAULTLINE_MAX_WIDTH") {
            Some(s) if !s.is_empty() => match s.parse() {
                Ok(width) => width,
                Err(_) => {
                    tracing::warn!(
                        env_var = "FAULTLINE_MAX_WIDTH",
                        value = %s,
                        default = DEFAULT_MAX_CONTENT_WIDTH,
                        "Invalid value, using default"
                    );
                    DEFAULT_MAX_CONTENT_WIDTH
                }
            },
            _ => DEFAULT_MAX_CONTENT_WIDTH,
        };

        let use_ascii = match lookup("FAULTLINE_ASCII") {
            Some(v) if v == "1" || v.eq_ignore_ascii_case("true") => true,
            Some(v) if v == "0" || v.eq_ignore_ascii_case("false") || v.is_empty() => false,
            Some(v) => {
                tracing::warn!(
                    env_var = "FAULTLINE_ASCII",
                    value = %v,
                    "Invalid value (expected '1', 'true', '0', or 'false'), using default"
                );
                false
            }
            None => false,
        };

        // https://no-color.org/
        let use_colors = lookup("NO_COLOR").is_none()
            && lookup("FAULTLINE_COLOR").is_none_or(|v| v != "0" && !v.eq_ignore_ascii_case("false"));

        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_CONTENT_WIDTH,
            use_ascii: false,
            use_colors: true,
        }
    }
}

/// Get the current terminal width, falling back to default if detection fails.
fn get_terminal_width() -> usize {
    terminal_size::terminal_size().map_or(DEFAULT_TERMINAL_WIDTH, |(w, _)| usize::from(w.0))
}

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

// ============================================================================
// Public Dispatch Functions
// ============================================================================

/// Print a single node
///
/// # Errors
///
/// Returns any stdout write failure.
pub fn print_node(node: &Node, mode: OutputMode) -> io::Result<()> {
    let mut handle = io::stdout().lock();
    let config = OutputConfig::from_env();

    match mode {
        OutputMode::Text => print_node_text(&mut handle, node, &config),
        OutputMode::Json => write_json(&mut handle, node),
    }
}

/// Print a list of nodes
///
/// # Errors
///
/// Returns any stdout write failure.
pub fn print_nodes(nodes: &[Node], mode: OutputMode) -> io::Result<()> {
    let mut handle = io::stdout().lock();
    let config = OutputConfig::from_env();

    match mode {
        OutputMode::Text => print_nodes_text(&mut handle, nodes, &config),
        OutputMode::Json => write_json(&mut handle, &nodes),
    }
}

/// Print a node with the nodes it depends on and the nodes depending on it
///
/// # Errors
///
/// Returns any stdout write failure.
pub fn print_node_details(
    node: &Node,
    depends_on: &[Node],
    dependents: &[Node],
    mode: OutputMode,
) -> io::Result<()> {
    let mut handle = io::stdout().lock();
    let config = OutputConfig::from_env();

    match mode {
        OutputMode::Text => print_node_details_text(&mut handle, node, depends_on, dependents, &config),
        OutputMode::Json => write_json(
            &mut handle,
            &serde_json::json!({
                "node": node,
                "health": node.health(),
                "depends_on": depends_on,
                "dependents": dependents,
            }),
        ),
    }
}

/// Print every dependency edge with the names of both ends
///
/// # Errors
///
/// Returns any stdout write failure.
pub fn print_dependencies(deps: &[Dependency], nodes: &[Node], mode: OutputMode) -> io::Result<()> {
    let mut handle = io::stdout().lock();
    let config = OutputConfig::from_env();

    match mode {
        OutputMode::Text => print_dependencies_text(&mut handle, deps, nodes, &config),
        OutputMode::Json => write_json(&mut handle, &deps),
    }
}

/// Print the result of a kill
///
/// # Errors
///
/// Returns any stdout write failure.
pub fn print_kill_outcome(outcome: &KillOutcome, mode: OutputMode) -> io::Result<()> {
    let mut handle = io::stdout().lock();
    let config = OutputConfig::from_env();

    match mode {
        OutputMode::Text => print_kill_outcome_text(&mut handle, outcome, &config),
        OutputMode::Json => write_json(&mut handle, outcome),
    }
}

/// Print the dry-run impact of killing a node
///
/// # Errors
///
/// Returns any stdout write failure.
pub fn print_impact(report: &ImpactReport, mode: OutputMode) -> io::Result<()> {
    let mut handle = io::stdout().lock();
    let config = OutputConfig::from_env();

    match mode {
        OutputMode::Text => {
            let tree = ImpactTreeNode::from_report(report);
            tree::print_impact_tree_text(&mut handle, &tree, &config)?;
            writeln!(handle)?;
            writeln!(
                handle,
                "{} {} dependent(s), {}/h at risk",
                dimmed("Impact:", &config),
                report.dependents.len(),
                color::error(&format_money(report.cost_at_risk), &config)
            )
        }
        OutputMode::Json => write_json(&mut handle, report),
    }
}

/// Print ledger events, oldest first
///
/// # Errors
///
/// Returns any stdout write failure.
pub fn print_history(events: &[FailureEvent], mode: OutputMode) -> io::Result<()> {
    let mut handle = io::stdout().lock();
    let config = OutputConfig::from_env();

    match mode {
        OutputMode::Text => print_history_text(&mut handle, events, &config),
        OutputMode::Json => write_json(&mut handle, &events),
    }
}

/// Print the scenario summary and the most frequently failing nodes
///
/// # Errors
///
/// Returns any stdout write failure.
pub fn print_stats(summary: &ImpactSummary, top: &[FailureStats], mode: OutputMode) -> io::Result<()> {
    let mut handle = io::stdout().lock();
    let config = OutputConfig::from_env();

    match mode {
        OutputMode::Text => print_stats_text(&mut handle, summary, top, &config),
        OutputMode::Json => write_json(
            &mut handle,
            &serde_json::json!({
                "summary": summary,
                "top_failures": top,
            }),
        ),
    }
}

/// Print a simple message
///
/// # Errors
///
/// Returns any stdout write failure.
pub fn print_message(msg: &str) -> io::Result<()> {
    writeln!(io::stdout().lock(), "{msg}")
}

/// Print a JSON-formatted result for any serializable value
///
/// # Errors
///
/// Returns a serialization or stdout write failure.
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    write_json(&mut io::stdout().lock(), value)
}

fn write_json<W: Write, T: Serialize + ?Sized>(w: &mut W, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(w, "{json}")
}

// ============================================================================
// Text Formatting
// ============================================================================

/// Format an amount with thousands separators, rounded to whole units.
#[must_use]
pub fn format_money(amount: f64) -> String {
    let rounded = format!("{:.0}", amount.abs());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (i, digit) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if amount < 0.0 && rounded != "0" {
        grouped.insert(0, '-');
    }
    grouped
}

fn node_line(node: &Node, config: &OutputConfig) -> String {
    let marker = critical_marker(node.is_critical, config);
    let marker = if marker.is_empty() {
        marker
    } else {
        format!(" {marker}")
    };
    format!(
        "{} {}  {}{}  {}",
        colored_health_icon(node.health(), config),
        colorize_id(node.id, config),
        node.name,
        marker,
        dimmed(&format!("[{}]", node.node_type), config)
    )
}

fn print_node_text<W: Write>(w: &mut W, node: &Node, config: &OutputConfig) -> io::Result<()> {
    writeln!(w, "{}", node_line(node, config))?;
    writeln!(
        w,
        "  {} {:.1} ({})    {} {}/h",
        dimmed("Score:", config),
        node.resilience_score,
        colorize_health(node.health(), config),
        dimmed("Cost:", config),
        format_money(node.downtime_cost_per_hour)
    )
}

fn print_nodes_text<W: Write>(w: &mut W, nodes: &[Node], config: &OutputConfig) -> io::Result<()> {
    if nodes.is_empty() {
        writeln!(w, "No nodes found.")?;
        return Ok(());
    }

    writeln!(w, "Found {} node(s):", nodes.len())?;
    writeln!(w)?;

    for node in nodes {
        writeln!(w, "{}", node_line(node, config))?;
    }

    Ok(())
}

fn print_node_details_text<W: Write>(
    w: &mut W,
    node: &Node,
    depends_on: &[Node],
    dependents: &[Node],
    config: &OutputConfig,
) -> io::Result<()> {
    let content_width = get_terminal_width().min(config.max_width);

    writeln!(
        w,
        "{} {}: {}",
        colored_health_icon(node.health(), config),
        colorize_id(node.id, config),
        node.name
    )?;
    writeln!(
        w,
        "{} {}    {} {:.1} ({})    {} {}",
        dimmed("Type:", config),
        node.node_type,
        dimmed("Score:", config),
        node.resilience_score,
        colorize_health(node.health(), config),
        dimmed("Critical:", config),
        if node.is_critical { "yes" } else { "no" }
    )?;
    writeln!(
        w,
        "{} {}/h",
        dimmed("Downtime cost:", config),
        format_money(node.downtime_cost_per_hour)
    )?;

    print_node_section(w, "Depends on", depends_on, content_width, config)?;
    print_node_section(w, "Dependents", dependents, content_width, config)
}

/// Print a titled, wrapped list of node references. Empty lists print nothing.
fn print_node_section<W: Write>(
    w: &mut W,
    title: &str,
    nodes: &[Node],
    width: usize,
    config: &OutputConfig,
) -> io::Result<()> {
    if nodes.is_empty() {
        return Ok(());
    }
    writeln!(w)?;
    writeln!(w, "{} ({}):", bold(title, config), nodes.len())?;
    let listing = nodes
        .iter()
        .map(|n| format!("#{} {}", n.id, n.name))
        .collect::<Vec<_>>()
        .join(", ");
    for line in wrap_text(&listing, width.saturating_sub(2)) {
        writeln!(w, "  {line}")?;
    }
    Ok(())
}

fn print_dependencies_text<W: Write>(
    w: &mut W,
    deps: &[Dependency],
    nodes: &[Node],
    config: &OutputConfig,
) -> io::Result<()> {
    if deps.is_empty() {
        writeln!(w, "No dependencies found.")?;
        return Ok(());
    }

    let names: HashMap<NodeId, &str> = nodes.iter().map(|n| (n.id, n.name.as_str())).collect();
    let name_of = |id: NodeId| names.get(&id).copied().unwrap_or("<missing>");
    let arrow = if config.use_ascii { "->" } else { "→" };

    writeln!(w, "Found {} dependency edge(s):", deps.len())?;
    writeln!(w)?;

    for dep in deps {
        writeln!(
            w,
            "{} {} {} {} {}",
            colorize_id(dep.node_id, config),
            name_of(dep.node_id),
            dimmed(arrow, config),
            colorize_id(dep.depends_on_id, config),
            name_of(dep.depends_on_id)
        )?;
    }

    Ok(())
}

fn print_kill_outcome_text<W: Write>(
    w: &mut W,
    outcome: &KillOutcome,
    config: &OutputConfig,
) -> io::Result<()> {
    if !outcome.changed {
        writeln!(
            w,
            "{} {} is already down; nothing changed.",
            colorize_id(outcome.node.id, config),
            outcome.node.name
        )?;
        return Ok(());
    }

    writeln!(
        w,
        "{} Killed {} {}",
        color::error(if config.use_ascii { "x" } else { "✗" }, config),
        colorize_id(outcome.node.id, config),
        outcome.node.name
    )?;

    if !outcome.cascaded.is_empty() {
        let arrow = if config.use_ascii { "v" } else { "↓" };
        writeln!(w)?;
        writeln!(w, "{} ({}):", bold("Cascade", config), outcome.cascaded.len())?;
        for node in &outcome.cascaded {
            writeln!(
                w,
                "  {} {} {}  {}",
                color::warning(arrow, config),
                colorize_id(node.id, config),
                node.name,
                dimmed(&format!("{}/h", format_money(node.downtime_cost_per_hour)), config)
            )?;
        }
    }

    if let Some(mitigation) = &outcome.mitigation {
        writeln!(w)?;
        writeln!(
            w,
            "{} {} activated, {} restored",
            color::success("Failover:", config),
            mitigation.backup.name,
            mitigation.victim.name
        )?;
    }

    let lost: f64 = std::iter::once(&outcome.node)
        .chain(&outcome.cascaded)
        .map(|n| n.downtime_cost_per_hour)
        .sum();
    writeln!(w)?;
    writeln!(
        w,
        "{} {}/h",
        dimmed("Downtime cost incurred:", config),
        color::error(&format_money(lost), config)
    )
}

fn print_history_text<W: Write>(
    w: &mut W,
    events: &[FailureEvent],
    config: &OutputConfig,
) -> io::Result<()> {
    if events.is_empty() {
        writeln!(w, "No events recorded.")?;
        return Ok(());
    }

    for event in events {
        writeln!(
            w,
            "{}  {:<15}  {}  {}",
            dimmed(&event.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(), config),
            colorize_kind(event.kind, config),
            event.node_name,
            dimmed(&format!("{}/h", format_money(event.cost_at_failure)), config)
        )?;
    }

    Ok(())
}

fn print_stats_text<W: Write>(
    w: &mut W,
    summary: &ImpactSummary,
    top: &[FailureStats],
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(w, "{}", bold("Scenario", config))?;
    writeln!(
        w,
        "  {} {}  {} {}  {} {}  {} {}",
        dimmed("Nodes:", config),
        summary.total_nodes,
        dimmed("Critical:", config),
        summary.critical_nodes,
        dimmed("Failed:", config),
        summary.failed_nodes,
        dimmed("Degraded:", config),
        summary.degraded_nodes
    )?;
    writeln!(
        w,
        "  {} {}/h",
        dimmed("Current loss rate:", config),
        color::error(&format_money(summary.hourly_loss_rate), config)
    )?;
    writeln!(
        w,
        "  {} {}  {} {}",
        dimmed("Events:", config),
        summary.total_events,
        dimmed("Total lost:", config),
        format_money(summary.total_lost)
    )?;

    writeln!(w)?;
    writeln!(w, "{}", bold("Top failures", config))?;
    if top.is_empty() {
        writeln!(w, "  No failures recorded.")?;
        return Ok(());
    }
    for (rank, stats) in top.iter().enumerate() {
        writeln!(
            w,
            "  {}. {}  {} failure(s)  {}",
            rank + 1,
            stats.node_name,
            stats.failure_count,
            color::error(&format_money(stats.total_lost), config)
        )?;
    }

    Ok(())
}

/// Wrap text to fit within a given width, preserving existing line breaks.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    text.lines()
        .flat_map(|line| {
            if line.trim().is_empty() {
                vec![String::new()]
            } else {
                textwrap::wrap(line, max_width)
                    .into_iter()
                    .map(std::borrow::Cow::into_owned)
                    .collect()
            }
        })
        .collect()
}

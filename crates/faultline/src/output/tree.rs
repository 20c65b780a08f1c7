//! Impact tree rendering for `faultline impact` output.

use std::collections::HashMap;
use std::io::{self, Write};

use colored::Colorize;

use super::color::{colored_health_icon, colorize_id, critical_marker, dimmed};
use super::{format_money, OutputConfig};
use crate::domain::{Node, NodeId};
use crate::engine::ImpactReport;

/// A node in an impact tree for rendering purposes.
#[derive(Debug, Clone)]
pub struct ImpactTreeNode {
    /// The node at this position.
    pub node: Node,
    /// Nodes that were first reached through this one.
    pub children: Vec<ImpactTreeNode>,
}

impl ImpactTreeNode {
    /// Arrange a breadth-first impact report as a tree.
    ///
    /// Every dependent hangs under the node it was first reached through.
    #[must_use]
    pub fn from_report(report: &ImpactReport) -> Self {
        let mut by_parent: HashMap<NodeId, Vec<&Node>> = HashMap::new();
        for entry in &report.dependents {
            by_parent.entry(entry.via).or_default().push(&entry.node);
        }
        Self::build(&report.root, &by_parent)
    }

    fn build(node: &Node, by_parent: &HashMap<NodeId, Vec<&Node>>) -> Self {
        let children = by_parent
            .get(&node.id)
            .map(|children| {
                children
                    .iter()
                    .map(|child| Self::build(child, by_parent))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            node: node.clone(),
            children,
        }
    }
}

/// Render the impact tree with ASCII/Unicode connectors.
///
/// Renders a tree like:
/// ```text
/// ◆ #3 Regional Power Grid (Munich)
/// ├── ◐ #7 Berlin Assembly Plant ⚠  450,000/h
/// │   └── ◐ #8 Robotic Welding Unit A  30,000/h
/// └── ◐ #23 Munich Headquarters  10,000/h
/// ```
pub(crate) fn print_impact_tree_text<W: Write>(
    w: &mut W,
    root: &ImpactTreeNode,
    config: &OutputConfig,
) -> io::Result<()> {
    let root_icon = if config.use_ascii { "*" } else { "◆" };
    let root_icon_str = if config.use_colors {
        root_icon.cyan().bold().to_string()
    } else {
        root_icon.to_string()
    };

    writeln!(
        w,
        "{} {} {}",
        root_icon_str,
        colorize_id(root.node.id, config),
        root.node.name
    )?;

    print_children(w, &root.children, &[], config)
}

/// `prefix_segments` tracks which ancestor levels still have siblings below,
/// used to draw the vertical continuation lines.
fn print_children<W: Write>(
    w: &mut W,
    children: &[ImpactTreeNode],
    prefix_segments: &[bool],
    config: &OutputConfig,
) -> io::Result<()> {
    let (branch, corner, pipe, space) = if config.use_ascii {
        ("|-- ", "`-- ", "|   ", "    ")
    } else {
        ("├── ", "└── ", "│   ", "    ")
    };

    for (i, child) in children.iter().enumerate() {
        let is_last = i == children.len() - 1;

        let mut prefix = String::new();
        for &has_more in prefix_segments {
            prefix.push_str(&dimmed(if has_more { pipe } else { space }, config));
        }
        let connector = dimmed(if is_last { corner } else { branch }, config);

        let marker = critical_marker(child.node.is_critical, config);
        let marker = if marker.is_empty() {
            marker
        } else {
            format!(" {marker}")
        };

        writeln!(
            w,
            "{}{}{} {} {}{}  {}",
            prefix,
            connector,
            colored_health_icon(child.node.health(), config),
            colorize_id(child.node.id, config),
            child.node.name,
            marker,
            dimmed(&format!("{}/h", format_money(child.node.downtime_cost_per_hour)), config)
        )?;

        if !child.children.is_empty() {
            let mut next_segments = prefix_segments.to_vec();
            next_segments.push(!is_last);
            print_children(w, &child.children, &next_segments, config)?;
        }
    }

    Ok(())
}

//! Color and styling helpers for CLI output.
//!
//! Every style goes through [`Tone`], so the palette lives in one place:
//!
//! | tone | style | used for |
//! |---|---|---|
//! | `Good` | green | operational nodes, recoveries |
//! | `Warn` | yellow | degraded nodes, cascade failures |
//! | `Bad` | red | failed nodes, manual kills, money lost |
//! | `Info` | cyan | node IDs |
//! | `Alert` | bold magenta | critical marker |
//! | `Muted` | dimmed | labels, connectors, categories |
//! | `Strong` | bold | section headers |

use crate::domain::{EventKind, Health, NodeId};
use colored::{ColoredString, Colorize};

use super::OutputConfig;

#[derive(Debug, Clone, Copy)]
enum Tone {
    Good,
    Warn,
    Bad,
    Info,
    Alert,
    Muted,
    Strong,
}

impl Tone {
    fn apply(self, text: &str) -> ColoredString {
        match self {
            Tone::Good => text.green(),
            Tone::Warn => text.yellow(),
            Tone::Bad => text.red(),
            Tone::Info => text.cyan(),
            Tone::Alert => text.magenta().bold(),
            Tone::Muted => text.dimmed(),
            Tone::Strong => text.bold(),
        }
    }

    fn of_health(health: Health) -> Self {
        match health {
            Health::Operational => Tone::Good,
            Health::Degraded => Tone::Warn,
            Health::Failed => Tone::Bad,
        }
    }
}

fn paint(text: &str, tone: Tone, config: &OutputConfig) -> String {
    if config.use_colors {
        tone.apply(text).to_string()
    } else {
        text.to_string()
    }
}

/// Green text, for things that went right.
pub fn success(text: &str, config: &OutputConfig) -> String {
    paint(text, Tone::Good, config)
}

/// Red text, for failures and losses.
pub fn error(text: &str, config: &OutputConfig) -> String {
    paint(text, Tone::Bad, config)
}

/// Yellow text.
pub fn warning(text: &str, config: &OutputConfig) -> String {
    paint(text, Tone::Warn, config)
}

/// Cyan text.
pub fn info(text: &str, config: &OutputConfig) -> String {
    paint(text, Tone::Info, config)
}

pub(crate) fn colorize_health(health: Health, config: &OutputConfig) -> String {
    let label = health.to_string();
    if health == Health::Failed && config.use_colors {
        return label.red().bold().to_string();
    }
    paint(&label, Tone::of_health(health), config)
}

/// Health icon; `+ ~ x` in ASCII mode.
pub(crate) fn colored_health_icon(health: Health, config: &OutputConfig) -> String {
    let icon = match (health, config.use_ascii) {
        (Health::Operational, true) => "+",
        (Health::Degraded, true) => "~",
        (Health::Failed, true) => "x",
        (Health::Operational, false) => "●",
        (Health::Degraded, false) => "◐",
        (Health::Failed, false) => "✗",
    };
    paint(icon, Tone::of_health(health), config)
}

pub(crate) fn colorize_kind(kind: EventKind, config: &OutputConfig) -> String {
    let tone = match kind {
        EventKind::ManualKill => Tone::Bad,
        EventKind::CascadeFailure => Tone::Warn,
        EventKind::AutoRecovery => Tone::Good,
    };
    paint(kind.as_str(), tone, config)
}

/// A node ID as `#N`.
pub(crate) fn colorize_id(id: NodeId, config: &OutputConfig) -> String {
    paint(&format!("#{id}"), Tone::Info, config)
}

/// Marker shown after critical node names; empty for the rest.
pub(crate) fn critical_marker(is_critical: bool, config: &OutputConfig) -> String {
    if !is_critical {
        return String::new();
    }
    paint(if config.use_ascii { "!" } else { "⚠" }, Tone::Alert, config)
}

pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    paint(text, Tone::Muted, config)
}

pub(crate) fn bold(text: &str, config: &OutputConfig) -> String {
    paint(text, Tone::Strong, config)
}

//! Domain types for the outage simulator.
//!
//! A [`Node`] is an infrastructure asset with a health score. A [`Dependency`]
//! says a child node fails when its parent fails. Every state transition the
//! engine performs is recorded as an immutable [`FailureEvent`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Score of a fully operational node.
pub const FULL_HEALTH: f64 = 100.0;

/// Score of a failed node.
pub const FAILED: f64 = 0.0;

/// Maximum length of a node name.
pub const MAX_NAME_LENGTH: usize = 200;

/// Stable identifier of a node, assigned by the graph store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Create a node ID from its raw value
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric value
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl FromStr for NodeId {
    type Err = String;

    /// Accepts `42` or `#42`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches('#');
        digits
            .parse::<u64>()
            .map(Self)
            .map_err(|_| format!("'{s}' is not a valid node ID (expected a number)"))
    }
}

/// An infrastructure asset in the dependency graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique, stable identifier
    pub id: NodeId,

    /// Display name (e.g. "Regional Power Grid (Munich)")
    pub name: String,

    /// Free-form category label (e.g. "IT_Infrastructure")
    pub node_type: String,

    /// Health from 0 (failed) to 100 (fully operational)
    pub resilience_score: f64,

    /// Advisory single-point-of-failure flag; not enforced by the engine
    pub is_critical: bool,

    /// Monetary loss per hour while this node is down
    pub downtime_cost_per_hour: f64,
}

impl Node {
    /// A node is alive while its score is above zero.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.resilience_score > FAILED
    }

    /// Display classification of the node's score.
    #[must_use]
    pub fn health(&self) -> Health {
        Health::from_score(self.resilience_score)
    }
}

/// Coarse health bucket, used for display and summaries only.
///
/// The engine itself distinguishes alive (`> 0`) from failed (`== 0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    /// Score at or above 100
    Operational,

    /// Score strictly between 0 and 100
    Degraded,

    /// Score of 0
    Failed,
}

impl Health {
    /// Classify a resilience score
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score <= FAILED {
            Health::Failed
        } else if score >= FULL_HEALTH {
            Health::Operational
        } else {
            Health::Degraded
        }
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Health::Operational => "operational",
            Health::Degraded => "degraded",
            Health::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Directed edge: `node_id` fails when `depends_on_id` fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Dependency {
    /// The child (dependent) node
    pub node_id: NodeId,

    /// The parent it relies on
    pub depends_on_id: NodeId,
}

impl Dependency {
    /// Create an edge meaning `child` depends on `parent`
    #[must_use]
    pub const fn new(child: NodeId, parent: NodeId) -> Self {
        Self {
            node_id: child,
            depends_on_id: parent,
        }
    }
}

/// Kind of ledger event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// A node was killed directly by an operator
    ManualKill,

    /// A node failed because something it depends on failed
    CascadeFailure,

    /// A node was restored by an automated failover rule
    AutoRecovery,
}

impl EventKind {
    /// Wire name of the kind
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::ManualKill => "MANUAL_KILL",
            EventKind::CascadeFailure => "CASCADE_FAILURE",
            EventKind::AutoRecovery => "AUTO_RECOVERY",
        }
    }

    /// Recoveries carry no cost; everything else is a failure.
    #[must_use]
    pub fn is_failure(self) -> bool {
        !matches!(self, EventKind::AutoRecovery)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable ledger record of one node state transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureEvent {
    /// Identifier of the node, kept so renamed nodes stay attributable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,

    /// Snapshot of the node's name when the event happened
    pub node_name: String,

    /// What happened
    pub kind: EventKind,

    /// Downtime cost per hour at event time; 0 for recoveries
    pub cost_at_failure: f64,

    /// When the event was recorded
    pub timestamp: DateTime<Utc>,
}

impl FailureEvent {
    /// Snapshot `node` for an event of the given kind, stamped now.
    #[must_use]
    pub fn for_node(node: &Node, kind: EventKind) -> Self {
        let cost_at_failure = if kind.is_failure() {
            node.downtime_cost_per_hour
        } else {
            0.0
        };

        Self {
            node_id: Some(node.id),
            node_name: node.name.clone(),
            kind,
            cost_at_failure,
            timestamp: Utc::now(),
        }
    }
}

/// Aggregated failure impact of one node name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureStats {
    /// Node name the events were grouped by
    pub node_name: String,

    /// Number of failure events
    pub failure_count: u64,

    /// Sum of the cost snapshots of those events
    pub total_lost: f64,
}

/// Data for creating a new node
#[derive(Debug, Clone, PartialEq)]
pub struct NewNode {
    /// Display name
    pub name: String,

    /// Category label
    pub node_type: String,

    /// Initial health (0-100)
    pub resilience_score: f64,

    /// Advisory criticality flag
    pub is_critical: bool,

    /// Downtime cost per hour
    pub downtime_cost_per_hour: f64,
}

impl NewNode {
    /// Validate the creation data.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        validate_name(&self.name)?;
        validate_score(self.resilience_score)?;
        validate_cost(self.downtime_cost_per_hour)
    }
}

/// Scenario-editor patch. All three fields overwrite the stored node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePatch {
    /// New display name
    pub name: String,

    /// New downtime cost per hour
    pub downtime_cost_per_hour: f64,

    /// New resilience score
    pub resilience_score: f64,
}

impl NodePatch {
    /// A patch that leaves `node` unchanged; callers override fields from here.
    #[must_use]
    pub fn from_node(node: &Node) -> Self {
        Self {
            name: node.name.clone(),
            downtime_cost_per_hour: node.downtime_cost_per_hour,
            resilience_score: node.resilience_score,
        }
    }

    /// Validate the patch.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        validate_name(&self.name)?;
        validate_score(self.resilience_score)?;
        validate_cost(self.downtime_cost_per_hour)
    }
}

/// Filter for listing nodes
#[derive(Debug, Clone, Default)]
pub struct NodeFilter {
    /// Only nodes of this category (case-insensitive)
    pub node_type: Option<String>,

    /// Only failed nodes
    pub failed_only: bool,

    /// Only nodes flagged critical
    pub critical_only: bool,
}

impl NodeFilter {
    /// Whether `node` passes the filter
    #[must_use]
    pub fn matches(&self, node: &Node) -> bool {
        if self.failed_only && node.is_alive() {
            return false;
        }
        if self.critical_only && !node.is_critical {
            return false;
        }
        match &self.node_type {
            Some(node_type) => node.node_type.eq_ignore_ascii_case(node_type),
            None => true,
        }
    }
}

fn validate_name(name: &str) -> Result<(), String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name cannot be empty".to_string());
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(format!("Name cannot exceed {MAX_NAME_LENGTH} characters"));
    }
    Ok(())
}

fn validate_score(score: f64) -> Result<(), String> {
    if !score.is_finite() || !(FAILED..=FULL_HEALTH).contains(&score) {
        return Err(format!(
            "Resilience score must be between {FAILED} and {FULL_HEALTH}, got {score}"
        ));
    }
    Ok(())
}

fn validate_cost(cost: f64) -> Result<(), String> {
    if !cost.is_finite() || cost < 0.0 {
        return Err(format!("Downtime cost must be a non-negative amount, got {cost}"));
    }
    Ok(())
}

//! Automated failover rules.
//!
//! A [`MitigationPolicy`] is an ordered table of [`MitigationRule`]s. After a
//! manual kill, the first rule whose trigger matches the killed node fires:
//! its backup node is activated and its victim node is restored, both to full
//! health, and one `AUTO_RECOVERY` event is recorded for the victim.
//!
//! The default table matches by display-name substring:
//!
//! | trigger | backup | victim |
//! |---|---|---|
//! | `Power Grid` | `Diesel Generators` | `Berlin Assembly Plant` |
//! | `AWS` | `Disaster Recovery Server` | `Web Storefront` |
//! | `Port of Hamburg` | `Emergency Rail Freight` | `Taiwan Semiconductor` |

use crate::domain::{EventKind, FailureEvent, Node, NodeId, FULL_HEALTH};
use crate::error::{Error, Result};
use crate::storage::{EventLedger, GraphStore};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Selects a node for one side of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeMatcher {
    /// The node's current display name contains this text.
    NameContains(String),

    /// The node has this identifier. Survives renames.
    Id(NodeId),

    /// The node's category label equals this text exactly.
    Category(String),
}

impl NodeMatcher {
    /// Shorthand for [`NodeMatcher::NameContains`].
    pub fn name_contains(text: impl Into<String>) -> Self {
        NodeMatcher::NameContains(text.into())
    }

    /// Whether `node` is selected by this matcher.
    #[must_use]
    pub fn matches(&self, node: &Node) -> bool {
        match self {
            NodeMatcher::NameContains(text) => node.name.contains(text.as_str()),
            NodeMatcher::Id(id) => node.id == *id,
            NodeMatcher::Category(category) => node.node_type == *category,
        }
    }
}

impl fmt::Display for NodeMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeMatcher::NameContains(text) => write!(f, "name contains '{text}'"),
            NodeMatcher::Id(id) => write!(f, "id {id}"),
            NodeMatcher::Category(category) => write!(f, "category '{category}'"),
        }
    }
}

/// One failover rule.
///
/// Matchers are written as single-key maps (`{ name_contains: AWS }`) in
/// every format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MitigationRule {
    /// Matches the killed node
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub trigger: NodeMatcher,

    /// Node brought online to take over
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub backup: NodeMatcher,

    /// Node restored by the failover
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub victim: NodeMatcher,
}

impl MitigationRule {
    /// Rule matching all three sides by name substring.
    pub fn by_name(
        trigger: impl Into<String>,
        backup: impl Into<String>,
        victim: impl Into<String>,
    ) -> Self {
        Self {
            trigger: NodeMatcher::name_contains(trigger),
            backup: NodeMatcher::name_contains(backup),
            victim: NodeMatcher::name_contains(victim),
        }
    }
}

/// What a fired rule did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MitigationOutcome {
    /// The rule that fired
    pub rule: MitigationRule,

    /// Backup node after activation
    pub backup: Node,

    /// Victim node after restoration
    pub victim: Node,
}

/// Ordered failover rule table. The first matching rule wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MitigationPolicy {
    rules: Vec<MitigationRule>,
}

impl Default for MitigationPolicy {
    fn default() -> Self {
        Self::new(vec![
            MitigationRule::by_name("Power Grid", "Diesel Generators", "Berlin Assembly Plant"),
            MitigationRule::by_name("AWS", "Disaster Recovery Server", "Web Storefront"),
            MitigationRule::by_name("Port of Hamburg", "Emergency Rail Freight", "Taiwan Semiconductor"),
        ])
    }
}

impl MitigationPolicy {
    /// Create a policy from rules in evaluation order.
    #[must_use]
    pub fn new(rules: Vec<MitigationRule>) -> Self {
        Self { rules }
    }

    /// A policy that never fires.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Vec::new())
    }

    /// Rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[MitigationRule] {
        &self.rules
    }

    /// First rule whose trigger matches `failed`.
    #[must_use]
    pub fn find_rule(&self, failed: &Node) -> Option<&MitigationRule> {
        self.rules.iter().find(|rule| rule.trigger.matches(failed))
    }

    /// Run failover for a node that was just killed.
    ///
    /// Backup and victim are the first nodes, in ID order, matched by the
    /// rule. If either is missing the rule is skipped and `None` is returned.
    /// Both are set to full health even if they were already up.
    ///
    /// # Errors
    ///
    /// Store failures are returned unchanged.
    pub async fn apply(
        &self,
        store: &mut dyn GraphStore,
        ledger: &mut dyn EventLedger,
        failed: &Node,
    ) -> Result<Option<MitigationOutcome>> {
        let Some(rule) = self.find_rule(failed) else {
            return Ok(None);
        };

        let nodes = store.list_all().await?;
        let backup = nodes.iter().find(|node| rule.backup.matches(node));
        let victim = nodes.iter().find(|node| rule.victim.matches(node));
        let (Some(backup), Some(victim)) = (backup, victim) else {
            tracing::debug!(
                trigger = %rule.trigger,
                backup_found = backup.is_some(),
                victim_found = victim.is_some(),
                "failover rule matched but nodes are missing"
            );
            return Ok(None);
        };

        let (backup_id, victim_id) = (backup.id, victim.id);

        let mut backup = backup.clone();
        backup.resilience_score = FULL_HEALTH;
        store.save(backup).await?;

        let mut victim = victim.clone();
        victim.resilience_score = FULL_HEALTH;
        let victim = store.save(victim).await?;
        ledger
            .append(FailureEvent::for_node(&victim, EventKind::AutoRecovery))
            .await?;

        // Backup and victim may be the same node; re-read both for the final state.
        let backup = fetch(store, backup_id).await?;
        let victim = fetch(store, victim_id).await?;

        tracing::info!(
            failed = %failed.name,
            backup = %backup.name,
            victim = %victim.name,
            "automated failover"
        );

        Ok(Some(MitigationOutcome {
            rule: rule.clone(),
            backup,
            victim,
        }))
    }
}

async fn fetch(store: &dyn GraphStore, id: NodeId) -> Result<Node> {
    store.get(id).await?.ok_or(Error::NodeNotFound(id))
}

//! Implementation of the `seed` command.
//!
//! Loads the demo enterprise scenario: a German manufacturer with its
//! infrastructure, plants, logistics chain, sales channels and suppliers,
//! including the three backup nodes the default failover rules activate.

use crate::domain::{NewNode, NodeId};
use crate::error::{Error, Result};
use crate::storage::GraphStore;
use std::collections::HashMap;

/// (name, category, resilience score, critical, downtime cost per hour)
type NodeSpec = (&'static str, &'static str, f64, bool, f64);

const NODES: &[NodeSpec] = &[
    // Infrastructure
    ("AWS region (Frankfurt)", "IT_Infrastructure", 99.9, true, 85_000.0),
    ("Disaster Recovery Server (Paris)", "IT_Infrastructure", 100.0, false, 0.0),
    ("Regional Power Grid (Munich)", "Utilities", 99.5, true, 1_000_000.0),
    ("Diesel Generators (Backup)", "Utilities", 100.0, false, 0.0),
    ("VPN & Internal Wifi", "IT_Infrastructure", 88.0, false, 5_000.0),
    ("Enterprise Firewall Perimeter", "Security", 99.8, true, 1_000_000.0),
    // Manufacturing
    ("Berlin Assembly Plant", "Manufacturing", 94.0, true, 450_000.0),
    ("Robotic Welding Unit A", "Manufacturing", 89.5, false, 30_000.0),
    ("Automated Paint Shop", "Manufacturing", 91.0, false, 45_000.0),
    ("Factory Cooling System", "Facility", 94.0, true, 20_000.0),
    ("3D Printer Fleet (Prototyping)", "R&D", 82.0, false, 5_000.0),
    // Logistics
    ("Port of Hamburg (Inbound)", "Logistics", 85.0, true, 120_000.0),
    ("Emergency Rail Freight", "Logistics", 100.0, false, 0.0),
    ("DHL Freight Partner", "Logistics", 90.0, false, 25_000.0),
    ("Baltic Sea Shipping Route", "External_Logistics", 80.0, true, 200_000.0),
    // Sales
    ("Web Storefront (Shopify)", "Sales", 99.2, true, 75_000.0),
    ("Berlin Flagship Showroom", "Sales", 96.0, false, 12_000.0),
    ("Salesforce CRM", "IT_Software", 92.0, false, 15_000.0),
    ("Call Center (Poland)", "Support", 88.5, false, 8_000.0),
    // Suppliers
    ("Taiwan Semiconductor (Import)", "Supplier", 75.0, true, 300_000.0),
    ("ThyssenKrupp Steel Supply", "Supplier", 96.0, true, 80_000.0),
    ("Lithium Ion Batteries (Asia)", "Supplier", 78.0, true, 150_000.0),
    // Corporate
    ("Munich Headquarters", "Facility", 98.0, false, 10_000.0),
    ("SAP Payroll", "HR", 99.0, true, 60_000.0),
    ("GDPR Compliance Database", "Legal", 99.9, true, 500_000.0),
    ("Labor Union Representative", "HR", 90.0, true, 0.0),
    ("EU Import License API", "Legal", 97.0, true, 50_000.0),
    // R&D
    ("Stuttgart Innovation Lab", "R&D", 95.0, false, 20_000.0),
    ("AutoCAD License Server", "IT_Software", 99.0, true, 18_000.0),
    ("Okta Identity Provider", "Security", 99.9, true, 150_000.0),
];

/// (child, parent): the child fails when the parent fails.
const LINKS: &[(&str, &str)] = &[
    ("Berlin Assembly Plant", "Regional Power Grid (Munich)"),
    ("Munich Headquarters", "Regional Power Grid (Munich)"),
    ("Factory Cooling System", "Regional Power Grid (Munich)"),
    ("Stuttgart Innovation Lab", "Regional Power Grid (Munich)"),
    ("Robotic Welding Unit A", "Berlin Assembly Plant"),
    ("Automated Paint Shop", "Berlin Assembly Plant"),
    ("Berlin Flagship Showroom", "Berlin Assembly Plant"),
    ("Web Storefront (Shopify)", "AWS region (Frankfurt)"),
    ("Salesforce CRM", "AWS region (Frankfurt)"),
    ("Web Storefront (Shopify)", "VPN & Internal Wifi"),
    ("SAP Payroll", "VPN & Internal Wifi"),
    ("Port of Hamburg (Inbound)", "Baltic Sea Shipping Route"),
    ("Taiwan Semiconductor (Import)", "Port of Hamburg (Inbound)"),
    ("Lithium Ion Batteries (Asia)", "Port of Hamburg (Inbound)"),
    ("GDPR Compliance Database", "Enterprise Firewall Perimeter"),
];

/// Result of seeding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedResult {
    /// Nodes created
    pub nodes: usize,
    /// Dependency edges created
    pub dependencies: usize,
}

/// Replace the graph with the demo scenario.
///
/// Existing nodes and edges are removed first. The event ledger is not
/// touched.
///
/// # Errors
///
/// Returns any store failure.
pub async fn seed(store: &mut dyn GraphStore) -> Result<SeedResult> {
    store.clear().await?;

    let mut ids: HashMap<&str, NodeId> = HashMap::with_capacity(NODES.len());
    for &(name, node_type, resilience_score, is_critical, downtime_cost_per_hour) in NODES {
        let node = store
            .create(NewNode {
                name: name.to_string(),
                node_type: node_type.to_string(),
                resilience_score,
                is_critical,
                downtime_cost_per_hour,
            })
            .await?;
        ids.insert(name, node.id);
    }

    for &(child, parent) in LINKS {
        let (Some(&child_id), Some(&parent_id)) = (ids.get(child), ids.get(parent)) else {
            return Err(Error::InvalidNode(format!(
                "scenario link {child} -> {parent} names an unknown node"
            )));
        };
        store.add_dependency(child_id, parent_id).await?;
    }

    tracing::info!(nodes = NODES.len(), dependencies = LINKS.len(), "seeded demo scenario");

    Ok(SeedResult {
        nodes: NODES.len(),
        dependencies: LINKS.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::in_memory::new_in_memory_graph_store;

    #[tokio::test]
    async fn seed_builds_full_scenario() {
        let mut store = new_in_memory_graph_store();

        let result = seed(store.as_mut()).await.unwrap();

        assert_eq!(result, SeedResult { nodes: 30, dependencies: 15 });
        assert_eq!(store.list_all().await.unwrap().len(), 30);
        assert_eq!(store.list_dependencies().await.unwrap().len(), 15);
        assert!(!store.is_cyclic().await.unwrap());
    }

    #[tokio::test]
    async fn seed_replaces_existing_graph() {
        let mut store = new_in_memory_graph_store();
        seed(store.as_mut()).await.unwrap();
        seed(store.as_mut()).await.unwrap();

        assert_eq!(store.list_all().await.unwrap().len(), 30);
        assert_eq!(store.list_dependencies().await.unwrap().len(), 15);
    }

    #[test]
    fn scenario_nodes_are_valid_and_unique() {
        let mut names = std::collections::HashSet::new();
        for &(name, node_type, score, critical, cost) in NODES {
            let node = NewNode {
                name: name.to_string(),
                node_type: node_type.to_string(),
                resilience_score: score,
                is_critical: critical,
                downtime_cost_per_hour: cost,
            };
            assert!(node.validate().is_ok(), "{name} is invalid");
            assert!(names.insert(name), "{name} appears twice");
        }
    }
}

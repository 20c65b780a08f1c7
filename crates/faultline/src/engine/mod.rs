//! The simulation engine.
//!
//! - [`propagation`]: fails everything downstream of a failed node
//! - [`mitigation`]: rule-driven automated failover after a kill
//! - [`lifecycle`]: the kill/reset/update entry points tying the two together
//! - [`analytics`]: read-only reports over the ledger and graph
//!
//! Callers go through [`LifecycleController`]; nothing else mutates node
//! health.

pub mod analytics;
pub mod lifecycle;
pub mod mitigation;
pub mod propagation;

pub use analytics::{ImpactEntry, ImpactReport, ImpactSummary};
pub use lifecycle::{KillOutcome, LifecycleController, SharedController};
pub use mitigation::{MitigationOutcome, MitigationPolicy, MitigationRule, NodeMatcher};

//! Faultline - a dependency-graph outage simulator.
//!
//! Nodes are infrastructure assets with a health score; dependency edges say
//! which nodes fail when another fails. Killing a node cascades the failure to
//! every live dependent, runs configured failover rules and records each
//! transition in an append-only failure ledger that analytics read back.
//!
//! The crate provides both the `faultline` CLI and a library:
//! - [`engine::LifecycleController`] for kill/reset/update and analytics
//! - [`storage::GraphStore`] and [`storage::EventLedger`] for the collaborators
//!   the engine runs against, with in-memory and JSONL-backed implementations

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod domain;
pub mod engine;
pub mod error;
pub mod storage;

// Workspace wiring
pub mod app;
pub mod config;

// Public CLI module (needed by binary)
pub mod cli;

// Command implementations
pub mod commands;

// Text and JSON rendering
pub mod output;

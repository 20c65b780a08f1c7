//! Configuration for a faultline workspace.
//!
//! A workspace is any directory containing `.faultline/config.yaml`:
//!
//! ```yaml
//! storage:
//!   backend: jsonl
//!   nodes_file: .faultline/nodes.jsonl
//!   events_file: .faultline/events.jsonl
//! mitigation:
//!   rules:
//!     - trigger: { name_contains: Power Grid }
//!       backup: { name_contains: Diesel Generators }
//!       victim: { name_contains: Berlin Assembly Plant }
//! ```
//!
//! Omitting `mitigation` selects the built-in failover rules.

use crate::engine::{MitigationPolicy, MitigationRule};
use crate::error::{ConfigError, Result};
use crate::storage::StorageBackend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the workspace directory
pub const FAULTLINE_DIR_NAME: &str = ".faultline";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Name of the node snapshot file
pub const NODES_FILE_NAME: &str = "nodes.jsonl";

/// Name of the event ledger file
pub const EVENTS_FILE_NAME: &str = "events.jsonl";

/// Name of the gitignore file within .faultline
pub const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Maximum directory depth to traverse when searching for the workspace root
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Top-level configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FaultlineConfig {
    /// Where nodes and events live
    pub storage: StorageConfig,

    /// Automated failover rules
    #[serde(default)]
    pub mitigation: MitigationConfig,
}

/// Storage configuration section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    /// Backend type: "jsonl" (persistent) or "memory" (ephemeral)
    pub backend: String,

    /// Node snapshot file, relative to the workspace root
    pub nodes_file: String,

    /// Event ledger file, relative to the workspace root
    pub events_file: String,
}

/// Mitigation configuration section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MitigationConfig {
    /// Rules in evaluation order; the first match wins. Omitted means the
    /// built-in rules, an explicit empty list disables failover.
    #[serde(default = "default_rules")]
    pub rules: Vec<MitigationRule>,
}

fn default_rules() -> Vec<MitigationRule> {
    MitigationPolicy::default().rules().to_vec()
}

impl Default for MitigationConfig {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

impl MitigationConfig {
    /// Build the runtime policy.
    #[must_use]
    pub fn to_policy(&self) -> MitigationPolicy {
        MitigationPolicy::new(self.rules.clone())
    }
}

impl StorageConfig {
    /// Resolve the node and event backends against the workspace root.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownBackend` for an unrecognised backend name.
    pub fn to_backends(&self, root: &Path) -> Result<(StorageBackend, StorageBackend)> {
        match self.backend.trim().to_ascii_lowercase().as_str() {
            "jsonl" => Ok((
                StorageBackend::Jsonl(root.join(&self.nodes_file)),
                StorageBackend::Jsonl(root.join(&self.events_file)),
            )),
            "memory" => Ok((StorageBackend::InMemory, StorageBackend::InMemory)),
            other => Err(ConfigError::UnknownBackend(other.to_string()).into()),
        }
    }
}

impl Default for FaultlineConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                backend: "jsonl".to_string(),
                nodes_file: format!("{FAULTLINE_DIR_NAME}/{NODES_FILE_NAME}"),
                events_file: format!("{FAULTLINE_DIR_NAME}/{EVENTS_FILE_NAME}"),
            },
            mitigation: MitigationConfig::default(),
        }
    }
}

impl FaultlineConfig {
    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file can't be read, or `ConfigError::Parse`
    /// if it isn't valid configuration YAML.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("YAML error: {e}")))?;
        fs::write(path, content).await?;
        Ok(())
    }
}

/// Find the workspace root by searching up the directory tree.
///
/// Returns the directory containing `.faultline/`, or `None` if none is
/// found before the filesystem root or the depth limit.
pub fn find_faultline_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(FAULTLINE_DIR_NAME).exists() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}

//! Implementation of the `init` command.
//!
//! Creates the `.faultline/` directory with a configuration file, empty node
//! and event files, and a `.gitignore`.

use crate::config::{
    FaultlineConfig, CONFIG_FILE_NAME, EVENTS_FILE_NAME, FAULTLINE_DIR_NAME, GITIGNORE_FILE_NAME,
    NODES_FILE_NAME,
};
use crate::error::{ConfigError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Result of the init command
#[derive(Debug)]
pub struct InitResult {
    /// Path to the created .faultline directory
    pub faultline_dir: PathBuf,
    /// Path to the created config file
    pub config_file: PathBuf,
    /// Path to the created node file
    pub nodes_file: PathBuf,
    /// Path to the created event ledger file
    pub events_file: PathBuf,
    /// Path to the created gitignore file
    pub gitignore_file: PathBuf,
}

/// Initialize a new faultline workspace in the given directory.
///
/// # Errors
///
/// Returns an error if:
/// - The `.faultline/` directory already exists
/// - File system operations fail
pub async fn init(base_dir: &Path) -> Result<InitResult> {
    let faultline_dir = base_dir.join(FAULTLINE_DIR_NAME);

    if faultline_dir.exists() {
        return Err(ConfigError::AlreadyInitialized(faultline_dir).into());
    }

    fs::create_dir_all(&faultline_dir).await?;

    let config_file = faultline_dir.join(CONFIG_FILE_NAME);
    FaultlineConfig::default().save(&config_file).await?;

    let nodes_file = faultline_dir.join(NODES_FILE_NAME);
    fs::write(&nodes_file, "").await?;

    let events_file = faultline_dir.join(EVENTS_FILE_NAME);
    fs::write(&events_file, "").await?;

    let gitignore_file = faultline_dir.join(GITIGNORE_FILE_NAME);
    let gitignore_content = "\
# Faultline scenario files
# nodes.jsonl holds the graph; events.jsonl is the append-only failure ledger
";
    fs::write(&gitignore_file, gitignore_content).await?;

    tracing::debug!(path = %faultline_dir.display(), "initialized workspace");

    Ok(InitResult {
        faultline_dir,
        config_file,
        nodes_file,
        events_file,
        gitignore_file,
    })
}

/// Check if a directory has been initialized.
///
/// Returns `true` if the `.faultline/` directory exists.
pub fn is_initialized(base_dir: &Path) -> bool {
    base_dir.join(FAULTLINE_DIR_NAME).exists()
}

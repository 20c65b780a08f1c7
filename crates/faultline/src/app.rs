//! Application context for CLI command execution.
//!
//! [`App`] finds the workspace, loads its configuration, opens both stores
//! and owns the [`LifecycleController`] that commands run against.
//!
//! # Example
//!
//! ```no_run
//! use faultline::app::App;
//! use faultline::domain::NodeId;
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let mut app = App::from_directory(Path::new(".")).await?;
//!     let outcome = app.controller_mut().kill(NodeId(3)).await?;
//!     println!("{} dependents failed", outcome.cascaded.len());
//!     app.save().await?;
//!     Ok(())
//! }
//! ```

use crate::config::{find_faultline_root, FaultlineConfig, CONFIG_FILE_NAME, FAULTLINE_DIR_NAME};
use crate::engine::LifecycleController;
use crate::error::{ConfigError, Result};
use crate::storage::{create_event_ledger, create_graph_store, StorageBackend};
use std::path::{Path, PathBuf};

/// Application context for CLI operations.
pub struct App {
    /// Controller owning the graph store and ledger
    controller: LifecycleController,

    /// Path to the workspace directory (.faultline)
    faultline_dir: PathBuf,

    /// Resolved node store backend
    nodes_backend: StorageBackend,

    /// Resolved event ledger backend
    events_backend: StorageBackend,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("faultline_dir", &self.faultline_dir)
            .field("nodes_backend", &self.nodes_backend)
            .field("events_backend", &self.events_backend)
            .field("controller", &"<LifecycleController>")
            .finish()
    }
}

impl App {
    /// Create an App from the given working directory.
    ///
    /// Searches up the directory tree for `.faultline/`, loads the
    /// configuration and opens storage.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No workspace is found in the directory tree
    /// - Configuration cannot be loaded
    /// - Storage initialization fails
    pub async fn from_directory(working_dir: &Path) -> Result<Self> {
        let root_dir = find_faultline_root(working_dir).ok_or(ConfigError::NotInitialized)?;

        let faultline_dir = root_dir.join(FAULTLINE_DIR_NAME);
        let config = FaultlineConfig::load(&faultline_dir.join(CONFIG_FILE_NAME)).await?;

        let (nodes_backend, events_backend) = config.storage.to_backends(&root_dir)?;
        let store = create_graph_store(nodes_backend.clone()).await?;
        let ledger = create_event_ledger(events_backend.clone()).await?;

        tracing::debug!(
            root = %root_dir.display(),
            backend = %config.storage.backend,
            rules = config.mitigation.rules.len(),
            "opened workspace"
        );

        let mut controller =
            LifecycleController::new(store, ledger).with_policy(config.mitigation.to_policy());
        controller.reserve_recorded_ids().await?;

        Ok(Self {
            controller,
            faultline_dir,
            nodes_backend,
            events_backend,
        })
    }

    /// The lifecycle controller.
    pub fn controller(&self) -> &LifecycleController {
        &self.controller
    }

    /// Mutable access to the lifecycle controller.
    pub fn controller_mut(&mut self) -> &mut LifecycleController {
        &mut self.controller
    }

    /// Path to the `.faultline` directory.
    pub fn faultline_dir(&self) -> &Path {
        &self.faultline_dir
    }

    /// Node store backend in use.
    pub fn nodes_backend(&self) -> &StorageBackend {
        &self.nodes_backend
    }

    /// Event ledger backend in use.
    pub fn events_backend(&self) -> &StorageBackend {
        &self.events_backend
    }

    /// Persist both stores.
    ///
    /// This should be called after any mutating operation.
    ///
    /// # Errors
    ///
    /// Returns the first persistence failure.
    pub async fn save(&self) -> Result<()> {
        self.controller.persist().await
    }
}

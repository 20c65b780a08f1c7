//! Error types for faultline operations.

use crate::domain::NodeId;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The error type for faultline operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error outside of the storage layer (e.g. output).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Storage error.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The operation referenced a node that is not in the store.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Node data failed validation.
    #[error("Invalid node data: {0}")]
    InvalidNode(String),
}

impl Error {
    /// Whether this error is a missing-node error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NodeNotFound(_))
    }
}

/// Errors raised while locating or reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No `.faultline/` directory above the working directory.
    #[error("Not a faultline workspace (or any parent up to mount point). Run 'faultline init' first")]
    NotInitialized,

    /// `init` was run where a workspace already exists.
    #[error("Faultline is already initialized here. Found existing '{0}'")]
    AlreadyInitialized(PathBuf),

    /// The configuration file could not be parsed or written.
    #[error("Invalid configuration: {0}")]
    Parse(String),

    /// `storage.backend` names a backend we do not have.
    #[error("Unknown storage backend '{0}' (expected 'jsonl' or 'memory')")]
    UnknownBackend(String),
}

/// Errors raised by graph store and event ledger backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying store cannot serve requests. Fatal, never retried.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A record could not be serialized for persistence.
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl From<faultline_jsonl::Error> for Error {
    fn from(err: faultline_jsonl::Error) -> Self {
        match err {
            faultline_jsonl::Error::Io(io_err) => Error::Io(io_err),
            faultline_jsonl::Error::Json { line, source } => {
                StorageError::Serialization(format!("line {line}: {source}")).into()
            }
        }
    }
}

/// A specialized Result type for faultline operations.
pub type Result<T> = std::result::Result<T, Error>;

//! Error types for the workspace indexing engine.

use std::path::PathBuf;
use thiserror::Error;

/// Tree construction errors
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("Workspace root unreadable: {path:?}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Tree I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Snapshot store errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to open snapshot store: {0}")]
    Open(String),

    #[error("Snapshot store I/O error: {0}")]
    Store(String),

    #[error("Snapshot encoding error: {0}")]
    Codec(String),
}

/// Sync transport errors. The client never retries internally; retry
/// policy belongs to the orchestrator.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Remote indexer returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Payload compression failed: {0}")]
    Compression(std::io::Error),

    #[error("Payload encoding failed: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),
}

/// Configuration errors. Malformed glob patterns fail here, before any
/// filesystem traversal begins.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid glob pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    #[error("Configuration load failed: {0}")]
    Load(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Load(err.to_string())
    }
}

/// Cycle-level errors surfaced by the indexing orchestrator
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("An indexing cycle is already in flight for this workspace")]
    CycleInProgress,

    #[error("Remote indexer is unavailable: {0}")]
    RemoteUnavailable(SyncError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

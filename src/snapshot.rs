//! Persistence for the confirmed-synced workspace snapshot
//!
//! The snapshot is the single piece of cross-cycle shared state. It is
//! written by the orchestrator only, and only after the remote indexer has
//! acknowledged the corresponding upload — a failed or cancelled cycle
//! leaves the previous snapshot untouched so the next cycle recomputes the
//! same delta.
//!
//! On-disk format: bincode-encoded `WorkspaceIndexState` values in a sled
//! tree, keyed by the hex workspace identifier.

use crate::error::StorageError;
use crate::tree::node::MerkleNode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persisted per-workspace index state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceIndexState {
    /// Obfuscated workspace identifier (hex), stable across restarts.
    pub workspace_id: String,
    /// The most recently confirmed-synced tree. `None` means the workspace
    /// has never completed an indexing cycle.
    pub last_snapshot: Option<MerkleNode>,
    pub last_sync: Option<DateTime<Utc>>,
    pub branch: Option<String>,
}

impl WorkspaceIndexState {
    pub fn new(workspace_id: String) -> Self {
        Self {
            workspace_id,
            last_snapshot: None,
            last_sync: None,
            branch: None,
        }
    }
}

/// Sled-backed snapshot store.
pub struct SnapshotStore {
    db: sled::Db,
}

impl SnapshotStore {
    /// Open (or create) a snapshot store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path).map_err(|e| StorageError::Open(e.to_string()))?;
        Ok(Self { db })
    }

    /// Default store location under the platform data directory.
    pub fn default_path() -> Result<PathBuf, StorageError> {
        let dirs = directories::ProjectDirs::from("", "", "treesync")
            .ok_or_else(|| StorageError::Open("No home directory available".to_string()))?;
        Ok(dirs.data_dir().join("snapshots"))
    }

    /// Load the persisted state for a workspace, if any.
    pub fn load(&self, workspace_id: &str) -> Result<Option<WorkspaceIndexState>, StorageError> {
        match self
            .db
            .get(workspace_id.as_bytes())
            .map_err(|e| StorageError::Store(e.to_string()))?
        {
            Some(value) => {
                let state: WorkspaceIndexState = bincode::deserialize(&value)
                    .map_err(|e| StorageError::Codec(e.to_string()))?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    /// Persist the state for a workspace, overwriting any prior value.
    pub fn save(&self, state: &WorkspaceIndexState) -> Result<(), StorageError> {
        let value = bincode::serialize(state).map_err(|e| StorageError::Codec(e.to_string()))?;
        self.db
            .insert(state.workspace_id.as_bytes(), value)
            .map_err(|e| StorageError::Store(e.to_string()))?;
        Ok(())
    }

    /// Drop the persisted state for a workspace (e.g. after a remote purge).
    pub fn clear(&self, workspace_id: &str) -> Result<(), StorageError> {
        self.db
            .remove(workspace_id.as_bytes())
            .map_err(|e| StorageError::Store(e.to_string()))?;
        Ok(())
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db
            .flush()
            .map_err(|e| StorageError::Store(e.to_string()))?;
        Ok(())
    }
}

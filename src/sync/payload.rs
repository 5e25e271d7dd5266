//! Wire types for the delta protocol

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One indexable unit of a changed file, produced by the external chunker
/// and addressed by the file's obfuscated identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeChunk {
    /// Obfuscated file identifier (hex); stable per (workspace, path).
    pub file_id: String,
    pub text: String,
    pub start_line: u32,
    pub end_line: u32,
}

/// The complete delta for one sync cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeltaPayload {
    /// Obfuscated workspace identifier (hex).
    pub workspace_id: String,
    pub chunks: Vec<CodeChunk>,
    /// Obfuscated identifiers (hex) of files deleted since the last
    /// confirmed sync.
    pub deleted_files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Remote acknowledgment for a delta upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResult {
    pub files_processed: u64,
    pub chunks_indexed: u64,
    #[serde(default)]
    pub files_skipped: u64,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub processing_ms: u64,
}

/// Remote index status for a workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteStatus {
    pub workspace_id: String,
    pub indexed_files: u64,
    pub state: String,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

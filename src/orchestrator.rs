//! Indexing cycle orchestration
//!
//! Sequences one reconciliation cycle: health gate → build tree → diff
//! against the persisted snapshot → chunk changed files → obfuscate →
//! upload → persist the new snapshot. The snapshot advances only after the
//! remote indexer acknowledges the upload; any failure (or cancellation)
//! before that point leaves the previous snapshot intact, so the next
//! cycle recomputes and re-attempts the same delta (at-least-once).

use crate::error::{IndexError, TreeError};
use crate::snapshot::{SnapshotStore, WorkspaceIndexState};
use crate::sync::{CodeChunk, DeltaPayload, DeltaTransport, UploadResult};
use crate::tree::{diff, hasher, path, FilterRules, MerkleNode, TreeBuilder};
use crate::types::WorkspaceId;
use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

/// One indexable span of a changed file.
#[derive(Debug, Clone)]
pub struct ChunkSpan {
    pub text: String,
    pub start_line: u32,
    pub end_line: u32,
}

/// External chunker contract: given a changed file, produce zero or more
/// indexable spans. The syntax-aware implementation lives outside this
/// crate; `FallbackChunker` keeps the engine runnable without it.
pub trait Chunker: Send + Sync {
    fn chunk_file(&self, relative_path: &str, content: &str) -> Vec<ChunkSpan>;
}

/// Whole-file chunker: one span covering the entire file.
pub struct FallbackChunker;

impl Chunker for FallbackChunker {
    fn chunk_file(&self, _relative_path: &str, content: &str) -> Vec<ChunkSpan> {
        if content.is_empty() {
            return Vec::new();
        }
        let lines = content.lines().count().max(1) as u32;
        vec![ChunkSpan {
            text: content.to_string(),
            start_line: 1,
            end_line: lines,
        }]
    }
}

/// Summary of one indexing cycle.
#[derive(Debug)]
pub struct CycleReport {
    /// True when the root hashes matched and nothing was sent.
    pub no_change: bool,
    pub changed_files: usize,
    pub deleted_files: usize,
    /// Changed files that vanished between the tree walk and the content
    /// read; the next build sees their deletion.
    pub skipped_files: usize,
    pub upload: Option<UploadResult>,
}

impl CycleReport {
    fn no_change() -> Self {
        Self {
            no_change: true,
            changed_files: 0,
            deleted_files: 0,
            skipped_files: 0,
            upload: None,
        }
    }
}

/// Coordinates indexing cycles for a single workspace.
///
/// At most one cycle runs at a time: a trigger that arrives while a cycle
/// is in flight is rejected with `IndexError::CycleInProgress` rather than
/// queued.
pub struct IndexingOrchestrator<T: DeltaTransport> {
    root: PathBuf,
    workspace_id: WorkspaceId,
    workspace_hex: String,
    rules: FilterRules,
    store: SnapshotStore,
    transport: T,
    chunker: Arc<dyn Chunker>,
    in_flight: Mutex<()>,
}

impl<T: DeltaTransport> IndexingOrchestrator<T> {
    pub fn new(
        root: PathBuf,
        rules: FilterRules,
        store: SnapshotStore,
        transport: T,
        chunker: Arc<dyn Chunker>,
    ) -> Result<Self, IndexError> {
        let root = path::canonicalize_root(&root)?;
        let workspace_id = hasher::hash_workspace_path(&root);
        let workspace_hex = hex::encode(workspace_id);
        Ok(Self {
            root,
            workspace_id,
            workspace_hex,
            rules,
            store,
            transport,
            chunker,
            in_flight: Mutex::new(()),
        })
    }

    /// Deterministic obfuscated identifier for this workspace (hex).
    pub fn workspace_id(&self) -> &str {
        &self.workspace_hex
    }

    /// Run one indexing cycle.
    ///
    /// Branch context is supplied by the caller; branch detection is out of
    /// scope here. Cancelling the returned future before the upload is
    /// acknowledged is equivalent to a failure: the snapshot is unchanged.
    #[instrument(skip(self), fields(workspace = %self.workspace_hex))]
    pub async fn run_cycle(&self, branch: Option<&str>) -> Result<CycleReport, IndexError> {
        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| IndexError::CycleInProgress)?;

        // Cheap liveness gate before any filesystem work.
        self.transport
            .health()
            .await
            .map_err(IndexError::RemoteUnavailable)?;

        let mut state = self
            .store
            .load(&self.workspace_hex)?
            .unwrap_or_else(|| WorkspaceIndexState::new(self.workspace_hex.clone()));

        // The walk, the diff, and the changed-file reads are all blocking
        // I/O; keep them off the async executor.
        let root = self.root.clone();
        let rules = self.rules.clone();
        let chunker = Arc::clone(&self.chunker);
        let workspace_id = self.workspace_id;
        let previous = state.last_snapshot.take();

        let (tree, outcome) = tokio::task::spawn_blocking(move || {
            compute_delta(root, rules, previous, workspace_id, chunker.as_ref())
        })
        .await
        .map_err(|e| {
            TreeError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Indexing task failed: {}", e),
            ))
        })??;

        let outcome = match outcome {
            None => {
                info!("Workspace unchanged; nothing to sync");
                // Snapshot already matches the filesystem; do not rewrite it.
                return Ok(CycleReport::no_change());
            }
            Some(outcome) => outcome,
        };

        let payload = DeltaPayload {
            workspace_id: self.workspace_hex.clone(),
            chunks: outcome.chunks,
            deleted_files: outcome.deleted_ids,
            branch: branch.map(|b| b.to_string()),
            timestamp: Utc::now(),
        };

        let upload = self.transport.send_delta(&payload).await?;

        // Confirmed round-trip: only now does the new tree become the
        // persisted snapshot.
        state.last_snapshot = Some(tree);
        state.last_sync = Some(Utc::now());
        state.branch = branch.map(|b| b.to_string());
        self.store.save(&state)?;
        self.store.flush()?;

        info!(
            changed = outcome.changed_files,
            deleted = outcome.deleted_files,
            skipped = outcome.skipped_files,
            "Indexing cycle completed"
        );

        Ok(CycleReport {
            no_change: false,
            changed_files: outcome.changed_files,
            deleted_files: outcome.deleted_files,
            skipped_files: outcome.skipped_files,
            upload: Some(upload),
        })
    }

    /// Drop the locally persisted snapshot, forcing the next cycle down
    /// the full-index path. Pairs with a remote purge.
    pub fn reset_local_state(&self) -> Result<(), IndexError> {
        self.store.clear(&self.workspace_hex)?;
        self.store.flush()?;
        Ok(())
    }
}

struct DeltaOutcome {
    chunks: Vec<CodeChunk>,
    deleted_ids: Vec<String>,
    changed_files: usize,
    deleted_files: usize,
    skipped_files: usize,
}

/// Build the tree, diff it against the previous snapshot, and assemble the
/// upload material. Returns `None` as the outcome when nothing changed.
fn compute_delta(
    root: PathBuf,
    rules: FilterRules,
    previous: Option<MerkleNode>,
    workspace_id: WorkspaceId,
    chunker: &dyn Chunker,
) -> Result<(MerkleNode, Option<DeltaOutcome>), IndexError> {
    let tree = TreeBuilder::new(root.clone(), rules).build()?;
    let delta = diff(previous.as_ref(), &tree);
    if delta.is_empty() {
        return Ok((tree, None));
    }

    let mut chunks = Vec::new();
    let mut skipped_files = 0usize;
    for changed in &delta.changed {
        let relative = path::workspace_relative(&root, changed)?;
        // Non-UTF-8 content goes through lossily rather than being skipped:
        // the new tree is persisted after upload, so a skip here would never
        // be retried. Only a file that vanished between the walk and the
        // read is skipped; the next build sees its deletion.
        let content = match fs::read(changed) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                warn!(path = %changed.display(), error = %e, "Skipping vanished changed file");
                skipped_files += 1;
                continue;
            }
        };
        let file_id = hex::encode(hasher::obfuscate_path(&relative, &workspace_id));
        for span in chunker.chunk_file(&relative, &content) {
            chunks.push(CodeChunk {
                file_id: file_id.clone(),
                text: span.text,
                start_line: span.start_line,
                end_line: span.end_line,
            });
        }
    }

    let deleted_ids = delta
        .deleted
        .iter()
        .map(|deleted| {
            let relative = path::workspace_relative(&root, deleted)?;
            Ok(hex::encode(hasher::obfuscate_path(&relative, &workspace_id)))
        })
        .collect::<Result<Vec<_>, IndexError>>()?;

    let outcome = DeltaOutcome {
        changed_files: delta.changed.len(),
        deleted_files: delta.deleted.len(),
        skipped_files,
        chunks,
        deleted_ids,
    };
    Ok((tree, Some(outcome)))
}

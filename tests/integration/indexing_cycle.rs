//! End-to-end indexing cycle tests against an in-memory transport

use async_trait::async_trait;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::Notify;
use treesync::error::{IndexError, SyncError};
use treesync::orchestrator::{FallbackChunker, IndexingOrchestrator};
use treesync::snapshot::SnapshotStore;
use treesync::sync::{DeltaPayload, DeltaTransport, UploadResult};
use treesync::tree::hasher::{hash_workspace_path, obfuscate_path};
use treesync::tree::path::canonicalize_root;
use treesync::tree::FilterRules;

#[derive(Default)]
struct RecordingInner {
    payloads: Mutex<Vec<DeltaPayload>>,
    fail_uploads: AtomicBool,
}

/// Records every delta it is asked to send; can be told to fail uploads.
#[derive(Clone, Default)]
struct RecordingTransport {
    inner: Arc<RecordingInner>,
}

impl RecordingTransport {
    fn payloads(&self) -> Vec<DeltaPayload> {
        self.inner.payloads.lock().unwrap().clone()
    }

    fn set_fail_uploads(&self, fail: bool) {
        self.inner.fail_uploads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DeltaTransport for RecordingTransport {
    async fn send_delta(&self, payload: &DeltaPayload) -> Result<UploadResult, SyncError> {
        if self.inner.fail_uploads.load(Ordering::SeqCst) {
            return Err(SyncError::Status {
                status: 500,
                message: "remote indexer exploded".to_string(),
            });
        }
        self.inner.payloads.lock().unwrap().push(payload.clone());
        Ok(UploadResult {
            files_processed: payload.chunks.len() as u64 + payload.deleted_files.len() as u64,
            chunks_indexed: payload.chunks.len() as u64,
            files_skipped: 0,
            errors: vec![],
            processing_ms: 1,
        })
    }

    async fn health(&self) -> Result<(), SyncError> {
        Ok(())
    }
}

/// Reports an unavailable remote.
struct UnhealthyTransport;

#[async_trait]
impl DeltaTransport for UnhealthyTransport {
    async fn send_delta(&self, _payload: &DeltaPayload) -> Result<UploadResult, SyncError> {
        panic!("send_delta must not be reached when the remote is unhealthy");
    }

    async fn health(&self) -> Result<(), SyncError> {
        Err(SyncError::Status {
            status: 503,
            message: "remote indexer reports unavailable".to_string(),
        })
    }
}

/// Parks inside send_delta until released, for exercising single-flight.
#[derive(Clone)]
struct BlockingTransport {
    started: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl DeltaTransport for BlockingTransport {
    async fn send_delta(&self, payload: &DeltaPayload) -> Result<UploadResult, SyncError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(UploadResult {
            files_processed: payload.chunks.len() as u64,
            chunks_indexed: payload.chunks.len() as u64,
            files_skipped: 0,
            errors: vec![],
            processing_ms: 1,
        })
    }

    async fn health(&self) -> Result<(), SyncError> {
        Ok(())
    }
}

fn orchestrator<T: DeltaTransport>(
    root: &Path,
    store_dir: &Path,
    transport: T,
) -> IndexingOrchestrator<T> {
    IndexingOrchestrator::new(
        root.to_path_buf(),
        FilterRules::permit_all(),
        SnapshotStore::open(store_dir).unwrap(),
        transport,
        Arc::new(FallbackChunker),
    )
    .unwrap()
}

#[tokio::test]
async fn test_first_cycle_indexes_everything() {
    let ws = TempDir::new().unwrap();
    let store_dir = TempDir::new().unwrap();
    fs::write(ws.path().join("a.rs"), "fn a() {}").unwrap();
    fs::write(ws.path().join("b.rs"), "fn b() {}").unwrap();

    let transport = RecordingTransport::default();
    let orch = orchestrator(ws.path(), store_dir.path(), transport.clone());

    let report = orch.run_cycle(Some("main")).await.unwrap();
    assert!(!report.no_change);
    assert_eq!(report.changed_files, 2);
    assert_eq!(report.deleted_files, 0);

    let payloads = transport.payloads();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].chunks.len(), 2);
    assert!(payloads[0].deleted_files.is_empty());
    assert_eq!(payloads[0].branch.as_deref(), Some("main"));
    assert_eq!(payloads[0].workspace_id, orch.workspace_id());
}

#[tokio::test]
async fn test_unchanged_workspace_skips_network() {
    let ws = TempDir::new().unwrap();
    let store_dir = TempDir::new().unwrap();
    fs::write(ws.path().join("a.rs"), "fn a() {}").unwrap();

    let transport = RecordingTransport::default();
    let orch = orchestrator(ws.path(), store_dir.path(), transport.clone());

    orch.run_cycle(None).await.unwrap();
    let report = orch.run_cycle(None).await.unwrap();

    assert!(report.no_change);
    assert_eq!(report.changed_files, 0);
    // Only the first cycle produced an upload.
    assert_eq!(transport.payloads().len(), 1);
}

#[tokio::test]
async fn test_incremental_cycle_sends_only_the_delta() {
    let ws = TempDir::new().unwrap();
    let store_dir = TempDir::new().unwrap();
    fs::write(ws.path().join("a.rs"), "fn a() {}").unwrap();
    fs::write(ws.path().join("b.rs"), "fn b() {}").unwrap();

    let transport = RecordingTransport::default();
    let orch = orchestrator(ws.path(), store_dir.path(), transport.clone());
    orch.run_cycle(None).await.unwrap();

    fs::write(ws.path().join("a.rs"), "fn a() { /* changed */ }").unwrap();
    fs::remove_file(ws.path().join("b.rs")).unwrap();

    let report = orch.run_cycle(None).await.unwrap();
    assert_eq!(report.changed_files, 1);
    assert_eq!(report.deleted_files, 1);

    let payloads = transport.payloads();
    assert_eq!(payloads.len(), 2);
    let second = &payloads[1];
    assert_eq!(second.chunks.len(), 1);
    assert_eq!(second.deleted_files.len(), 1);

    // The deleted id must match what the earlier upload used for b.rs, so
    // the remote can reconcile the deletion.
    let canonical = canonicalize_root(ws.path()).unwrap();
    let workspace = hash_workspace_path(&canonical);
    let expected = hex::encode(obfuscate_path("b.rs", &workspace));
    assert_eq!(second.deleted_files[0], expected);
}

#[tokio::test]
async fn test_rename_surfaces_as_delete_plus_new() {
    let ws = TempDir::new().unwrap();
    let store_dir = TempDir::new().unwrap();
    fs::write(ws.path().join("old-name.rs"), "fn same() {}").unwrap();

    let transport = RecordingTransport::default();
    let orch = orchestrator(ws.path(), store_dir.path(), transport.clone());
    orch.run_cycle(None).await.unwrap();

    // Same content under a new name.
    fs::rename(ws.path().join("old-name.rs"), ws.path().join("new-name.rs")).unwrap();

    let report = orch.run_cycle(None).await.unwrap();
    assert!(!report.no_change);
    assert_eq!(report.changed_files, 1);
    assert_eq!(report.deleted_files, 1);

    let payloads = transport.payloads();
    assert_eq!(payloads.len(), 2);
    let second = &payloads[1];
    assert_eq!(second.chunks.len(), 1);

    let canonical = canonicalize_root(ws.path()).unwrap();
    let workspace = hash_workspace_path(&canonical);
    let old_id = hex::encode(obfuscate_path("old-name.rs", &workspace));
    let new_id = hex::encode(obfuscate_path("new-name.rs", &workspace));
    assert_eq!(second.deleted_files, vec![old_id]);
    assert_eq!(second.chunks[0].file_id, new_id);
}

#[tokio::test]
async fn test_non_utf8_change_is_uploaded_not_dropped() {
    let ws = TempDir::new().unwrap();
    let store_dir = TempDir::new().unwrap();
    fs::write(ws.path().join("a.bin"), "plain text v1").unwrap();

    let transport = RecordingTransport::default();
    let orch = orchestrator(ws.path(), store_dir.path(), transport.clone());
    orch.run_cycle(None).await.unwrap();

    // Invalid UTF-8: 0xFF can never appear in a well-formed sequence.
    fs::write(ws.path().join("a.bin"), [0xFFu8, 0xFE, b'v', b'2']).unwrap();

    let report = orch.run_cycle(None).await.unwrap();
    assert!(!report.no_change);
    assert_eq!(report.changed_files, 1);
    assert_eq!(report.skipped_files, 0);

    // The change went out lossily rather than being silently dropped.
    let payloads = transport.payloads();
    assert_eq!(payloads.len(), 2);
    assert_eq!(payloads[1].chunks.len(), 1);
    assert!(payloads[1].chunks[0].text.contains('\u{FFFD}'));
    assert!(payloads[1].chunks[0].text.contains("v2"));

    // The persisted snapshot reflects content that was actually delivered.
    let third = orch.run_cycle(None).await.unwrap();
    assert!(third.no_change);
}

#[tokio::test]
async fn test_failed_upload_leaves_snapshot_and_delta_intact() {
    let ws = TempDir::new().unwrap();
    let store_dir = TempDir::new().unwrap();
    fs::write(ws.path().join("a.rs"), "v1").unwrap();

    let transport = RecordingTransport::default();
    let orch = orchestrator(ws.path(), store_dir.path(), transport.clone());
    orch.run_cycle(None).await.unwrap();

    fs::write(ws.path().join("a.rs"), "v2").unwrap();

    transport.set_fail_uploads(true);
    let err = orch.run_cycle(None).await;
    assert!(matches!(err, Err(IndexError::Sync(_))));

    // The snapshot did not advance, so the next cycle recomputes the same
    // delta and the retry succeeds (at-least-once, not at-most-once).
    transport.set_fail_uploads(false);
    let report = orch.run_cycle(None).await.unwrap();
    assert!(!report.no_change);
    assert_eq!(report.changed_files, 1);

    let payloads = transport.payloads();
    assert_eq!(payloads.len(), 2);
    assert_eq!(payloads[1].chunks[0].text, "v2");
}

#[tokio::test]
async fn test_unhealthy_remote_aborts_before_any_work() {
    let ws = TempDir::new().unwrap();
    let store_dir = TempDir::new().unwrap();
    fs::write(ws.path().join("a.rs"), "fn a() {}").unwrap();

    let orch = orchestrator(ws.path(), store_dir.path(), UnhealthyTransport);
    let err = orch.run_cycle(None).await;
    assert!(matches!(err, Err(IndexError::RemoteUnavailable(_))));
}

#[tokio::test]
async fn test_second_trigger_rejected_while_cycle_in_flight() {
    let ws = TempDir::new().unwrap();
    let store_dir = TempDir::new().unwrap();
    fs::write(ws.path().join("a.rs"), "fn a() {}").unwrap();

    let transport = BlockingTransport {
        started: Arc::new(Notify::new()),
        release: Arc::new(Notify::new()),
    };
    let started = Arc::clone(&transport.started);
    let release = Arc::clone(&transport.release);

    let orch = Arc::new(orchestrator(ws.path(), store_dir.path(), transport));

    let runner = {
        let orch = Arc::clone(&orch);
        tokio::spawn(async move { orch.run_cycle(None).await })
    };

    // Wait until the first cycle is parked inside the upload.
    started.notified().await;

    let second = orch.run_cycle(None).await;
    assert!(matches!(second, Err(IndexError::CycleInProgress)));

    release.notify_one();
    let first = runner.await.unwrap();
    assert!(first.is_ok());
}

/// First cycle indexes a 1,000-file workspace; a second cycle with zero
/// filesystem changes short-circuits on the root hash and sends nothing.
#[tokio::test]
async fn test_large_workspace_full_then_noop() {
    let ws = TempDir::new().unwrap();
    let store_dir = TempDir::new().unwrap();
    for d in 0..10 {
        let dir = ws.path().join(format!("dir{:02}", d));
        fs::create_dir(&dir).unwrap();
        for f in 0..100 {
            fs::write(dir.join(format!("file{:03}.rs", f)), format!("fn f{}() {{}}", f))
                .unwrap();
        }
    }

    let transport = RecordingTransport::default();
    let orch = orchestrator(ws.path(), store_dir.path(), transport.clone());

    let first = orch.run_cycle(None).await.unwrap();
    assert_eq!(first.changed_files, 1000);

    let second = orch.run_cycle(None).await.unwrap();
    assert!(second.no_change);
    assert_eq!(transport.payloads().len(), 1);
}

#[tokio::test]
async fn test_reset_local_state_forces_full_reindex() {
    let ws = TempDir::new().unwrap();
    let store_dir = TempDir::new().unwrap();
    fs::write(ws.path().join("a.rs"), "fn a() {}").unwrap();

    let transport = RecordingTransport::default();
    let orch = orchestrator(ws.path(), store_dir.path(), transport.clone());
    orch.run_cycle(None).await.unwrap();

    orch.reset_local_state().unwrap();

    let report = orch.run_cycle(None).await.unwrap();
    assert!(!report.no_change);
    assert_eq!(report.changed_files, 1);
    assert_eq!(transport.payloads().len(), 2);
}

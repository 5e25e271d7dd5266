//! Synchronization client for the remote indexer
//!
//! Serializes a delta (changed-file chunks, deleted-file identifiers,
//! branch context), gzips it, and ships it to the remote service. Only
//! obfuscated identifiers ever cross the wire; raw local paths stay local.

use crate::error::SyncError;
use async_trait::async_trait;

pub mod client;
pub mod payload;

pub use client::{HttpSyncClient, SyncClientConfig};
pub use payload::{CodeChunk, DeltaPayload, RemoteStatus, UploadResult};

/// Transport seam for delta uploads.
///
/// `HttpSyncClient` is the production implementation; the orchestrator is
/// written against this trait so cycles can be exercised without a network.
/// Implementations must not retry internally — retry policy belongs to the
/// orchestrator, which alone knows whether a retry risks double-reporting
/// deletions.
#[async_trait]
pub trait DeltaTransport: Send + Sync {
    /// Upload a compressed delta payload and return the remote
    /// acknowledgment.
    async fn send_delta(&self, payload: &DeltaPayload) -> Result<UploadResult, SyncError>;

    /// Lightweight liveness probe, no payload. Used by the orchestrator to
    /// decide whether to attempt a sync cycle at all.
    async fn health(&self) -> Result<(), SyncError>;
}

//! HTTP client for the remote indexer

use crate::error::SyncError;
use crate::sync::payload::{DeltaPayload, RemoteStatus, UploadResult};
use crate::sync::DeltaTransport;
use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_ENCODING, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Health probes carry no payload and should answer fast regardless of the
/// configured upload timeout.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Client configuration, supplied by the caller — nothing here is
/// hardcoded inside the engine.
#[derive(Debug, Clone)]
pub struct SyncClientConfig {
    /// Base URL of the remote indexer, e.g. `https://indexer.example.com`.
    pub base_url: String,
    /// Upload timeout. Deltas can be large and remote processing slow, so
    /// this is typically minutes, not seconds.
    pub request_timeout: Duration,
    pub api_key: Option<String>,
}

/// Reqwest-based sync client.
///
/// Compresses the JSON delta with gzip before transmission and surfaces
/// transport and non-2xx failures as typed errors. Requests are cancelled
/// by dropping the returned future; no retries happen here.
pub struct HttpSyncClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpSyncClient {
    pub fn new(config: SyncClientConfig) -> Result<Self, SyncError> {
        if config.base_url.is_empty() {
            return Err(SyncError::InvalidUrl("base URL is empty".to_string()));
        }
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> Result<HeaderMap, SyncError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &self.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|_| SyncError::InvalidUrl("API key contains invalid characters".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Query the remote index status for a workspace.
    pub async fn status(&self, workspace_id: &str) -> Result<RemoteStatus, SyncError> {
        let url = self.endpoint(&format!("/index/{}/status", workspace_id));
        let response = self
            .http
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Ask the remote service to wipe all data for a workspace.
    #[instrument(skip(self))]
    pub async fn purge(&self, workspace_id: &str) -> Result<(), SyncError> {
        let url = self.endpoint(&format!("/index/{}", workspace_id));
        let response = self
            .http
            .delete(&url)
            .headers(self.auth_headers()?)
            .send()
            .await?;
        check_status(response).await?;
        info!(workspace = workspace_id, "Purged remote index");
        Ok(())
    }
}

fn gzip(bytes: &[u8]) -> Result<Vec<u8>, SyncError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).map_err(SyncError::Compression)?;
    encoder.finish().map_err(SyncError::Compression)
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SyncError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), "Remote indexer rejected request");
    Err(SyncError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl DeltaTransport for HttpSyncClient {
    #[instrument(skip(self, payload), fields(
        workspace = %payload.workspace_id,
        chunks = payload.chunks.len(),
        deleted = payload.deleted_files.len(),
    ))]
    async fn send_delta(&self, payload: &DeltaPayload) -> Result<UploadResult, SyncError> {
        let json = serde_json::to_vec(payload)?;
        let compressed = gzip(&json)?;
        debug!(
            raw_bytes = json.len(),
            compressed_bytes = compressed.len(),
            "Compressed delta payload"
        );

        let mut headers = self.auth_headers()?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));

        let response = self
            .http
            .post(self.endpoint("/index/delta"))
            .headers(headers)
            .body(compressed)
            .send()
            .await?;
        let response = check_status(response).await?;
        let result: UploadResult = response.json().await?;
        info!(
            files_processed = result.files_processed,
            chunks_indexed = result.chunks_indexed,
            processing_ms = result.processing_ms,
            "Delta upload acknowledged"
        );
        Ok(result)
    }

    async fn health(&self) -> Result<(), SyncError> {
        let response = self
            .http
            .get(self.endpoint("/health"))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await?;
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::SERVICE_UNAVAILABLE => Err(SyncError::Status {
                status: 503,
                message: "remote indexer reports unavailable".to_string(),
            }),
            status => Err(SyncError::Status {
                status: status.as_u16(),
                message: "health check failed".to_string(),
            }),
        }
    }
}

//! Configuration for the indexing engine
//!
//! Everything the engine consumes is passed in here: inclusion/exclusion
//! glob patterns, server base URL, request timeout, optional API key.
//! Nothing is hardcoded inside the engine; the default exclusion list is a
//! documented value callers may extend or override.

use crate::error::ConfigError;
use crate::logging::LoggingConfig;
use crate::sync::SyncClientConfig;
use crate::tree::FilterRules;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Root configuration for the indexer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Base URL of the remote indexer service.
    pub server_url: String,

    /// Upload timeout in seconds. Deltas can be large and remote
    /// processing slow, so the default is deliberately long.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Optional bearer API key for the remote service.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Glob patterns for files to include. Empty means "all files".
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Glob patterns for entries to exclude. Defaults to the documented
    /// exclusion list below; supplying a value replaces it entirely.
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_request_timeout_secs() -> u64 {
    300
}

/// The documented default exclusion list: VCS internals, dependency
/// caches, build output, editor state. Callers may extend or replace it.
pub fn default_exclude_patterns() -> Vec<String> {
    [
        ".git",
        ".hg",
        ".svn",
        "node_modules",
        "target",
        "dist",
        "build",
        "out",
        ".cargo",
        ".venv",
        "__pycache__",
        ".idea",
        ".vscode",
        ".DS_Store",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
            api_key: None,
            include_patterns: Vec::new(),
            exclude_patterns: default_exclude_patterns(),
            logging: LoggingConfig::default(),
        }
    }
}

impl IndexerConfig {
    /// Load configuration from an optional file, with `TREESYNC_`-prefixed
    /// environment variables overriding file values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(config::Environment::with_prefix("TREESYNC"));

        let loaded: Self = builder.build()?.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Validate the configuration. Compiles every glob pattern so a
    /// malformed pattern fails here, before any traversal begins.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_url.is_empty() {
            return Err(ConfigError::Load("server_url must be set".to_string()));
        }
        self.filter_rules().map(|_| ())
    }

    /// Compile the pattern lists into reusable matchers.
    pub fn filter_rules(&self) -> Result<FilterRules, ConfigError> {
        FilterRules::new(&self.include_patterns, &self.exclude_patterns)
    }

    /// The sync-client view of this configuration.
    pub fn sync_client_config(&self) -> SyncClientConfig {
        SyncClientConfig {
            base_url: self.server_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            api_key: self.api_key.clone(),
        }
    }
}

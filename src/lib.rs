//! Treesync: Incremental Workspace Indexing
//!
//! Keeps a remote code-search indexer up to date without re-uploading
//! unchanged files. A BLAKE3 Merkle tree is built over the workspace,
//! diffed against the last confirmed-synced snapshot, and the resulting
//! delta (changed-file chunks plus deleted-file identifiers) is compressed
//! and shipped to the remote service under obfuscated path identifiers.

pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod snapshot;
pub mod sync;
pub mod tree;
pub mod types;

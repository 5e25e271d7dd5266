//! Hash computation and path obfuscation using BLAKE3
//!
//! Every digest here is domain-separated with a discriminator string and
//! big-endian length prefixes so that structurally different inputs can
//! never collide by concatenation.

use crate::tree::path;
use crate::types::{Hash, ObfuscatedId, WorkspaceId};
use blake3::Hasher;
use std::path::Path;

/// Compute the content hash of file bytes.
pub fn hash_content(content: &[u8]) -> Hash {
    let mut hasher = Hasher::new();
    hasher.update(b"file");
    hasher.update(&(content.len() as u64).to_be_bytes());
    hasher.update(content);
    *hasher.finalize().as_bytes()
}

/// Combine named child hashes into a directory hash.
///
/// Each child contributes its entry name as well as its digest, so a file
/// renamed without a content change still produces a different parent hash
/// and the rename surfaces as a deletion plus a new file downstream.
/// Order-sensitive: callers must present children in a canonical order
/// (the builder sorts by entry name) so two builds of the same workspace
/// combine identically.
pub fn combine_hashes(children: &[(String, Hash)]) -> Hash {
    let mut hasher = Hasher::new();
    hasher.update(b"directory");
    hasher.update(&(children.len() as u64).to_be_bytes());
    for (name, hash) in children {
        hasher.update(&(name.len() as u64).to_be_bytes());
        hasher.update(name.as_bytes());
        hasher.update(hash);
    }
    *hasher.finalize().as_bytes()
}

/// Sentinel hash for a directory with no includable descendants.
///
/// Distinct domain string, so it can never equal `combine_hashes(&[])`.
pub fn empty_directory_hash() -> Hash {
    let mut hasher = Hasher::new();
    hasher.update(b"empty-directory");
    *hasher.finalize().as_bytes()
}

/// Deterministic one-way identifier for a workspace root path.
///
/// Pure function of the normalized path string; stable across process
/// restarts with no stored state.
pub fn hash_workspace_path(absolute_path: &Path) -> WorkspaceId {
    let normalized = path::normalize_path_string(&absolute_path.to_string_lossy());
    let mut hasher = Hasher::new();
    hasher.update(b"workspace");
    hasher.update(&(normalized.len() as u64).to_be_bytes());
    hasher.update(normalized.as_bytes());
    *hasher.finalize().as_bytes()
}

/// Obfuscate a workspace-relative path for transmission.
///
/// Keyed BLAKE3 with the workspace identifier as key: the same file in the
/// same workspace always maps to the same id across syncs (so the remote
/// can match a later deletion to an earlier upload), the same relative path
/// in a different workspace maps to a different id, and the mapping is not
/// invertible without the local workspace path.
pub fn obfuscate_path(relative: &str, workspace: &WorkspaceId) -> ObfuscatedId {
    let normalized = path::normalize_path_string(relative);
    *blake3::keyed_hash(workspace, normalized.as_bytes()).as_bytes()
}

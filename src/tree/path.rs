//! Path canonicalization and normalization utilities
//!
//! All hashing goes through these helpers so that the same workspace
//! produces the same identifiers regardless of Unicode encoding form,
//! trailing slashes, or platform path quirks.

use crate::error::TreeError;
use std::path::{Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Canonicalize a path for use as a workspace root (resolves symlinks,
/// `..`, `.`; strips Windows UNC verbosity via dunce).
pub fn canonicalize_root(path: &Path) -> Result<PathBuf, TreeError> {
    dunce::canonicalize(path)
        .map_err(|e| TreeError::InvalidPath(format!("Failed to canonicalize {:?}: {}", path, e)))
}

/// Normalize a path string for hashing (no filesystem access).
///
/// Applies Unicode NFC and strips trailing separators (except a bare root).
pub fn normalize_path_string(path: &str) -> String {
    let mut result: String = path.nfc().collect();
    if result.len() > 1 {
        while result.ends_with('/') || result.ends_with('\\') {
            result.pop();
        }
    }
    result
}

/// Normalize a workspace-relative path to the canonical wire form:
/// NFC, forward slashes, no leading separator.
pub fn normalize_relative(relative: &Path) -> String {
    let joined = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    let normalized: String = joined.nfc().collect();
    normalized.trim_start_matches('/').to_string()
}

/// Strip the workspace root from an absolute path, yielding the canonical
/// relative wire form. Errors if the path is outside the workspace.
pub fn workspace_relative(root: &Path, path: &Path) -> Result<String, TreeError> {
    let rel = path.strip_prefix(root).map_err(|_| {
        TreeError::InvalidPath(format!("Path {:?} is outside workspace {:?}", path, root))
    })?;
    Ok(normalize_relative(rel))
}

//! Merkle node representation for files and directories

use crate::types::Hash;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A node in the workspace hash tree.
///
/// `children: None` marks a leaf (file); `Some` marks a directory, with
/// children in name-sorted order. The hash is a pure function of file
/// content (leaf) or of the children's hashes (directory) — `size` and
/// `last_modified` are diagnostic metadata and never feed the hash, so a
/// touched-but-unchanged file does not register as changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerkleNode {
    pub hash: Hash,
    /// Absolute local path. Used only on this machine; obfuscated before
    /// anything is transmitted.
    pub path: PathBuf,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    /// `None` marks a leaf. Kept as a plain option (no serde skip) so the
    /// bincode snapshot encoding stays self-describing.
    pub children: Option<Vec<MerkleNode>>,
}

impl MerkleNode {
    pub fn is_file(&self) -> bool {
        self.children.is_none()
    }

    pub fn is_directory(&self) -> bool {
        self.children.is_some()
    }

    /// Final path segment, used as the child identifier during diffing.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// All leaf paths reachable from this node, in traversal order.
    pub fn leaf_paths(&self) -> Vec<PathBuf> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves(&self, out: &mut Vec<PathBuf>) {
        match &self.children {
            None => out.push(self.path.clone()),
            Some(children) => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }

    /// Find the node at an exact absolute path, if present.
    pub fn find(&self, path: &Path) -> Option<&MerkleNode> {
        if self.path == path {
            return Some(self);
        }
        match &self.children {
            None => None,
            Some(children) => children.iter().find_map(|c| c.find(path)),
        }
    }
}

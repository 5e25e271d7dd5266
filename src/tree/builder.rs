//! Tree builder for constructing workspace Merkle trees

use crate::error::TreeError;
use crate::tree::hasher;
use crate::tree::node::MerkleNode;
use crate::tree::path;
use crate::tree::rules::FilterRules;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, instrument, trace, warn};

/// Tree builder for constructing workspace Merkle trees.
///
/// Construction is recursive and immutable: children are built first as
/// pure values and the parent node is assembled from the finished results.
/// Per-entry I/O errors are absorbed (the entry is skipped with a warning);
/// only an unreadable root aborts the build.
pub struct TreeBuilder {
    root: PathBuf,
    rules: FilterRules,
}

impl TreeBuilder {
    /// Create a new tree builder for the given workspace root.
    pub fn new(root: PathBuf, rules: FilterRules) -> Self {
        Self { root, rules }
    }

    /// Build the complete Merkle tree from the filesystem.
    ///
    /// Fails only if the root itself is missing or unreadable. Children
    /// are hashed in name-sorted order so two builds of an unchanged
    /// workspace produce bit-identical trees.
    #[instrument(skip(self), fields(workspace = %self.root.display()))]
    pub fn build(&self) -> Result<MerkleNode, TreeError> {
        let start = Instant::now();
        info!("Starting tree build");

        let metadata = fs::symlink_metadata(&self.root).map_err(|e| TreeError::RootUnreadable {
            path: self.root.clone(),
            source: e,
        })?;

        let tree = if metadata.is_dir() {
            self.build_directory(&self.root)
                .map_err(|e| match e {
                    // A root read_dir failure is build-fatal, not skippable.
                    TreeError::IoError(io) => TreeError::RootUnreadable {
                        path: self.root.clone(),
                        source: io,
                    },
                    other => other,
                })?
        } else {
            self.build_file(&self.root, &metadata)?
        };

        let duration = start.elapsed();
        info!(
            root_hash = %hex::encode(tree.hash),
            file_count = tree.leaf_paths().len(),
            duration_ms = duration.as_millis(),
            "Tree build completed"
        );

        Ok(tree)
    }

    /// Convenience: build the tree and return only the root hash.
    pub fn compute_root(&self) -> Result<crate::types::Hash, TreeError> {
        Ok(self.build()?.hash)
    }

    /// Build a directory node. Children are produced bottom-up; entries
    /// that fail to stat or read are skipped, excluded entries are never
    /// descended into.
    fn build_directory(&self, dir_path: &Path) -> Result<MerkleNode, TreeError> {
        let read_dir = fs::read_dir(dir_path)?;

        let mut entries: Vec<(String, PathBuf)> = Vec::new();
        for entry in read_dir {
            match entry {
                Ok(e) => {
                    let name = e.file_name().to_string_lossy().to_string();
                    entries.push((name, e.path()));
                }
                Err(e) => {
                    warn!(dir = %dir_path.display(), error = %e, "Skipping unreadable directory entry");
                }
            }
        }

        // Sort by entry name for deterministic child order.
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut children: Vec<MerkleNode> = Vec::new();
        for (name, entry_path) in entries {
            let relative = match path::workspace_relative(&self.root, &entry_path) {
                Ok(r) => r,
                Err(e) => {
                    warn!(path = %entry_path.display(), error = %e, "Skipping entry outside workspace");
                    continue;
                }
            };

            // Exclusion is checked before inclusion and before recursing,
            // so excluded subtrees are never traversed.
            if self.rules.is_excluded(&relative, &name) {
                trace!(path = %relative, "Excluded");
                continue;
            }

            match self.build_entry(&entry_path, &relative, &name) {
                Ok(Some(child)) => children.push(child),
                Ok(None) => {}
                Err(e) => {
                    // Permission denied, vanished mid-walk, broken symlink:
                    // a partial tree beats aborting the whole index.
                    warn!(path = %entry_path.display(), error = %e, "Skipping unreadable entry");
                }
            }
        }

        let hash = if children.is_empty() {
            hasher::empty_directory_hash()
        } else {
            // Name-sorted (name, hash) pairs: the entry name feeds the
            // digest so renames change the parent hash.
            let named: Vec<(String, _)> =
                children.iter().map(|c| (c.file_name(), c.hash)).collect();
            hasher::combine_hashes(&named)
        };
        debug!(dir = %dir_path.display(), children = children.len(), "Hashed directory");

        Ok(MerkleNode {
            hash,
            path: dir_path.to_path_buf(),
            size: 0,
            last_modified: None,
            children: Some(children),
        })
    }

    /// Build a single directory entry: recurse into subdirectories, hash
    /// includable files, skip everything else (symlinks, sockets, files
    /// the include rules reject).
    fn build_entry(
        &self,
        entry_path: &Path,
        relative: &str,
        name: &str,
    ) -> Result<Option<MerkleNode>, TreeError> {
        let metadata = fs::symlink_metadata(entry_path)?;

        if metadata.is_dir() {
            return self.build_directory(entry_path).map(Some);
        }

        if metadata.is_file() {
            if !self.rules.is_included(relative, name) {
                trace!(path = %relative, "Not included");
                return Ok(None);
            }
            return self.build_file(entry_path, &metadata).map(Some);
        }

        // Symlinks are not followed, for determinism.
        trace!(path = %relative, "Skipping non-regular entry");
        Ok(None)
    }

    /// Hash a file's content and produce a leaf node.
    fn build_file(&self, file_path: &Path, metadata: &fs::Metadata) -> Result<MerkleNode, TreeError> {
        let content = fs::read(file_path)?;
        let hash = hasher::hash_content(&content);
        trace!(path = %file_path.display(), hash = %hex::encode(hash), "Hashed file");

        let last_modified = metadata
            .modified()
            .ok()
            .map(DateTime::<Utc>::from);

        Ok(MerkleNode {
            hash,
            path: file_path.to_path_buf(),
            size: metadata.len(),
            last_modified,
            children: None,
        })
    }
}

//! Tree comparison: derive the changed/deleted file set between snapshots
//!
//! Matching hashes short-circuit at every level, so a no-op cycle costs a
//! single root comparison and a mostly-unchanged workspace only descends
//! into the subtrees that actually differ.

use crate::tree::node::MerkleNode;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// The delta between two tree snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeDiff {
    /// Files whose content is new or differs from the previous snapshot.
    pub changed: Vec<PathBuf>,
    /// Files present in the previous snapshot but gone from the current one.
    pub deleted: Vec<PathBuf>,
}

impl TreeDiff {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.deleted.is_empty()
    }
}

/// Compare a previous snapshot against a freshly built tree.
///
/// `previous == None` is the full-index path: every leaf of `current` is
/// reported as changed and nothing as deleted.
pub fn diff(previous: Option<&MerkleNode>, current: &MerkleNode) -> TreeDiff {
    let mut out = TreeDiff::default();
    match previous {
        None => out.changed = current.leaf_paths(),
        Some(prev) => diff_nodes(prev, current, &mut out),
    }
    debug!(
        changed = out.changed.len(),
        deleted = out.deleted.len(),
        "Computed tree diff"
    );
    out
}

fn diff_nodes(previous: &MerkleNode, current: &MerkleNode, out: &mut TreeDiff) {
    // Equal hashes mean identical subtrees; skip without descending.
    if previous.hash == current.hash {
        return;
    }

    match (&previous.children, &current.children) {
        // Leaf vs leaf with differing hashes: content changed.
        (None, None) => out.changed.push(current.path.clone()),

        // Type changed under the same name: hash comparison is meaningless
        // across the change, so the old side is deleted wholesale and the
        // new side is new wholesale.
        (None, Some(_)) => {
            out.deleted.push(previous.path.clone());
            out.changed.extend(current.leaf_paths());
        }
        (Some(_), None) => {
            out.deleted.extend(previous.leaf_paths());
            out.changed.push(current.path.clone());
        }

        (Some(prev_children), Some(cur_children)) => {
            // One lookup per level, keyed by path segment; no linear
            // rescans. Iteration follows the (sorted) child vectors so the
            // reported order is deterministic.
            let prev_by_name: HashMap<String, &MerkleNode> = prev_children
                .iter()
                .map(|c| (c.file_name(), c))
                .collect();
            let cur_by_name: HashMap<String, &MerkleNode> = cur_children
                .iter()
                .map(|c| (c.file_name(), c))
                .collect();

            for cur_child in cur_children {
                match prev_by_name.get(&cur_child.file_name()) {
                    Some(prev_child) => diff_nodes(prev_child, cur_child, out),
                    // Entire subtree is new: every leaf is changed-as-new.
                    None => out.changed.extend(cur_child.leaf_paths()),
                }
            }

            for prev_child in prev_children {
                if !cur_by_name.contains_key(&prev_child.file_name()) {
                    // Entire subtree removed: every leaf is deleted.
                    out.deleted.extend(prev_child.leaf_paths());
                }
            }
        }
    }
}

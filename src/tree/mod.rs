//! Workspace Merkle Tree
//!
//! Represents the workspace as a content-addressable hash tree, where each
//! node (file or directory) has a deterministic hash derived from content
//! and structure, never from metadata. The diff module derives the exact
//! changed/deleted file set between two trees.

pub mod builder;
pub mod diff;
pub mod hasher;
pub mod node;
pub mod path;
pub mod rules;

pub use builder::TreeBuilder;
pub use diff::{diff, TreeDiff};
pub use node::MerkleNode;
pub use rules::FilterRules;

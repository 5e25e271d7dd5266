//! Core types for the incremental workspace indexing engine.

/// Hash: generic 256-bit BLAKE3 digest
pub type Hash = [u8; 32];

/// WorkspaceId: deterministic one-way digest of the workspace root path,
/// hex-encoded at every boundary that leaves the process
pub type WorkspaceId = Hash;

/// ObfuscatedId: keyed digest standing in for a workspace-relative file path
pub type ObfuscatedId = Hash;

//! Inclusion/exclusion rules for the tree build
//!
//! Patterns are glob-style and compiled once into matchers that are reused
//! across the whole build. Exclusion is tested against both the
//! workspace-relative path and the bare entry name, so common directories
//! (dependency caches, VCS internals, build output) are pruned even when a
//! pattern names only the directory.

use crate::error::ConfigError;
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Compiled filter rules for a single tree build.
///
/// The default exclusion list is owned by the configuration layer
/// (`config::default_exclude_patterns`) and injected here by callers; the
/// builder carries no baked-in pattern state.
#[derive(Debug, Clone)]
pub struct FilterRules {
    include: Option<GlobSet>,
    exclude: GlobSet,
}

impl FilterRules {
    /// Compile pattern lists into rules.
    ///
    /// An empty include list means "include every file". A malformed
    /// pattern fails here, before any traversal begins.
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, ConfigError> {
        let include = if include.is_empty() {
            None
        } else {
            Some(compile(include)?)
        };
        let exclude = compile(exclude)?;
        Ok(Self { include, exclude })
    }

    /// Rules that include everything and exclude nothing.
    pub fn permit_all() -> Self {
        Self {
            include: None,
            exclude: GlobSet::empty(),
        }
    }

    /// Whether an entry is excluded. Checked before inclusion and before
    /// recursing, so an excluded subtree is never traversed.
    pub fn is_excluded(&self, relative_path: &str, entry_name: &str) -> bool {
        self.exclude.is_match(relative_path) || self.exclude.is_match(entry_name)
    }

    /// Whether a file passes the inclusion rules. Applies to files only;
    /// directories are traversed unless excluded.
    pub fn is_included(&self, relative_path: &str, entry_name: &str) -> bool {
        match &self.include {
            None => true,
            Some(set) => set.is_match(relative_path) || set.is_match(entry_name),
        }
    }
}

fn compile(patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| ConfigError::Pattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| ConfigError::Load(e.to_string()))
}

// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Where commits and their patch text come from

use std::collections::HashMap;

use crate::commit::{Commit, History};
use crate::error::ReplayError;

/// Supplier of history and per-commit patch text
///
/// The engine never talks to a version-control tool directly; it only asks a
/// source for commits and for the unified diff each one introduces.
pub trait CommitSource {
    /// All commits to replay, oldest first
    ///
    /// # Errors
    ///
    /// Returns `ReplayError::Source` if the history cannot be read.
    fn history(&self) -> Result<History, ReplayError>;

    /// Unified diff introduced by `commit`
    ///
    /// # Errors
    ///
    /// Returns `ReplayError::Source` if the patch cannot be produced.
    fn raw_patch(&self, commit: &Commit) -> Result<String, ReplayError>;

    /// Unified diff between two commits
    ///
    /// # Errors
    ///
    /// Returns `ReplayError::Source` if the source cannot diff arbitrary
    /// commit pairs or either commit is unknown.
    fn raw_patch_between(&self, from: &str, to: &str) -> Result<String, ReplayError> {
        Err(ReplayError::Source {
            message: format!("cannot diff {from}..{to}: pair diffs are not supported"),
        })
    }
}

/// A source holding commits and patch texts in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    commits: Vec<Commit>,
    patches: HashMap<String, String>,
}

impl MemorySource {
    /// Create an empty source
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a commit after every commit added so far
    #[must_use]
    pub fn with_commit(mut self, commit: Commit, patch: impl Into<String>) -> Self {
        self.push(commit, patch);
        self
    }

    /// Append a commit after every commit added so far
    pub fn push(&mut self, commit: Commit, patch: impl Into<String>) {
        self.patches.insert(commit.sha.clone(), patch.into());
        self.commits.push(commit);
    }
}

impl CommitSource for MemorySource {
    fn history(&self) -> Result<History, ReplayError> {
        Ok(History::from_oldest_first(self.commits.clone()))
    }

    fn raw_patch(&self, commit: &Commit) -> Result<String, ReplayError> {
        self.patches
            .get(&commit.sha)
            .cloned()
            .ok_or_else(|| ReplayError::Source {
                message: format!("no patch for commit {}", commit.sha),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_history_order() {
        let source = MemorySource::new()
            .with_commit(Commit::new("c1", "a", "first"), "")
            .with_commit(Commit::new("c2", "a", "second"), "");
        let history = source.history().expect("history");
        let shas: Vec<_> = history.iter().map(|c| (c.sha.as_str(), c.ordinal)).collect();
        assert_eq!(shas, vec![("c1", 0), ("c2", 1)]);
    }

    #[test]
    fn test_memory_source_patch_lookup() {
        let source = MemorySource::new().with_commit(Commit::new("c1", "a", "m"), "patch");
        let commit = Commit::new("c1", "a", "m");
        assert_eq!(source.raw_patch(&commit).expect("patch"), "patch");

        let missing = Commit::new("zz", "a", "m");
        assert!(matches!(
            source.raw_patch(&missing),
            Err(ReplayError::Source { .. })
        ));
    }

    #[test]
    fn test_pair_diff_unsupported_by_default() {
        let source = MemorySource::new();
        assert!(matches!(
            source.raw_patch_between("a", "b"),
            Err(ReplayError::Source { .. })
        ));
    }
}

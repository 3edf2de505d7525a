// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for retrace-git

use retrace_core::ReplayError;
use thiserror::Error;

/// Errors that can occur during git operations
#[derive(Debug, Error)]
pub enum GitError {
    /// Error from git2 library
    #[error("Git error: {0}")]
    Git2(#[from] git2::Error),

    /// Repository not found at the specified path
    #[error("Repository not found: {path}")]
    RepositoryNotFound {
        /// The path that was searched for a repository
        path: String,
    },

    /// Invalid commit reference (branch, tag, or SHA)
    #[error("Invalid commit reference: {reference}")]
    InvalidReference {
        /// The reference string that could not be resolved
        reference: String,
    },

    /// Replay of a commit read from the repository failed
    #[error(transparent)]
    Replay(#[from] ReplayError),
}

impl From<GitError> for ReplayError {
    fn from(err: GitError) -> Self {
        match err {
            GitError::Replay(inner) => inner,
            other => ReplayError::Source {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_errors_become_source_errors() {
        let err = ReplayError::from(GitError::InvalidReference {
            reference: "nope".to_string(),
        });
        match err {
            ReplayError::Source { message } => {
                assert_eq!(message, "Invalid commit reference: nope");
            }
            other => panic!("Expected Source error, got {other:?}"),
        }
    }

    #[test]
    fn test_replay_errors_pass_through() {
        let err = ReplayError::from(GitError::Replay(ReplayError::UnknownPath {
            path: "a.txt".to_string(),
        }));
        assert!(matches!(err, ReplayError::UnknownPath { .. }));
    }
}

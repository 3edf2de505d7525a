//! Commit metadata and replay ordering

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A commit as seen by the replay engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// The commit SHA (40 hex characters for git)
    pub sha: String,
    /// Author name
    pub author: String,
    /// Author email
    #[serde(default)]
    pub author_email: String,
    /// Commit message
    pub message: String,
    /// Commit timestamp
    pub timestamp: DateTime<Utc>,
    /// Parent commit SHAs
    #[serde(default)]
    pub parents: Vec<String>,
    /// Position in replay order, 0 for the oldest commit
    #[serde(default)]
    pub ordinal: usize,
}

impl Commit {
    /// Create a commit with no parents, no email and an epoch timestamp
    #[must_use]
    pub fn new(
        sha: impl Into<String>,
        author: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            sha: sha.into(),
            author: author.into(),
            author_email: String::new(),
            message: message.into(),
            timestamp: DateTime::UNIX_EPOCH,
            parents: Vec::new(),
            ordinal: 0,
        }
    }

    /// Set the author email
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.author_email = email.into();
        self
    }

    /// Set the commit timestamp
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set the parent SHAs
    #[must_use]
    pub fn with_parents(mut self, parents: Vec<String>) -> Self {
        self.parents = parents;
        self
    }

    /// Validate that a SHA is a valid 40-character hex string
    #[must_use]
    pub fn is_valid_sha(sha: &str) -> bool {
        sha.len() == 40 && sha.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Get the short SHA (first 7 characters)
    #[must_use]
    pub fn short_sha(&self) -> &str {
        self.sha
            .char_indices()
            .nth(7)
            .map_or(&self.sha[..], |(idx, _)| &self.sha[..idx])
    }

    /// Check if this is a merge commit (has multiple parents)
    #[must_use]
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    /// Check if this is a root commit (has no parents)
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Get the first line of the commit message (subject)
    #[must_use]
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// The entry appended to the commit log once this commit is replayed
    #[must_use]
    pub fn log_entry(&self) -> String {
        format!("<{}>: {}", self.author, self.subject())
    }
}

/// Commits in replay order, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    commits: Vec<Commit>,
}

impl History {
    /// Build a history from commits listed newest first, as a revwalk yields them
    ///
    /// The list is reversed and each commit's `ordinal` is set to its replay
    /// position.
    #[must_use]
    pub fn from_newest_first(mut commits: Vec<Commit>) -> Self {
        commits.reverse();
        Self::from_oldest_first(commits)
    }

    /// Build a history from commits already in replay order
    #[must_use]
    pub fn from_oldest_first(mut commits: Vec<Commit>) -> Self {
        for (ordinal, commit) in commits.iter_mut().enumerate() {
            commit.ordinal = ordinal;
        }
        Self { commits }
    }

    /// Number of commits
    #[must_use]
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    /// Whether there is nothing to replay
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// Iterate commits oldest first
    pub fn iter(&self) -> std::slice::Iter<'_, Commit> {
        self.commits.iter()
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a Commit;
    type IntoIter = std::slice::Iter<'a, Commit>;

    fn into_iter(self) -> Self::IntoIter {
        self.commits.iter()
    }
}

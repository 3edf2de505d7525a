// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Reading history and patch text from a git repository
//!
//! Commits are walked with `git2` and each patch is printed from a tree diff
//! in the same unified format `git show` produces, so the replay engine sees
//! exactly what a user of the command line tool would.
//!
//! A full walk visits the commits of every merged branch, so merges
//! themselves carry no patch. With [`WalkOptions::first_parent`] the side
//! branches are skipped and each merge is diffed against its first parent.

use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use git2::{
    DiffFindOptions, DiffFormat, DiffOptions, ObjectType, Repository, Sort, TreeWalkMode,
    TreeWalkResult,
};
use retrace_core::{Commit, CommitSource, History, ReplayError};
use tracing::{debug, trace};

use crate::error::GitError;

/// Configuration for walking commits
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Maximum number of commits to retrieve
    pub limit: Option<usize>,
    /// Start from this commit (defaults to HEAD)
    pub from_ref: Option<String>,
    /// Only include commits after this date
    pub since: Option<DateTime<Utc>>,
    /// Only include commits before this date
    pub until: Option<DateTime<Utc>>,
    /// Follow only the first parent of merge commits
    pub first_parent: bool,
}

impl WalkOptions {
    /// Create options for walking the N most recent commits
    #[must_use]
    pub fn latest(n: usize) -> Self {
        Self {
            limit: Some(n),
            ..Default::default()
        }
    }

    /// Set the starting reference
    #[must_use]
    pub fn from(mut self, reference: &str) -> Self {
        self.from_ref = Some(reference.to_string());
        self
    }

    /// Filter commits since a date
    #[must_use]
    pub fn since(mut self, date: DateTime<Utc>) -> Self {
        self.since = Some(date);
        self
    }

    /// Filter commits until a date
    #[must_use]
    pub fn until(mut self, date: DateTime<Utc>) -> Self {
        self.until = Some(date);
        self
    }

    /// Skip commits reachable only through a merge's second parent
    #[must_use]
    pub fn first_parent(mut self) -> Self {
        self.first_parent = true;
        self
    }
}

/// A git repository used as a commit source
pub struct GitRepo {
    repo: Repository,
    walk: WalkOptions,
}

impl GitRepo {
    /// Open a git repository at the given path
    ///
    /// # Errors
    ///
    /// Returns `GitError::RepositoryNotFound` if the path is not a git repository.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GitError> {
        let path = path.as_ref();
        let repo = Repository::open(path).map_err(|_| GitError::RepositoryNotFound {
            path: path.display().to_string(),
        })?;
        Ok(Self::from_repository(repo))
    }

    /// Discover and open a git repository containing the given path
    ///
    /// This walks up the directory tree to find a `.git` directory.
    ///
    /// # Errors
    ///
    /// Returns `GitError::RepositoryNotFound` if no repository is found.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self, GitError> {
        let path = path.as_ref();
        let repo = Repository::discover(path).map_err(|_| GitError::RepositoryNotFound {
            path: path.display().to_string(),
        })?;
        Ok(Self::from_repository(repo))
    }

    /// Wrap an already opened repository
    #[must_use]
    pub fn from_repository(repo: Repository) -> Self {
        Self {
            repo,
            walk: WalkOptions::default(),
        }
    }

    /// Use `options` whenever this repository is asked for its history
    #[must_use]
    pub fn with_walk_options(mut self, options: WalkOptions) -> Self {
        self.walk = options;
        self
    }

    /// Check if the repository is bare
    #[must_use]
    pub fn is_bare(&self) -> bool {
        self.repo.is_bare()
    }

    /// Get the working directory path (None for bare repos)
    #[must_use]
    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    /// Walk commits according to the given options, newest first
    ///
    /// # Errors
    ///
    /// Returns `GitError` if the repository cannot be walked.
    pub fn walk_commits(&self, options: &WalkOptions) -> Result<Vec<Commit>, GitError> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME | Sort::TOPOLOGICAL)?;
        if options.first_parent {
            revwalk.simplify_first_parent()?;
        }

        // Start from specified ref or HEAD
        if let Some(ref from_ref) = options.from_ref {
            let oid = self.resolve(from_ref)?.id();
            revwalk.push(oid)?;
        } else {
            revwalk.push_head()?;
        }

        let mut commits = Vec::new();
        let limit = options.limit.unwrap_or(usize::MAX);

        for oid_result in revwalk {
            if commits.len() >= limit {
                break;
            }

            let git_commit = self.repo.find_commit(oid_result?)?;
            let commit = extract_commit(&git_commit);

            if options.since.is_some_and(|since| commit.timestamp < since)
                || options.until.is_some_and(|until| commit.timestamp > until)
            {
                continue;
            }
            commits.push(commit);
        }

        debug!(commits = commits.len(), "Walked commits");
        Ok(commits)
    }

    /// History to replay, oldest first
    ///
    /// # Errors
    ///
    /// Returns `GitError` if the repository cannot be walked.
    pub fn history_with(&self, options: &WalkOptions) -> Result<History, GitError> {
        Ok(History::from_newest_first(self.walk_commits(options)?))
    }

    /// Get a single commit by SHA or reference
    ///
    /// # Errors
    ///
    /// Returns `GitError::InvalidReference` if the reference cannot be resolved.
    pub fn get_commit(&self, reference: &str) -> Result<Commit, GitError> {
        Ok(extract_commit(&self.resolve(reference)?))
    }

    /// Get the HEAD commit SHA
    ///
    /// # Errors
    ///
    /// Returns `GitError` if HEAD cannot be resolved.
    pub fn head_sha(&self) -> Result<String, GitError> {
        let head = self.repo.head()?;
        let oid = head.target().ok_or_else(|| GitError::InvalidReference {
            reference: "HEAD".to_string(),
        })?;
        Ok(oid.to_string())
    }

    /// Unified diff a commit introduces relative to its first parent
    ///
    /// Root commits are diffed against the empty tree.
    ///
    /// # Errors
    ///
    /// Returns `GitError` if the commit cannot be found or diffed.
    pub fn commit_patch(&self, reference: &str) -> Result<String, GitError> {
        let commit = self.resolve(reference)?;
        let parent = if commit.parent_count() > 0 {
            Some(commit.parent(0)?)
        } else {
            None
        };
        self.diff_commits(parent.as_ref(), &commit)
    }

    /// Unified diff between two commits
    ///
    /// # Errors
    ///
    /// Returns `GitError::InvalidReference` if either reference cannot be
    /// resolved.
    pub fn patch_between(&self, from: &str, to: &str) -> Result<String, GitError> {
        let old = self.resolve(from)?;
        let new = self.resolve(to)?;
        self.diff_commits(Some(&old), &new)
    }

    /// Text files in the tree of `reference` as `(path, content)` pairs
    ///
    /// Binary blobs are skipped. Paths are repository-relative with `/`
    /// separators.
    ///
    /// # Errors
    ///
    /// Returns `GitError` if the reference cannot be resolved or a blob
    /// cannot be read.
    pub fn snapshot(&self, reference: &str) -> Result<Vec<(String, String)>, GitError> {
        let tree = self.resolve(reference)?.tree()?;
        let mut files = Vec::new();
        let mut failure = None;

        let walked = tree.walk(TreeWalkMode::PreOrder, |dir, entry| {
            if entry.kind() != Some(ObjectType::Blob) {
                return TreeWalkResult::Ok;
            }
            let Some(name) = entry.name() else {
                return TreeWalkResult::Ok;
            };
            match entry
                .to_object(&self.repo)
                .and_then(|object| object.peel_to_blob())
            {
                Ok(blob) if blob.is_binary() => {
                    trace!(path = %format!("{dir}{name}"), "Skipping binary blob");
                }
                Ok(blob) => files.push((
                    format!("{dir}{name}"),
                    String::from_utf8_lossy(blob.content()).into_owned(),
                )),
                Err(e) => {
                    failure = Some(e);
                    return TreeWalkResult::Abort;
                }
            }
            TreeWalkResult::Ok
        });
        if let Some(e) = failure {
            return Err(e.into());
        }
        walked?;

        debug!(reference, files = files.len(), "Read tree snapshot");
        Ok(files)
    }

    fn resolve(&self, reference: &str) -> Result<git2::Commit<'_>, GitError> {
        let invalid = || GitError::InvalidReference {
            reference: reference.to_string(),
        };
        self.repo
            .revparse_single(reference)
            .map_err(|_| invalid())?
            .peel_to_commit()
            .map_err(|_| invalid())
    }

    fn diff_commits(
        &self,
        old: Option<&git2::Commit<'_>>,
        new: &git2::Commit<'_>,
    ) -> Result<String, GitError> {
        let new_tree = new.tree()?;
        let old_tree = old.map(git2::Commit::tree).transpose()?;

        let mut opts = DiffOptions::new();
        opts.ignore_whitespace(false);
        let mut diff =
            self.repo
                .diff_tree_to_tree(old_tree.as_ref(), Some(&new_tree), Some(&mut opts))?;

        let mut find = DiffFindOptions::new();
        find.renames(true);
        diff.find_similar(Some(&mut find))?;

        let mut patch = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            // Body lines carry their marker in `origin`; headers already
            // contain their full text.
            if matches!(line.origin(), '+' | '-' | ' ') {
                patch.push(line.origin());
            }
            patch.push_str(&String::from_utf8_lossy(line.content()));
            true
        })?;

        trace!(
            sha = %new.id(),
            files = diff.deltas().len(),
            bytes = patch.len(),
            "Printed patch"
        );
        Ok(patch)
    }
}

impl CommitSource for GitRepo {
    fn history(&self) -> Result<History, ReplayError> {
        Ok(self.history_with(&self.walk)?)
    }

    /// Merge commits yield an empty patch unless the walk follows first
    /// parents, as both sides of the merge are already in the history.
    fn raw_patch(&self, commit: &Commit) -> Result<String, ReplayError> {
        if commit.is_merge() && !self.walk.first_parent {
            debug!(sha = commit.short_sha(), "Merge commit replays without a patch");
            return Ok(String::new());
        }
        Ok(self.commit_patch(&commit.sha)?)
    }

    fn raw_patch_between(&self, from: &str, to: &str) -> Result<String, ReplayError> {
        Ok(self.patch_between(from, to)?)
    }
}

/// Extract commit metadata from a git2 commit
fn extract_commit(git_commit: &git2::Commit<'_>) -> Commit {
    let time = git_commit.time();
    let timestamp = Utc
        .timestamp_opt(time.seconds(), 0)
        .single()
        .unwrap_or_else(Utc::now);
    let author = git_commit.author();

    Commit::new(
        git_commit.id().to_string(),
        author.name().unwrap_or("Unknown"),
        git_commit.message().unwrap_or(""),
    )
    .with_email(author.email().unwrap_or(""))
    .with_timestamp(timestamp)
    .with_parents(git_commit.parent_ids().map(|id| id.to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn test_open_nonexistent_repository() {
        let result = GitRepo::open("/nonexistent/path");
        match result {
            Err(GitError::RepositoryNotFound { path }) => {
                assert!(path.contains("nonexistent"));
            }
            _ => panic!("Expected RepositoryNotFound error"),
        }
    }

    #[test]
    fn test_walk_options_builder() {
        let options = WalkOptions::latest(10).from("main").first_parent();

        assert_eq!(options.limit, Some(10));
        assert_eq!(options.from_ref, Some("main".to_string()));
        assert!(options.first_parent);
        assert!(options.since.is_none());
    }
}

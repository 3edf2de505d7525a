// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Replay driver
//!
//! A [`ReplaySession`] walks commits oldest first, turns each commit's patch
//! into buffer operations, applies them to its [`VirtualFileStore`] and hands
//! every operation to a [`ReplaySink`].
//!
//! Operations are produced strictly in order: commits in history order, files
//! in patch order, edits in compacted order. Before a range of lines is
//! deleted the store content is compared with the lines the patch says it is
//! removing; a mismatch means the replay no longer tracks the real history
//! and stops with [`ReplayError::Desync`].
//!
//! # Example
//!
//! ```
//! use retrace_core::{Commit, IgnoreRules, MemorySource, ReplayOp, ReplayOptions, ReplaySession};
//!
//! let patch = "--- /dev/null\n+++ b/a.txt\n@@ -0,0 +1,2 @@\n+foo\n+bar\n";
//! let source = MemorySource::new().with_commit(Commit::new("c1", "Ada", "Add a"), patch);
//!
//! let mut session = ReplaySession::new(IgnoreRules::empty(), ReplayOptions::default());
//! let mut ops: Vec<ReplayOp> = Vec::new();
//! session.replay_source(&source, &mut ops).expect("replay");
//!
//! assert_eq!(session.store().read("a.txt").as_deref(), Some("foo\nbar"));
//! ```

use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::commit::{Commit, History};
use crate::compact::{CompactedEdit, compact};
use crate::drift::{DriftTracker, ResolvedEdit};
use crate::error::ReplayError;
use crate::ignore::{IgnoreRules, Suppression};
use crate::op::{ReplayOp, ReplaySink};
use crate::patch::{FileChange, parse_patch};
use crate::source::CommitSource;
use crate::store::VirtualFileStore;

/// Default number of characters typed per insert operation
pub const DEFAULT_CHUNK_SIZE: usize = 8;

/// Knobs for a replay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayOptions {
    /// Characters per insert operation after the leading whitespace
    pub chunk_size: usize,
    /// Compare buffer content with the patch before every deletion
    pub verify_deletions: bool,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            verify_deletions: true,
        }
    }
}

impl ReplayOptions {
    /// Set the insert chunk size (at least 1)
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Skip content verification before deletions
    #[must_use]
    pub fn without_verification(mut self) -> Self {
        self.verify_deletions = false;
        self
    }
}

/// Counters describing a replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaySummary {
    /// Commits fully replayed
    pub commits: usize,
    /// File changes replayed
    pub files: usize,
    /// File changes skipped by ignore rules
    pub suppressed: usize,
    /// Operations delivered to the sink
    pub operations: usize,
    /// The sink stopped the replay early
    pub cancelled: bool,
}

/// Running log with one entry per replayed commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitLog {
    entries: Vec<String>,
    saved: bool,
}

impl CommitLog {
    /// Add an entry; the log is unsaved until [`mark_saved`](Self::mark_saved)
    pub fn append(&mut self, entry: String) {
        self.entries.push(entry);
        self.saved = false;
    }

    /// Mark the log as saved
    pub fn mark_saved(&mut self) {
        self.saved = true;
    }

    /// Check if every entry has been saved
    #[must_use]
    pub fn is_saved(&self) -> bool {
        self.saved
    }

    /// Entries in replay order
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// The log as text, entries separated by a blank line
    #[must_use]
    pub fn render(&self) -> String {
        self.entries.join("\n\n")
    }
}

/// State of one replay, from the first commit to the last
pub struct ReplaySession {
    store: VirtualFileStore,
    ignore: IgnoreRules,
    suppression: Suppression,
    log: CommitLog,
    options: ReplayOptions,
    summary: ReplaySummary,
}

impl ReplaySession {
    /// Start a replay with an empty tree
    #[must_use]
    pub fn new(ignore: IgnoreRules, options: ReplayOptions) -> Self {
        Self {
            store: VirtualFileStore::new(),
            ignore,
            suppression: Suppression::new(),
            log: CommitLog::default(),
            options,
            summary: ReplaySummary::default(),
        }
    }

    /// The replayed tree
    #[must_use]
    pub fn store(&self) -> &VirtualFileStore {
        &self.store
    }

    /// Mutable access to the replayed tree, e.g. to seed a starting state
    pub fn store_mut(&mut self) -> &mut VirtualFileStore {
        &mut self.store
    }

    /// Consume the session, keeping the replayed tree
    #[must_use]
    pub fn into_store(self) -> VirtualFileStore {
        self.store
    }

    /// The commit log
    #[must_use]
    pub fn log(&self) -> &CommitLog {
        &self.log
    }

    /// Counters so far
    #[must_use]
    pub fn summary(&self) -> ReplaySummary {
        self.summary
    }

    /// Replay the whole history of a source
    ///
    /// # Errors
    ///
    /// Returns the first fatal error; the store keeps every operation applied
    /// before it.
    pub fn replay_source<S, K>(&mut self, source: &S, sink: K) -> Result<ReplaySummary, ReplayError>
    where
        S: CommitSource + ?Sized,
        K: ReplaySink,
    {
        let history = source.history()?;
        self.replay(&history, source, sink)
    }

    /// Replay `history`, fetching each commit's patch from `source`
    ///
    /// # Errors
    ///
    /// Returns the first fatal error; the store keeps every operation applied
    /// before it.
    pub fn replay<S, K>(
        &mut self,
        history: &History,
        source: &S,
        mut sink: K,
    ) -> Result<ReplaySummary, ReplayError>
    where
        S: CommitSource + ?Sized,
        K: ReplaySink,
    {
        info!(commits = history.len(), "Starting replay");

        for commit in history {
            let patch = source.raw_patch(commit)?;
            if self.replay_commit(commit, &patch, &mut sink)?.is_break() {
                info!(sha = commit.short_sha(), "Replay cancelled");
                self.summary.cancelled = true;
                break;
            }
        }

        info!(
            commits = self.summary.commits,
            files = self.summary.files,
            suppressed = self.summary.suppressed,
            operations = self.summary.operations,
            "Replay complete"
        );
        Ok(self.summary)
    }

    /// Replay a single commit given its patch text
    ///
    /// Returns `ControlFlow::Break` if the sink cancelled the replay.
    ///
    /// # Errors
    ///
    /// Returns `MalformedPatch` before any operation is emitted if the patch
    /// does not parse, `Desync` if a deletion does not match the buffer, and
    /// `PathConflict` if a rename would overwrite a tracked file.
    pub fn replay_commit<K: ReplaySink>(
        &mut self,
        commit: &Commit,
        patch_text: &str,
        sink: &mut K,
    ) -> Result<ControlFlow<()>, ReplayError> {
        info!(
            sha = commit.short_sha(),
            ordinal = commit.ordinal,
            subject = commit.subject(),
            "Replaying commit"
        );
        let patch = parse_patch(patch_text)?;
        self.suppression.reset();

        let begin = ReplayOp::BeginCommit {
            sha: commit.sha.clone(),
            ordinal: commit.ordinal,
        };
        if self.emit(sink, begin).is_break() {
            return Ok(ControlFlow::Break(()));
        }

        for change in patch {
            if self.replay_file(change, sink)?.is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }

        let entry = commit.log_entry();
        self.log.append(entry.clone());
        let flow = self.emit(sink, ReplayOp::AppendLog { text: entry });
        self.log.mark_saved();
        if flow.is_break() {
            return Ok(ControlFlow::Break(()));
        }

        self.summary.commits += 1;
        Ok(self.emit(
            sink,
            ReplayOp::EndCommit {
                sha: commit.sha.clone(),
            },
        ))
    }

    fn replay_file<K: ReplaySink>(
        &mut self,
        change: FileChange,
        sink: &mut K,
    ) -> Result<ControlFlow<()>, ReplayError> {
        if self.suppression.check(&self.ignore, &change) {
            debug!(path = change.path(), "Skipping ignored file");
            self.summary.suppressed += 1;
            return Ok(ControlFlow::Continue(()));
        }
        self.summary.files += 1;

        let mut path = change.path().to_string();
        if path.is_empty() {
            warn!("Skipping file section without a name");
            return Ok(ControlFlow::Continue(()));
        }
        debug!(
            path = %path,
            edits = change.edits.len(),
            deleted = change.deleted,
            renamed = change.is_rename(),
            "Replaying file"
        );

        if self.store.ensure(&path)
            && self
                .emit(sink, ReplayOp::CreateFile { path: path.clone() })
                .is_break()
        {
            return Ok(ControlFlow::Break(()));
        }

        if change.deleted {
            self.store.close(&path);
            if self.store.delete(&path) {
                return Ok(self.emit(sink, ReplayOp::DeleteFile { path }));
            }
            return Ok(ControlFlow::Continue(()));
        }

        if change.is_rename() {
            let to = change.new_path().to_string();
            self.store.rename(&path, &to)?;
            let rename = ReplayOp::RenamePath {
                from: std::mem::replace(&mut path, to.clone()),
                to,
            };
            if self.emit(sink, rename).is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }

        let mut drift = DriftTracker::new();
        for edit in compact(change.edits) {
            let requested = match &edit {
                CompactedEdit::Deleted(range) => drift.removal_line(range.from),
                CompactedEdit::Added(line) => line.line_number as i64 - 1,
            };
            let resolved = drift
                .resolve(edit)
                .ok_or_else(|| ReplayError::LineOutOfRange {
                    path: path.clone(),
                    line: requested,
                    len: self.store.lines(&path).map_or(0, <[String]>::len),
                })?;

            let flow = match resolved {
                ResolvedEdit::Delete { from, to, expected } => {
                    self.delete_range(&path, from, to, &expected, sink)?
                }
                ResolvedEdit::Insert { line, text } => self.type_line(&path, line, &text, sink)?,
            };
            if flow.is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }

        trace!(
            path = %path,
            added = drift.lines_added(),
            deleted = drift.lines_deleted(),
            "File replayed"
        );
        self.store.close(&path);
        Ok(ControlFlow::Continue(()))
    }

    /// Verify and remove buffer lines `from..=to`
    fn delete_range<K: ReplaySink>(
        &mut self,
        path: &str,
        from: usize,
        to: usize,
        expected: &str,
        sink: &mut K,
    ) -> Result<ControlFlow<()>, ReplayError> {
        if self.options.verify_deletions {
            let actual = self.store.text_range(path, from, to);
            if strip_whitespace(&actual) != strip_whitespace(expected) {
                return Err(ReplayError::Desync {
                    path: path.to_string(),
                    from_line: from,
                    to_line: to,
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        self.store.delete_lines(path, from, to)?;
        Ok(self.emit(
            sink,
            ReplayOp::DeleteRange {
                path: path.to_string(),
                from_line: from,
                to_line: to,
            },
        ))
    }

    /// Insert a new line as its leading whitespace followed by text chunks
    fn type_line<K: ReplaySink>(
        &mut self,
        path: &str,
        line: usize,
        text: &str,
        sink: &mut K,
    ) -> Result<ControlFlow<()>, ReplayError> {
        let mut column = 0;
        for (idx, piece) in typing_pieces(text, self.options.chunk_size)
            .into_iter()
            .enumerate()
        {
            if idx == 0 {
                self.store.insert_line(path, line, piece)?;
            } else {
                self.store.insert_text(path, line, column, piece)?;
            }

            let op = ReplayOp::Insert {
                path: path.to_string(),
                line,
                column,
                text: piece.to_string(),
            };
            if self.emit(sink, op).is_break() {
                return Ok(ControlFlow::Break(()));
            }
            column += piece.chars().count();
        }
        Ok(ControlFlow::Continue(()))
    }

    fn emit<K: ReplaySink>(&mut self, sink: &mut K, op: ReplayOp) -> ControlFlow<()> {
        trace!(%op, "Emitting operation");
        self.summary.operations += 1;
        sink.apply(&op)
    }
}

/// Split a line into what gets typed: leading whitespace, then chunks of at
/// most `chunk_size` characters. Always yields at least one piece.
fn typing_pieces(text: &str, chunk_size: usize) -> Vec<&str> {
    let chunk_size = chunk_size.max(1);
    let (indent, rest) = text.split_at(text.len() - text.trim_start().len());

    let mut pieces = Vec::new();
    if !indent.is_empty() {
        pieces.push(indent);
    }

    let mut start = 0;
    for (count, (idx, _)) in rest.char_indices().enumerate() {
        if count > 0 && count % chunk_size == 0 {
            pieces.push(&rest[start..idx]);
            start = idx;
        }
    }
    if start < rest.len() {
        pieces.push(&rest[start..]);
    }

    if pieces.is_empty() {
        pieces.push("");
    }
    pieces
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn test_typing_pieces() {
        assert_eq!(typing_pieces("foo", 8), vec!["foo"]);
        assert_eq!(typing_pieces("    let x = 1;", 4), vec!["    ", "let ", "x = ", "1;"]);
        assert_eq!(typing_pieces("", 8), vec![""]);
        assert_eq!(typing_pieces("\t\t", 8), vec!["\t\t"]);
        assert_eq!(typing_pieces("héllo", 2), vec!["hé", "ll", "o"]);
        assert_eq!(typing_pieces("abc", 0), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_strip_whitespace() {
        assert_eq!(strip_whitespace(" a \n\tb "), "ab");
    }

    #[test]
    fn test_options_builder() {
        let options = ReplayOptions::default().with_chunk_size(0).without_verification();
        assert_eq!(options.chunk_size, 1);
        assert!(!options.verify_deletions);
        assert_eq!(ReplayOptions::default().chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_commit_log() {
        let mut log = CommitLog::default();
        log.append("<a>: one".to_string());
        assert!(!log.is_saved());
        log.mark_saved();
        log.append("<b>: two".to_string());
        log.mark_saved();
        assert!(log.is_saved());
        assert_eq!(log.entries().len(), 2);
        assert_eq!(log.render(), "<a>: one\n\n<b>: two");
    }

    #[test]
    fn test_malformed_patch_emits_nothing() {
        let mut session = ReplaySession::new(IgnoreRules::empty(), ReplayOptions::default());
        let mut ops: Vec<ReplayOp> = Vec::new();
        let err = session
            .replay_commit(&Commit::new("c1", "a", "m"), "@@ -1 +1 @@\n", &mut ops)
            .unwrap_err();
        assert!(matches!(err, ReplayError::MalformedPatch { .. }));
        assert!(ops.is_empty());
        assert!(session.log().entries().is_empty());
    }

    #[test]
    fn test_empty_patch_still_logs() {
        let mut session = ReplaySession::new(IgnoreRules::empty(), ReplayOptions::default());
        let mut ops: Vec<ReplayOp> = Vec::new();
        let commit = Commit::new("c1", "Ada", "Empty commit");
        let flow = session.replay_commit(&commit, "", &mut ops).expect("replay");
        assert!(flow.is_continue());
        assert_eq!(
            ops,
            vec![
                ReplayOp::BeginCommit {
                    sha: "c1".to_string(),
                    ordinal: 0,
                },
                ReplayOp::AppendLog {
                    text: "<Ada>: Empty commit".to_string(),
                },
                ReplayOp::EndCommit {
                    sha: "c1".to_string(),
                },
            ]
        );
        assert!(session.log().is_saved());
        assert_eq!(session.summary().operations, 3);
    }
}

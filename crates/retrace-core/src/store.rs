// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! In-memory model of the replayed tree
//!
//! The store is the only place buffer content lives. A path exists exactly
//! when it has an entry; content is kept as lines without terminators, so
//! `read` joins them with `\n` and never reports a trailing newline. Content
//! written with `\r\n` terminators is normalised to `\n`.

use std::collections::BTreeMap;

use tracing::trace;

use crate::error::ReplayError;
use crate::op::ReplayOp;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct FileEntry {
    lines: Vec<String>,
    open: bool,
}

/// Path to buffer mapping for a replay
#[derive(Debug, Clone, Default)]
pub struct VirtualFileStore {
    files: BTreeMap<String, FileEntry>,
}

impl VirtualFileStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `path` as an empty open file unless it is already tracked
    ///
    /// Returns `true` if the entry was created.
    pub fn ensure(&mut self, path: &str) -> bool {
        if let Some(entry) = self.files.get_mut(path) {
            entry.open = true;
            return false;
        }
        trace!(path, "Creating buffer");
        self.files.insert(
            path.to_string(),
            FileEntry {
                lines: Vec::new(),
                open: true,
            },
        );
        true
    }

    /// Replace the content of `path`, tracking it if needed
    pub fn write(&mut self, path: &str, content: &str) {
        self.ensure(path);
        if let Some(entry) = self.files.get_mut(path) {
            entry.lines = content.lines().map(str::to_string).collect();
        }
    }

    /// Move the entry at `from` to `to`, keeping its content
    ///
    /// An untracked `from` produces an empty file at `to`.
    ///
    /// # Errors
    ///
    /// Returns `ReplayError::PathConflict` if `to` is already tracked.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<(), ReplayError> {
        if from == to {
            return Ok(());
        }
        if self.files.contains_key(to) {
            return Err(ReplayError::PathConflict {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        let mut entry = self.files.remove(from).unwrap_or_default();
        entry.open = true;
        self.files.insert(to.to_string(), entry);
        Ok(())
    }

    /// Stop tracking `path`; returns `false` if it was not tracked
    pub fn delete(&mut self, path: &str) -> bool {
        self.files.remove(path).is_some()
    }

    /// Open a new line at index `line` holding `text`
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not tracked or `line` is past the end.
    pub fn insert_line(&mut self, path: &str, line: usize, text: &str) -> Result<(), ReplayError> {
        let entry = self.entry_mut(path)?;
        if line > entry.lines.len() {
            return Err(out_of_range(path, line, entry.lines.len()));
        }
        entry.lines.insert(line, text.to_string());
        Ok(())
    }

    /// Insert `text` into line `line` at character `column`
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not tracked, or the line or column does
    /// not exist.
    pub fn insert_text(
        &mut self,
        path: &str,
        line: usize,
        column: usize,
        text: &str,
    ) -> Result<(), ReplayError> {
        let entry = self.entry_mut(path)?;
        let len = entry.lines.len();
        let Some(target) = entry.lines.get_mut(line) else {
            return Err(out_of_range(path, line, len));
        };

        let byte_idx = if column == 0 {
            0
        } else {
            target
                .char_indices()
                .map(|(idx, _)| idx)
                .chain(std::iter::once(target.len()))
                .nth(column)
                .ok_or_else(|| out_of_range(path, line, len))?
        };
        target.insert_str(byte_idx, text);
        Ok(())
    }

    /// Remove lines `from..=to`
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not tracked or the range is not inside
    /// the buffer.
    pub fn delete_lines(&mut self, path: &str, from: usize, to: usize) -> Result<(), ReplayError> {
        let entry = self.entry_mut(path)?;
        let len = entry.lines.len();
        if to >= len {
            return Err(out_of_range(path, to, len));
        }
        if from > to {
            return Err(out_of_range(path, from, len));
        }
        entry.lines.drain(from..=to);
        Ok(())
    }

    /// Lines `from..=to` joined by `\n`, truncated to what the buffer holds
    #[must_use]
    pub fn text_range(&self, path: &str, from: usize, to: usize) -> String {
        self.lines(path)
            .and_then(|lines| lines.get(from..=to.min(lines.len().saturating_sub(1))))
            .map(|lines| lines.join("\n"))
            .unwrap_or_default()
    }

    /// Full content of `path`
    #[must_use]
    pub fn read(&self, path: &str) -> Option<String> {
        self.lines(path).map(|lines| lines.join("\n"))
    }

    /// Lines of `path`
    #[must_use]
    pub fn lines(&self, path: &str) -> Option<&[String]> {
        self.files.get(path).map(|entry| entry.lines.as_slice())
    }

    /// Mark `path` as saved and closed
    pub fn close(&mut self, path: &str) {
        if let Some(entry) = self.files.get_mut(path) {
            entry.open = false;
        }
    }

    /// Check if `path` is tracked and open
    #[must_use]
    pub fn is_open(&self, path: &str) -> bool {
        self.files.get(path).is_some_and(|entry| entry.open)
    }

    /// Check if `path` is tracked
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Tracked paths in sorted order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Number of tracked files
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if no file is tracked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Apply an operation from a replay stream
    ///
    /// Lets a consumer rebuild the tree from the operations alone.
    ///
    /// # Errors
    ///
    /// Returns the same errors as the operation's store method.
    pub fn apply(&mut self, op: &ReplayOp) -> Result<(), ReplayError> {
        match op {
            ReplayOp::CreateFile { path } => {
                self.ensure(path);
            }
            ReplayOp::DeleteFile { path } => {
                self.delete(path);
            }
            ReplayOp::RenamePath { from, to } => self.rename(from, to)?,
            ReplayOp::Insert {
                path,
                line,
                column: 0,
                text,
            } => self.insert_line(path, *line, text)?,
            ReplayOp::Insert {
                path,
                line,
                column,
                text,
            } => self.insert_text(path, *line, *column, text)?,
            ReplayOp::DeleteRange {
                path,
                from_line,
                to_line,
            } => self.delete_lines(path, *from_line, *to_line)?,
            ReplayOp::BeginCommit { .. } | ReplayOp::AppendLog { .. } | ReplayOp::EndCommit { .. } => {}
        }
        Ok(())
    }

    fn entry_mut(&mut self, path: &str) -> Result<&mut FileEntry, ReplayError> {
        self.files
            .get_mut(path)
            .ok_or_else(|| ReplayError::UnknownPath {
                path: path.to_string(),
            })
    }
}

fn out_of_range(path: &str, line: usize, len: usize) -> ReplayError {
    ReplayError::LineOutOfRange {
        path: path.to_string(),
        line: line as i64,
        len,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn store_with(path: &str, content: &str) -> VirtualFileStore {
        let mut store = VirtualFileStore::new();
        store.write(path, content);
        store
    }

    #[test]
    fn test_ensure_creates_once() {
        let mut store = VirtualFileStore::new();
        assert!(store.ensure("a.txt"));
        assert!(!store.ensure("a.txt"));
        assert_eq!(store.read("a.txt").as_deref(), Some(""));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_insert_lines_and_text() {
        let mut store = VirtualFileStore::new();
        store.ensure("a.txt");
        store.insert_line("a.txt", 0, "foo").expect("insert");
        store.insert_line("a.txt", 1, "    ").expect("insert");
        store.insert_text("a.txt", 1, 4, "bar").expect("insert");
        store.insert_text("a.txt", 0, 3, "!").expect("insert");
        assert_eq!(store.read("a.txt").as_deref(), Some("foo!\n    bar"));
    }

    #[test]
    fn test_insert_text_counts_characters() {
        let mut store = store_with("u.txt", "héllo");
        store.insert_text("u.txt", 0, 2, "-").expect("insert");
        assert_eq!(store.read("u.txt").as_deref(), Some("hé-llo"));
        store.insert_text("u.txt", 0, 6, "!").expect("insert at end");
        assert_eq!(store.read("u.txt").as_deref(), Some("hé-llo!"));
        assert!(store.insert_text("u.txt", 0, 8, "x").is_err());
    }

    #[test]
    fn test_insert_past_end_fails() {
        let mut store = store_with("a.txt", "one");
        let err = store.insert_line("a.txt", 2, "x").unwrap_err();
        assert!(matches!(err, ReplayError::LineOutOfRange { line: 2, len: 1, .. }));
    }

    #[test]
    fn test_edit_unknown_path_fails() {
        let mut store = VirtualFileStore::new();
        let err = store.insert_line("nope", 0, "x").unwrap_err();
        assert!(matches!(err, ReplayError::UnknownPath { .. }));
    }

    #[test]
    fn test_delete_lines() {
        let mut store = store_with("a.txt", "1\n2\n3\n4\n5");
        store.delete_lines("a.txt", 1, 3).expect("delete");
        assert_eq!(store.read("a.txt").as_deref(), Some("1\n5"));
        assert!(store.delete_lines("a.txt", 1, 2).is_err());
    }

    #[test]
    fn test_text_range_truncates() {
        let store = store_with("a.txt", "a\nb\nc");
        assert_eq!(store.text_range("a.txt", 1, 2), "b\nc");
        assert_eq!(store.text_range("a.txt", 2, 9), "c");
        assert_eq!(store.text_range("a.txt", 5, 9), "");
        assert_eq!(store.text_range("missing", 0, 0), "");
    }

    #[test]
    fn test_rename_keeps_content() {
        let mut store = store_with("old.txt", "content");
        store.rename("old.txt", "new.txt").expect("rename");
        assert!(!store.contains("old.txt"));
        assert_eq!(store.read("new.txt").as_deref(), Some("content"));
    }

    #[test]
    fn test_rename_onto_tracked_path_conflicts() {
        let mut store = store_with("a.txt", "a");
        store.write("b.txt", "b");
        let err = store.rename("a.txt", "b.txt").unwrap_err();
        assert!(matches!(err, ReplayError::PathConflict { .. }));
        assert_eq!(store.read("a.txt").as_deref(), Some("a"));
        assert_eq!(store.read("b.txt").as_deref(), Some("b"));
    }

    #[test]
    fn test_rename_to_itself_is_noop() {
        let mut store = store_with("a.txt", "a");
        store.rename("a.txt", "a.txt").expect("rename");
        assert_eq!(store.read("a.txt").as_deref(), Some("a"));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut store = store_with("a.txt", "a");
        assert!(store.delete("a.txt"));
        assert!(!store.delete("a.txt"));
        assert!(!store.delete("never-existed"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_open_and_close() {
        let mut store = VirtualFileStore::new();
        store.ensure("a.txt");
        assert!(store.is_open("a.txt"));
        store.close("a.txt");
        assert!(!store.is_open("a.txt"));
        assert!(store.contains("a.txt"));
        store.ensure("a.txt");
        assert!(store.is_open("a.txt"));
    }

    #[test]
    fn test_write_normalises_crlf() {
        let store = store_with("a.txt", "one\r\ntwo\r\n");
        assert_eq!(store.read("a.txt").as_deref(), Some("one\ntwo"));
    }

    #[test]
    fn test_apply_rebuilds_content() {
        let ops = vec![
            ReplayOp::CreateFile {
                path: "a.txt".to_string(),
            },
            ReplayOp::Insert {
                path: "a.txt".to_string(),
                line: 0,
                column: 0,
                text: "  ".to_string(),
            },
            ReplayOp::Insert {
                path: "a.txt".to_string(),
                line: 0,
                column: 2,
                text: "x".to_string(),
            },
            ReplayOp::Insert {
                path: "a.txt".to_string(),
                line: 1,
                column: 0,
                text: "y".to_string(),
            },
            ReplayOp::DeleteRange {
                path: "a.txt".to_string(),
                from_line: 1,
                to_line: 1,
            },
            ReplayOp::RenamePath {
                from: "a.txt".to_string(),
                to: "b.txt".to_string(),
            },
        ];
        let mut store = VirtualFileStore::new();
        for op in &ops {
            store.apply(op).expect("apply");
        }
        assert_eq!(store.paths().collect::<Vec<_>>(), vec!["b.txt"]);
        assert_eq!(store.read("b.txt").as_deref(), Some("  x"));
    }
}

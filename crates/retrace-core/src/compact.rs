// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Compaction of removed lines into ranges

use std::iter::Peekable;

use serde::{Deserialize, Serialize};

use crate::patch::{EditKind, LineEdit};

/// A run of contiguous removed lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedRange {
    /// First removed line (1-based, diff coordinates)
    pub from: usize,
    /// Last removed line (inclusive)
    pub to: usize,
    /// Removed lines joined by `\n`
    pub content: String,
}

impl DeletedRange {
    fn start(edit: LineEdit) -> Self {
        Self {
            from: edit.line_number,
            to: edit.line_number,
            content: edit.line,
        }
    }

    fn extend(&mut self, edit: LineEdit) {
        self.to = edit.line_number;
        self.content.push('\n');
        self.content.push_str(&edit.line);
    }

    /// Number of lines in the range
    #[must_use]
    pub fn len(&self) -> usize {
        self.to - self.from + 1
    }

    /// Always false; a range holds at least one line
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// One step of a compacted file change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompactedEdit {
    /// Contiguous removed lines, deleted as one operation
    Deleted(DeletedRange),
    /// A single added line
    Added(LineEdit),
}

/// Iterator merging contiguous removals, passing additions through
///
/// Single pass: to compact again, build a new one from the original edits.
pub struct Compactor<I: Iterator<Item = LineEdit>> {
    edits: Peekable<I>,
}

impl<I: Iterator<Item = LineEdit>> Compactor<I> {
    /// Wrap an edit sequence
    pub fn new(edits: I) -> Self {
        Self {
            edits: edits.peekable(),
        }
    }
}

impl<I: Iterator<Item = LineEdit>> Iterator for Compactor<I> {
    type Item = CompactedEdit;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.edits.next()?;
        if first.kind == EditKind::Added {
            return Some(CompactedEdit::Added(first));
        }

        let mut range = DeletedRange::start(first);
        while let Some(edit) = self.edits.next_if(|e| {
            e.kind == EditKind::Removed && Some(e.line_number) == range.to.checked_add(1)
        }) {
            range.extend(edit);
        }
        Some(CompactedEdit::Deleted(range))
    }
}

/// Compact a file's edits
pub fn compact<I>(edits: I) -> Compactor<I::IntoIter>
where
    I: IntoIterator<Item = LineEdit>,
{
    Compactor::new(edits.into_iter())
}

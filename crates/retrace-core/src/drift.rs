// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Drift correction from diff coordinates to buffer coordinates
//!
//! Patch line numbers are 1-based and refer to the file as it was before
//! (removals) or after (additions) the whole change. Replaying edits one at a
//! time means the buffer sits somewhere in between, so each removal has to be
//! shifted by the lines already added and removed above it. Additions need no
//! shift: everything above an added line is already in its final shape when
//! that line is reached.

use crate::compact::CompactedEdit;

/// A compacted edit expressed in 0-based buffer coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedEdit {
    /// Remove buffer lines `from..=to`, which must hold `expected`
    Delete {
        /// First buffer line
        from: usize,
        /// Last buffer line (inclusive)
        to: usize,
        /// Lines the patch says are being removed, joined by `\n`
        expected: String,
    },
    /// Open a new line at `line` holding `text`
    Insert {
        /// Buffer line the new line will occupy
        line: usize,
        /// Line text
        text: String,
    },
}

/// Running line counters for one file change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriftTracker {
    lines_added: usize,
    lines_deleted: usize,
}

impl DriftTracker {
    /// Fresh counters, one per file change
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines inserted so far
    #[must_use]
    pub fn lines_added(&self) -> usize {
        self.lines_added
    }

    /// Lines deleted so far
    #[must_use]
    pub fn lines_deleted(&self) -> usize {
        self.lines_deleted
    }

    /// Net change in line count so far
    #[must_use]
    pub fn net_delta(&self) -> i64 {
        self.lines_added as i64 - self.lines_deleted as i64
    }

    /// Buffer coordinate of a 1-based removal line before any update
    #[must_use]
    pub fn removal_line(&self, line_number: usize) -> i64 {
        line_number as i64 - 1 + self.net_delta()
    }

    /// Translate an edit and advance the counters
    ///
    /// Returns `None` if the edit lands above the first buffer line, which
    /// only happens when the patch does not belong to the buffer; the
    /// counters are left untouched in that case.
    pub fn resolve(&mut self, edit: CompactedEdit) -> Option<ResolvedEdit> {
        match edit {
            CompactedEdit::Deleted(range) => {
                let from = usize::try_from(self.removal_line(range.from)).ok()?;
                let to = usize::try_from(self.removal_line(range.to)).ok()?;
                self.lines_deleted += range.len();
                Some(ResolvedEdit::Delete {
                    from,
                    to,
                    expected: range.content,
                })
            }
            CompactedEdit::Added(edit) => {
                let line = edit.line_number.checked_sub(1)?;
                self.lines_added += 1;
                Some(ResolvedEdit::Insert {
                    line,
                    text: edit.line,
                })
            }
        }
    }
}

// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for retrace-core

use thiserror::Error;

/// Errors that stop a replay
///
/// None of these are retried: each one means the replay's model of the tree
/// no longer matches the history being replayed.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Patch text does not follow the unified diff grammar
    #[error("Malformed patch at line {line}: {reason}")]
    MalformedPatch {
        /// 1-based line of the patch text where parsing failed
        line: usize,
        /// What was expected at that line
        reason: String,
    },

    /// Buffer content does not match the lines a deletion expects to remove
    #[error(
        "Replay out of sync in {path} at lines {from_line}..={to_line}: expected {expected:?}, found {actual:?}"
    )]
    Desync {
        /// Path of the buffer being edited
        path: String,
        /// First buffer line of the deletion (0-based)
        from_line: usize,
        /// Last buffer line of the deletion (0-based, inclusive)
        to_line: usize,
        /// Text the patch says is being removed
        expected: String,
        /// Text the buffer actually holds at that range
        actual: String,
    },

    /// Rename target is already tracked as a different file
    #[error("Cannot rename {from} to {to}: target already exists")]
    PathConflict {
        /// Source path of the rename
        from: String,
        /// Target path that is already tracked
        to: String,
    },

    /// An edit addresses a file that is not tracked
    #[error("No tracked file at {path}")]
    UnknownPath {
        /// The untracked path
        path: String,
    },

    /// An edit addresses a line the buffer does not have
    #[error("Line {line} is out of range for {path} ({len} lines)")]
    LineOutOfRange {
        /// Path of the buffer being edited
        path: String,
        /// Requested line (may be negative after drift correction)
        line: i64,
        /// Number of lines in the buffer
        len: usize,
    },

    /// An ignore rule could not be compiled
    #[error("Invalid ignore pattern {pattern:?}: {source}")]
    InvalidIgnorePattern {
        /// The rule as written in the ignore file
        pattern: String,
        /// Underlying glob error
        source: globset::Error,
    },

    /// The commit source failed to produce history or patch text
    #[error("Commit source error: {message}")]
    Source {
        /// Description of the failure
        message: String,
    },
}

impl ReplayError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedPatch {
            line,
            reason: reason.into(),
        }
    }
}

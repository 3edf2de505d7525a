// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Replay operations and the sinks that consume them

use std::fmt;
use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};

/// One step of a replay, in 0-based buffer coordinates
///
/// Consumers must apply operations in the order they are delivered. An
/// [`Insert`](ReplayOp::Insert) at column 0 opens a new line at `line`; an
/// insert at a later column adds text to that line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ReplayOp {
    /// A commit starts
    BeginCommit {
        /// Commit SHA
        sha: String,
        /// Position in replay order
        ordinal: usize,
    },
    /// A file starts being tracked, empty
    CreateFile {
        /// File path
        path: String,
    },
    /// A file stops being tracked
    DeleteFile {
        /// File path
        path: String,
    },
    /// A file moves, keeping its content
    RenamePath {
        /// Old path
        from: String,
        /// New path
        to: String,
    },
    /// Text is typed into a file
    Insert {
        /// File path
        path: String,
        /// Buffer line
        line: usize,
        /// Character column; 0 opens a new line
        column: usize,
        /// Inserted text, never containing a newline
        text: String,
    },
    /// Whole lines are removed from a file
    DeleteRange {
        /// File path
        path: String,
        /// First removed line
        from_line: usize,
        /// Last removed line (inclusive)
        to_line: usize,
    },
    /// An entry is added to the commit log
    AppendLog {
        /// Log entry text
        text: String,
    },
    /// A commit is fully replayed
    EndCommit {
        /// Commit SHA
        sha: String,
    },
}

impl ReplayOp {
    /// The file an operation touches, if any
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::CreateFile { path }
            | Self::DeleteFile { path }
            | Self::Insert { path, .. }
            | Self::DeleteRange { path, .. } => Some(path),
            Self::RenamePath { to, .. } => Some(to),
            Self::BeginCommit { .. } | Self::AppendLog { .. } | Self::EndCommit { .. } => None,
        }
    }

    /// Check if the operation mentions `name` in any path position
    #[must_use]
    pub fn mentions(&self, name: &str) -> bool {
        match self {
            Self::RenamePath { from, to } => from == name || to == name,
            other => other.path() == Some(name),
        }
    }
}

impl fmt::Display for ReplayOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BeginCommit { sha, ordinal } => write!(f, "begin #{ordinal} {sha}"),
            Self::CreateFile { path } => write!(f, "create {path}"),
            Self::DeleteFile { path } => write!(f, "delete {path}"),
            Self::RenamePath { from, to } => write!(f, "rename {from} -> {to}"),
            Self::Insert {
                path,
                line,
                column,
                text,
            } => write!(f, "insert {path} {line}:{column} {text:?}"),
            Self::DeleteRange {
                path,
                from_line,
                to_line,
            } => write!(f, "delete-lines {path} {from_line}..={to_line}"),
            Self::AppendLog { text } => write!(f, "log {text:?}"),
            Self::EndCommit { sha } => write!(f, "end {sha}"),
        }
    }
}

/// Consumer of replay operations
///
/// Returning `ControlFlow::Break(())` cancels the replay after the operation
/// that was just delivered; nothing is rolled back.
pub trait ReplaySink {
    /// Receive the next operation
    fn apply(&mut self, op: &ReplayOp) -> ControlFlow<()>;
}

impl ReplaySink for Vec<ReplayOp> {
    fn apply(&mut self, op: &ReplayOp) -> ControlFlow<()> {
        self.push(op.clone());
        ControlFlow::Continue(())
    }
}

impl<S: ReplaySink + ?Sized> ReplaySink for &mut S {
    fn apply(&mut self, op: &ReplayOp) -> ControlFlow<()> {
        (**self).apply(op)
    }
}

/// Adapter turning a closure into a [`ReplaySink`]
pub struct FnSink<F>(pub F);

impl<F> ReplaySink for FnSink<F>
where
    F: FnMut(&ReplayOp) -> ControlFlow<()>,
{
    fn apply(&mut self, op: &ReplayOp) -> ControlFlow<()> {
        (self.0)(op)
    }
}

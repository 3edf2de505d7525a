// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! retrace-git: git repositories as commit sources for retrace
//!
//! [`GitRepo`] walks a repository with `git2` and prints each commit's patch
//! as unified diff text, implementing [`retrace_core::CommitSource`].

#![warn(missing_docs)]

//! # Example
//!
//! ```no_run
//! use retrace_core::{IgnoreRules, ReplayOp, ReplayOptions, ReplaySession};
//! use retrace_git::{GitRepo, WalkOptions};
//!
//! let repo = GitRepo::discover(".")
//!     .expect("open repo")
//!     .with_walk_options(WalkOptions::latest(10).first_parent());
//!
//! let mut session = ReplaySession::new(IgnoreRules::empty(), ReplayOptions::default());
//! let mut ops: Vec<ReplayOp> = Vec::new();
//! let summary = session.replay_source(&repo, &mut ops).expect("replay");
//! println!("{} commits, {} operations", summary.commits, ops.len());
//! ```

pub mod error;
pub mod repo;

pub use error::GitError;
pub use repo::{GitRepo, WalkOptions};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::GitError;
    pub use crate::repo::{GitRepo, WalkOptions};
}

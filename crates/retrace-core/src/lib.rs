// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! retrace-core: replays commit history as ordered buffer edits
//!
//! Each commit's unified diff is parsed, filtered through ignore rules,
//! compacted into deletion ranges and single-line additions, corrected for
//! line drift and applied to an in-memory tree. Every step is also handed to
//! a [`ReplaySink`] so a consumer can animate, record or mirror the replay.

#![warn(missing_docs)]

//! # Example
//!
//! ```no_run
//! use retrace_core::prelude::*;
//!
//! # fn source() -> MemorySource { MemorySource::new() }
//! let ignore = IgnoreRules::parse("target/\n*.lock\n").expect("ignore rules");
//! let mut session = ReplaySession::new(ignore, ReplayOptions::default());
//!
//! let summary = session
//!     .replay_source(&source(), FnSink(|op: &ReplayOp| {
//!         println!("{op}");
//!         std::ops::ControlFlow::Continue(())
//!     }))
//!     .expect("replay");
//! println!("{} commits replayed", summary.commits);
//! ```

pub mod commit;
pub mod compact;
pub mod drift;
pub mod error;
pub mod ignore;
pub mod op;
pub mod patch;
pub mod session;
pub mod source;
pub mod store;

pub use commit::{Commit, History};
pub use compact::{CompactedEdit, DeletedRange, compact};
pub use drift::{DriftTracker, ResolvedEdit};
pub use error::ReplayError;
pub use ignore::{IgnoreRules, Suppression};
pub use op::{FnSink, ReplayOp, ReplaySink};
pub use patch::{CommitPatch, EditKind, FileChange, LineEdit, PatchStats, parse_patch};
pub use session::{CommitLog, DEFAULT_CHUNK_SIZE, ReplayOptions, ReplaySession, ReplaySummary};
pub use source::{CommitSource, MemorySource};
pub use store::VirtualFileStore;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::commit::{Commit, History};
    pub use crate::error::ReplayError;
    pub use crate::ignore::IgnoreRules;
    pub use crate::op::{FnSink, ReplayOp, ReplaySink};
    pub use crate::session::{ReplayOptions, ReplaySession, ReplaySummary};
    pub use crate::source::{CommitSource, MemorySource};
    pub use crate::store::VirtualFileStore;
}

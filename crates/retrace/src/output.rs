// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Writing the operation stream
//!
//! [`OpWriter`] is the sink the command line tool hands to the replay
//! session. A failed write cancels the replay; the error is kept and
//! returned from [`OpWriter::finish`].

use std::io::{self, Write};
use std::ops::ControlFlow;

use retrace_core::{ReplayOp, ReplaySink, ReplaySummary};

use crate::config::OutputFormat;

/// Sink writing each operation to `out` in the chosen format
pub struct OpWriter<W: Write> {
    out: W,
    format: OutputFormat,
    written: usize,
    error: Option<io::Error>,
}

impl<W: Write> OpWriter<W> {
    /// Create a writer for `format`
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out,
            format,
            written: 0,
            error: None,
        }
    }

    /// Number of operations written so far
    #[must_use]
    pub fn written(&self) -> usize {
        self.written
    }

    fn write_op(&mut self, op: &ReplayOp) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => writeln!(self.out, "{op}")?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.out, op)?;
                self.out.write_all(b"\n")?;
            }
            OutputFormat::Summary => return Ok(()),
        }
        self.written += 1;
        Ok(())
    }

    /// Flush the output and hand back the inner writer
    ///
    /// # Errors
    ///
    /// Returns the first write error seen during the replay, or the flush
    /// error.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> ReplaySink for OpWriter<W> {
    fn apply(&mut self, op: &ReplayOp) -> ControlFlow<()> {
        match self.write_op(op) {
            Ok(()) => ControlFlow::Continue(()),
            Err(e) => {
                self.error = Some(e);
                ControlFlow::Break(())
            }
        }
    }
}

/// One-line human readable summary of a replay
#[must_use]
pub fn render_summary(summary: &ReplaySummary) -> String {
    let mut text = format!(
        "Replayed {} commits: {} files changed, {} suppressed, {} operations",
        summary.commits, summary.files, summary.suppressed, summary.operations
    );
    if summary.cancelled {
        text.push_str(" (cancelled)");
    }
    text
}

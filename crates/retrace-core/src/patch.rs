// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Unified diff parsing
//!
//! Turns the patch text of a single commit (as printed by `git diff`,
//! `git format-patch` or any plain `diff -u` style tool) into a
//! [`CommitPatch`]: one [`FileChange`] per file section, each carrying the
//! added and removed lines in the order they appear in the patch.
//!
//! Hunk bodies are consumed by the counts declared in their `@@` header, so a
//! removed line whose text happens to look like a header (`--- a/x`) is still
//! read as a removal. A body that runs out before its counts are satisfied is
//! rejected rather than guessed at.
//!
//! Lines are split with [`str::lines`], so a `\r\n` terminator is removed
//! along with the `\n`. CRLF files replay as LF-only line text.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::ReplayError;

const NULL_DEVICE: &str = "/dev/null";

/// Whether a line was added to or removed from a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditKind {
    /// Line present only in the post-image
    Added,
    /// Line present only in the pre-image
    Removed,
}

/// One added or removed line of a patch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineEdit {
    /// Added or removed
    pub kind: EditKind,
    /// 1-based line number: target side for additions, source side for removals
    pub line_number: usize,
    /// Line text without the diff marker or trailing newline
    pub line: String,
}

impl LineEdit {
    /// Create an added line at the given target line number
    #[must_use]
    pub fn added(line_number: usize, line: impl Into<String>) -> Self {
        Self {
            kind: EditKind::Added,
            line_number,
            line: line.into(),
        }
    }

    /// Create a removed line at the given source line number
    #[must_use]
    pub fn removed(line_number: usize, line: impl Into<String>) -> Self {
        Self {
            kind: EditKind::Removed,
            line_number,
            line: line.into(),
        }
    }

    /// Check if this edit adds a line
    #[must_use]
    pub fn is_added(&self) -> bool {
        self.kind == EditKind::Added
    }
}

/// Changes made to a single file by a commit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Path before the commit (`None` if the file is created)
    pub before_name: Option<String>,
    /// Path after the commit (`None` if the file is deleted)
    pub after_name: Option<String>,
    /// The file is removed by this commit
    pub deleted: bool,
    /// The file is created by this commit
    pub added: bool,
    /// The patch carries no line-level content for this file
    pub binary: bool,
    /// Added and removed lines in patch order
    pub edits: Vec<LineEdit>,
}

impl FileChange {
    /// The name the file is known under when the change starts
    #[must_use]
    pub fn path(&self) -> &str {
        self.before_name
            .as_deref()
            .or(self.after_name.as_deref())
            .unwrap_or("")
    }

    /// The name the file is known under once the change is applied
    #[must_use]
    pub fn new_path(&self) -> &str {
        self.after_name
            .as_deref()
            .or(self.before_name.as_deref())
            .unwrap_or("")
    }

    /// Check if the file moves to a different path
    #[must_use]
    pub fn is_rename(&self) -> bool {
        matches!(
            (&self.before_name, &self.after_name),
            (Some(before), Some(after)) if before != after
        )
    }

    /// Number of added lines
    #[must_use]
    pub fn insertions(&self) -> usize {
        self.edits.iter().filter(|e| e.is_added()).count()
    }

    /// Number of removed lines
    #[must_use]
    pub fn deletions(&self) -> usize {
        self.edits.len() - self.insertions()
    }
}

/// All file changes of one commit, in patch order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitPatch {
    /// File sections in the order they appear in the patch
    pub files: Vec<FileChange>,
}

/// Line counts for a parsed patch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchStats {
    /// Number of files changed
    pub files_changed: usize,
    /// Total lines added
    pub insertions: usize,
    /// Total lines deleted
    pub deletions: usize,
}

impl CommitPatch {
    /// Number of file sections
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if the patch touches no files
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Summarize the patch
    #[must_use]
    pub fn stats(&self) -> PatchStats {
        self.files.iter().fold(
            PatchStats {
                files_changed: self.files.len(),
                ..PatchStats::default()
            },
            |mut stats, file| {
                stats.insertions += file.insertions();
                stats.deletions += file.deletions();
                stats
            },
        )
    }
}

impl IntoIterator for CommitPatch {
    type Item = FileChange;
    type IntoIter = std::vec::IntoIter<FileChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

/// Parse the patch text of a single commit
///
/// # Errors
///
/// Returns `ReplayError::MalformedPatch` if a file section or hunk cannot be
/// parsed, including hunks whose bodies disagree with their declared counts.
pub fn parse_patch(text: &str) -> Result<CommitPatch, ReplayError> {
    let patch = PatchParser::new(text).parse()?;
    debug!(files = patch.len(), "Parsed patch");
    Ok(patch)
}

struct PatchParser<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> PatchParser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
            pos: 0,
        }
    }

    fn current(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    fn peek(&self, offset: usize) -> Option<&'a str> {
        self.lines.get(self.pos + offset).copied()
    }

    /// 1-based line number of the current position, for error reporting
    fn line_no(&self) -> usize {
        self.pos + 1
    }

    fn parse(mut self) -> Result<CommitPatch, ReplayError> {
        let mut files = Vec::new();

        // Anything that isn't a file section (mail headers, commit message,
        // diffstat, format-patch signature) is skipped.
        while let Some(line) = self.current() {
            if let Some(header) = line.strip_prefix("diff --git ") {
                files.push(self.git_section(header)?);
            } else if line.starts_with("--- ")
                && self.peek(1).is_some_and(|next| next.starts_with("+++ "))
            {
                let mut change = FileChange::default();
                self.file_headers(&mut change)?;
                self.hunks(&mut change)?;
                files.push(change);
            } else if line.starts_with("@@ ") {
                return Err(ReplayError::malformed(
                    self.line_no(),
                    "hunk header outside of a file section",
                ));
            } else {
                self.pos += 1;
            }
        }

        Ok(CommitPatch { files })
    }

    /// Parse a section introduced by `diff --git a/X b/Y`
    fn git_section(&mut self, header: &str) -> Result<FileChange, ReplayError> {
        let (before, after) = split_git_header(header).ok_or_else(|| {
            ReplayError::malformed(self.line_no(), format!("unparseable diff header {header:?}"))
        })?;
        let mut change = FileChange {
            before_name: Some(before),
            after_name: Some(after),
            ..FileChange::default()
        };
        self.pos += 1;

        while let Some(line) = self.current() {
            if line.starts_with("diff --git ") || line.starts_with("@@ ") {
                break;
            }
            if line.starts_with("--- ") {
                self.file_headers(&mut change)?;
                break;
            }

            if let Some(name) = line.strip_prefix("rename from ") {
                change.before_name = Some(unquote(name));
            } else if let Some(name) = line.strip_prefix("rename to ") {
                change.after_name = Some(unquote(name));
            } else if line.starts_with("new file mode") {
                change.added = true;
                change.before_name = None;
            } else if line.starts_with("deleted file mode") {
                change.deleted = true;
                change.after_name = None;
            } else if line.starts_with("Binary files ") || line == "GIT binary patch" {
                change.binary = true;
            }
            self.pos += 1;
        }

        self.hunks(&mut change)?;
        trace!(
            before = ?change.before_name,
            after = ?change.after_name,
            edits = change.edits.len(),
            "Parsed file section"
        );
        Ok(change)
    }

    /// Parse a `--- X` / `+++ Y` header pair
    fn file_headers(&mut self, change: &mut FileChange) -> Result<(), ReplayError> {
        let minus = self.current().unwrap_or_default();
        let Some(plus) = self.peek(1).filter(|next| next.starts_with("+++ ")) else {
            return Err(ReplayError::malformed(
                self.line_no() + 1,
                "expected `+++` header after `---` header",
            ));
        };

        match header_path(&minus[4..], "a/") {
            Some(name) => change.before_name = Some(name),
            None => {
                change.before_name = None;
                change.added = true;
            }
        }
        match header_path(&plus[4..], "b/") {
            Some(name) => change.after_name = Some(name),
            None => {
                change.after_name = None;
                change.deleted = true;
            }
        }

        self.pos += 2;
        Ok(())
    }

    fn hunks(&mut self, change: &mut FileChange) -> Result<(), ReplayError> {
        while self.current().is_some_and(|line| line.starts_with("@@ ")) {
            self.hunk(change)?;
        }
        Ok(())
    }

    /// Parse one hunk, consuming exactly the lines its header declares
    fn hunk(&mut self, change: &mut FileChange) -> Result<(), ReplayError> {
        let header = self.current().unwrap_or_default();
        let range = HunkRange::parse(header).ok_or_else(|| {
            ReplayError::malformed(self.line_no(), format!("invalid hunk header {header:?}"))
        })?;
        self.pos += 1;

        let mut old_line = range.old_start;
        let mut new_line = range.new_start;
        let mut old_left = range.old_count;
        let mut new_left = range.new_count;

        while old_left > 0 || new_left > 0 {
            let Some(line) = self.current() else {
                return Err(ReplayError::malformed(
                    self.line_no(),
                    format!(
                        "hunk ended early: {old_left} source and {new_left} target lines missing"
                    ),
                ));
            };

            match line.as_bytes().first() {
                Some(b'+') => {
                    if new_left == 0 {
                        return Err(ReplayError::malformed(
                            self.line_no(),
                            "more added lines than the hunk header declares",
                        ));
                    }
                    change.edits.push(LineEdit::added(new_line, &line[1..]));
                    new_line = new_line.saturating_add(1);
                    new_left -= 1;
                }
                Some(b'-') => {
                    if old_left == 0 {
                        return Err(ReplayError::malformed(
                            self.line_no(),
                            "more removed lines than the hunk header declares",
                        ));
                    }
                    change.edits.push(LineEdit::removed(old_line, &line[1..]));
                    old_line = old_line.saturating_add(1);
                    old_left -= 1;
                }
                // Some tools strip the single space of an empty context line.
                Some(b' ') | None => {
                    if old_left == 0 || new_left == 0 {
                        return Err(ReplayError::malformed(
                            self.line_no(),
                            "more context lines than the hunk header declares",
                        ));
                    }
                    old_line = old_line.saturating_add(1);
                    new_line = new_line.saturating_add(1);
                    old_left -= 1;
                    new_left -= 1;
                }
                // `\ No newline at end of file`
                Some(b'\\') => {}
                Some(_) => {
                    return Err(ReplayError::malformed(
                        self.line_no(),
                        format!("unexpected line in hunk body {line:?}"),
                    ));
                }
            }
            self.pos += 1;
        }

        while self.current().is_some_and(|line| line.starts_with('\\')) {
            self.pos += 1;
        }
        Ok(())
    }
}

/// Parsed `@@ -a,b +c,d @@` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HunkRange {
    old_start: usize,
    old_count: usize,
    new_start: usize,
    new_count: usize,
}

impl HunkRange {
    fn parse(header: &str) -> Option<Self> {
        let ranges = header.strip_prefix("@@ ")?.split_once(" @@")?.0;
        let mut parts = ranges.split_whitespace();
        let (old_start, old_count) = parse_range(parts.next()?.strip_prefix('-')?)?;
        let (new_start, new_count) = parse_range(parts.next()?.strip_prefix('+')?)?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            old_start,
            old_count,
            new_start,
            new_count,
        })
    }
}

fn parse_range(s: &str) -> Option<(usize, usize)> {
    match s.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((s.parse().ok()?, 1)),
    }
}

/// Resolve the path of a `---`/`+++` header, `None` for the null device
fn header_path(raw: &str, prefix: &str) -> Option<String> {
    // Plain `diff -u` appends a tab and a timestamp.
    let raw = raw.split('\t').next().unwrap_or(raw).trim_end();
    if raw == NULL_DEVICE {
        return None;
    }
    let name = unquote(raw);
    Some(strip_prefix_owned(name, prefix))
}

fn strip_prefix_owned(name: String, prefix: &str) -> String {
    match name.strip_prefix(prefix) {
        Some(rest) => rest.to_string(),
        None => name,
    }
}

/// Split the `a/X b/Y` part of a `diff --git` line
///
/// Unquoted paths may contain spaces, so when several ` b/` separators are
/// possible the one that yields matching names wins.
fn split_git_header(header: &str) -> Option<(String, String)> {
    if header.starts_with('"') {
        let (before, rest) = split_quoted(header)?;
        let rest = rest.trim_start();
        let after = if rest.starts_with('"') {
            split_quoted(rest)?.0
        } else {
            rest.to_string()
        };
        return Some((
            strip_prefix_owned(before, "a/"),
            strip_prefix_owned(after, "b/"),
        ));
    }

    let candidates: Vec<usize> = header.match_indices(" b/").map(|(idx, _)| idx).collect();
    let split = candidates
        .iter()
        .copied()
        .find(|&idx| header[..idx].strip_prefix("a/") == Some(&header[idx + 3..]))
        .or_else(|| candidates.first().copied())
        .or_else(|| header.find(' '))?;

    let before = header[..split].to_string();
    let after = unquote(header[split + 1..].trim());
    Some((
        strip_prefix_owned(before, "a/"),
        strip_prefix_owned(after, "b/"),
    ))
}

/// Split a leading C-quoted token off `s`, returning it unquoted and the rest
fn split_quoted(s: &str) -> Option<(String, &str)> {
    let bytes = s.as_bytes();
    let mut idx = 1;
    while idx < bytes.len() {
        match bytes[idx] {
            b'\\' => idx += 2,
            b'"' => return Some((unquote(&s[..=idx]), &s[idx + 1..])),
            _ => idx += 1,
        }
    }
    None
}

/// Undo git's C-style path quoting (`"a/sp\303\244ce"`)
fn unquote(s: &str) -> String {
    let Some(inner) = s
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return s.to_string();
    };

    let bytes = inner.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] != b'\\' || idx + 1 == bytes.len() {
            out.push(bytes[idx]);
            idx += 1;
            continue;
        }
        let escaped = bytes[idx + 1];
        idx += 2;
        match escaped {
            b'n' => out.push(b'\n'),
            b't' => out.push(b'\t'),
            b'r' => out.push(b'\r'),
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'v' => out.push(0x0b),
            b'0'..=b'7' => {
                let mut value = u32::from(escaped - b'0');
                let mut digits = 1;
                while digits < 3 && idx < bytes.len() && (b'0'..=b'7').contains(&bytes[idx]) {
                    value = value * 8 + u32::from(bytes[idx] - b'0');
                    idx += 1;
                    digits += 1;
                }
                out.push((value & 0xff) as u8);
            }
            other => out.push(other),
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

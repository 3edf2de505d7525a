// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Ignore rules and per-commit suppression
//!
//! [`IgnoreRules`] understands the usual ignore-file syntax: `#` comments,
//! `!` negation, a trailing `/` for directory-only rules and a leading or
//! inner `/` to anchor a rule to the repository root. The last matching rule
//! wins, and nothing below an ignored directory can be re-included.
//!
//! [`Suppression`] carries the names suppressed so far in the current commit,
//! so that a rename or delete of an ignored file keeps every name it touches
//! out of the replay.

use std::collections::HashSet;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::error::ReplayError;
use crate::patch::FileChange;

#[derive(Debug, Clone)]
struct Rule {
    negated: bool,
    dir_only: bool,
}

/// Compiled ignore rules
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    rules: Vec<Rule>,
    set: GlobSet,
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            set: GlobSet::empty(),
        }
    }
}

impl IgnoreRules {
    /// Rules that ignore nothing
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile rules from ignore-file text, one pattern per line
    ///
    /// # Errors
    ///
    /// Returns `ReplayError::InvalidIgnorePattern` for a pattern that is not
    /// a valid glob.
    pub fn parse(text: &str) -> Result<Self, ReplayError> {
        let mut rules = Vec::new();
        let mut builder = GlobSetBuilder::new();

        for raw in text.lines() {
            let line = trim_trailing_spaces(raw);
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (negated, line) = match line.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, line),
            };
            let line = if line.starts_with("\\#") || line.starts_with("\\!") {
                &line[1..]
            } else {
                line
            };

            let dir_only = line.ends_with('/');
            let body = line.trim_end_matches('/');
            if body.is_empty() {
                continue;
            }

            // A slash anywhere but the end ties the rule to the root.
            let anchored = body.contains('/');
            let body = body.trim_start_matches('/');
            let pattern = if anchored {
                body.to_string()
            } else {
                format!("**/{body}")
            };

            let glob = GlobBuilder::new(&pattern)
                .literal_separator(true)
                .backslash_escape(true)
                .build()
                .map_err(|source| ReplayError::InvalidIgnorePattern {
                    pattern: raw.to_string(),
                    source,
                })?;
            builder.add(glob);
            rules.push(Rule { negated, dir_only });
        }

        let set = builder
            .build()
            .map_err(|source| ReplayError::InvalidIgnorePattern {
                pattern: text.lines().next().unwrap_or_default().to_string(),
                source,
            })?;
        debug!(rules = rules.len(), "Compiled ignore rules");
        Ok(Self { rules, set })
    }

    /// Number of active rules
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if there are no rules
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Check if a repository-relative file path is ignored
    #[must_use]
    pub fn is_ignored(&self, path: &str) -> bool {
        if self.rules.is_empty() {
            return false;
        }

        let components: Vec<&str> = path
            .trim_start_matches("./")
            .split('/')
            .filter(|c| !c.is_empty())
            .collect();
        if components.is_empty() {
            return false;
        }

        for end in 1..components.len() {
            if self.last_match(&components[..end].join("/"), true) == Some(true) {
                return true;
            }
        }
        self.last_match(&components.join("/"), false) == Some(true)
    }

    /// Verdict of the last rule matching `candidate`, `true` meaning ignored
    fn last_match(&self, candidate: &str, is_dir: bool) -> Option<bool> {
        self.set
            .matches(candidate)
            .into_iter()
            .filter(|&idx| is_dir || !self.rules[idx].dir_only)
            .max()
            .map(|idx| !self.rules[idx].negated)
    }
}

/// Strip trailing spaces that are not escaped with a backslash
fn trim_trailing_spaces(line: &str) -> &str {
    let line = line.trim_end_matches('\r');
    let trimmed = line.trim_end_matches(' ');
    if trimmed.ends_with('\\') && trimmed.len() < line.len() {
        &line[..=trimmed.len()]
    } else {
        trimmed
    }
}

/// Names suppressed so far within one commit
#[derive(Debug, Clone, Default)]
pub struct Suppression {
    names: HashSet<String>,
}

impl Suppression {
    /// Create an empty suppression set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every suppressed name; called when a new commit starts
    pub fn reset(&mut self) {
        self.names.clear();
    }

    /// Decide whether a file change is suppressed, recording its names if so
    ///
    /// A change is suppressed when the name it starts from matches an ignore
    /// rule, or when either of its names was already suppressed earlier in
    /// the same commit.
    pub fn check(&mut self, rules: &IgnoreRules, change: &FileChange) -> bool {
        let names = [change.before_name.as_deref(), change.after_name.as_deref()];
        let suppressed = rules.is_ignored(change.path())
            || names.iter().flatten().any(|name| self.names.contains(*name));

        if suppressed {
            for name in names.into_iter().flatten() {
                self.names.insert(name.to_string());
            }
        }
        suppressed
    }

    /// Check if a name is suppressed
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of suppressed names
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if nothing is suppressed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(text: &str) -> IgnoreRules {
        IgnoreRules::parse(text).expect("valid rules")
    }

    fn rename(from: &str, to: &str) -> FileChange {
        FileChange {
            before_name: Some(from.to_string()),
            after_name: Some(to.to_string()),
            ..FileChange::default()
        }
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let r = rules("# build output\n\n   \n*.log\n");
        assert_eq!(r.len(), 1);
        assert!(r.is_ignored("debug.log"));
        assert!(r.is_ignored("logs/deep/debug.log"));
        assert!(!r.is_ignored("debug.txt"));
    }

    #[test]
    fn test_empty_rules_ignore_nothing() {
        let r = IgnoreRules::empty();
        assert!(r.is_empty());
        assert!(!r.is_ignored("anything"));
    }

    #[test]
    fn test_negation_last_match_wins() {
        let r = rules("*.log\n!keep.log\n");
        assert!(r.is_ignored("a.log"));
        assert!(!r.is_ignored("keep.log"));
        assert!(!r.is_ignored("sub/keep.log"));

        let r = rules("!keep.log\n*.log\n");
        assert!(r.is_ignored("keep.log"));
    }

    #[test]
    fn test_directory_rules() {
        let r = rules("target/\n");
        assert!(r.is_ignored("target/debug/app"));
        assert!(r.is_ignored("crates/x/target/out.o"));
        // A file named like the directory is not matched by a directory rule.
        assert!(!r.is_ignored("target"));
        assert!(!r.is_ignored("src/target"));
    }

    #[test]
    fn test_anchored_rules() {
        let r = rules("/build\ndocs/*.html\n");
        assert!(r.is_ignored("build"));
        assert!(r.is_ignored("build/out.txt"));
        assert!(!r.is_ignored("src/build"));
        assert!(r.is_ignored("docs/index.html"));
        assert!(!r.is_ignored("docs/api/index.html"));
        assert!(!r.is_ignored("other/docs/index.html"));
    }

    #[test]
    fn test_double_star() {
        let r = rules("**/generated/**\n");
        assert!(r.is_ignored("generated/a.rs"));
        assert!(r.is_ignored("src/generated/deep/a.rs"));
        assert!(!r.is_ignored("src/a.rs"));
    }

    #[test]
    fn test_cannot_reinclude_below_ignored_directory() {
        let r = rules("vendor/\n!vendor/keep.rs\n");
        assert!(r.is_ignored("vendor/keep.rs"));
    }

    #[test]
    fn test_escaped_hash_and_bang() {
        let r = rules("\\#notes\n\\!important\n");
        assert!(r.is_ignored("#notes"));
        assert!(r.is_ignored("!important"));
    }

    #[test]
    fn test_trailing_spaces() {
        assert_eq!(trim_trailing_spaces("a.txt   "), "a.txt");
        assert_eq!(trim_trailing_spaces("a\\ "), "a\\ ");
        assert_eq!(trim_trailing_spaces("a.txt\r"), "a.txt");
    }

    #[test]
    fn test_invalid_pattern() {
        let err = IgnoreRules::parse("ok.txt\nbad[\n").unwrap_err();
        match err {
            ReplayError::InvalidIgnorePattern { pattern, .. } => assert_eq!(pattern, "bad["),
            other => panic!("Expected InvalidIgnorePattern, got {other:?}"),
        }
    }

    #[test]
    fn test_suppression_matches_before_name() {
        let r = rules("secret/\n");
        let mut s = Suppression::new();

        assert!(s.check(&r, &rename("secret/key.pem", "public/key.pem")));
        assert!(s.contains("secret/key.pem"));
        assert!(s.contains("public/key.pem"));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_suppression_follows_rename_chain() {
        let r = rules("*.tmp\n");
        let mut s = Suppression::new();

        assert!(s.check(&r, &rename("a.tmp", "b.txt")));
        // b.txt matches no rule, but it was reached from an ignored name.
        assert!(s.check(&r, &rename("b.txt", "c.txt")));
        assert!(s.contains("c.txt"));

        let unrelated = rename("d.txt", "e.txt");
        assert!(!s.check(&r, &unrelated));
        assert!(!s.contains("d.txt"));
    }

    #[test]
    fn test_suppression_reset() {
        let r = rules("*.tmp\n");
        let mut s = Suppression::new();
        assert!(s.check(&r, &rename("a.tmp", "b.txt")));

        s.reset();
        assert!(s.is_empty());
        assert!(!s.check(&r, &rename("b.txt", "c.txt")));
    }

    #[test]
    fn test_new_file_checked_by_its_only_name() {
        let r = rules("*.lock\n");
        let mut s = Suppression::new();
        let created = FileChange {
            after_name: Some("Cargo.lock".to_string()),
            added: true,
            ..FileChange::default()
        };
        assert!(s.check(&r, &created));
        assert!(s.contains("Cargo.lock"));
    }
}

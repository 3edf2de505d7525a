// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Configuration for the retrace command line tool
//!
//! This module provides the command line options, their environment
//! fallbacks, and the defaults used to locate the repository and its ignore
//! rules.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, ValueEnum};
use retrace_core::{DEFAULT_CHUNK_SIZE, ReplayOptions};
use retrace_git::WalkOptions;

/// Replay a git history as an ordered stream of buffer edits
#[derive(Parser, Debug, Clone)]
#[command(name = "retrace")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Path inside the git repository to replay
    ///
    /// Defaults to the current working directory.
    #[arg(short, long, env = "RETRACE_REPO")]
    pub repo: Option<PathBuf>,

    /// File with ignore rules (one glob per line, gitignore syntax)
    ///
    /// Defaults to the repository's `.gitignore`, then to the global
    /// `retrace/ignore` file in the platform config directory.
    #[arg(short, long, env = "RETRACE_IGNORE_FILE")]
    pub ignore_file: Option<PathBuf>,

    /// Replay every path, ignoring all ignore files
    #[arg(long, default_value = "false", conflicts_with = "ignore_file")]
    pub no_ignore: bool,

    /// Replay only the N most recent commits
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Start walking history from this reference instead of HEAD
    #[arg(long)]
    pub from: Option<String>,

    /// Only replay commits made at or after this time
    ///
    /// Accepts RFC 3339 (`2026-01-17T09:30:00Z`) or a date (`2026-01-17`),
    /// which means the start of that day in UTC.
    #[arg(long, value_parser = parse_time)]
    pub since: Option<DateTime<Utc>>,

    /// Only replay commits made at or before this time
    #[arg(long, value_parser = parse_time)]
    pub until: Option<DateTime<Utc>>,

    /// Follow only the first parent of merge commits
    #[arg(long, default_value = "false")]
    pub first_parent: bool,

    /// Characters per insert operation after a line's indentation
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE, value_parser = parse_chunk_size)]
    pub chunk_size: usize,

    /// Output format for the operation stream
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Skip checking buffer content before deleting lines
    #[arg(long, default_value = "false")]
    pub no_verify: bool,

    /// Write the commit log to this file once the replay finishes
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Write the replayed tree into this directory once the replay finishes
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    ///
    /// Logs are written to stderr so stdout carries only the operation
    /// stream.
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - suppress info-level logs
    ///
    /// Only errors and warnings will be logged.
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

/// How operations are written to stdout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One human-readable line per operation
    #[default]
    Text,
    /// One JSON object per line
    Json,
    /// No operation stream, only the final summary
    Summary,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repo: None,
            ignore_file: None,
            no_ignore: false,
            limit: None,
            from: None,
            since: None,
            until: None,
            first_parent: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            format: OutputFormat::default(),
            no_verify: false,
            log_file: None,
            output_dir: None,
            verbose: false,
            quiet: false,
        }
    }
}

impl Config {
    /// Get the repository path, using current directory as default
    ///
    /// Returns `None` if no repository is specified and the current
    /// directory cannot be determined.
    #[must_use]
    pub fn repo_path(&self) -> Option<PathBuf> {
        self.repo.clone().or_else(|| std::env::current_dir().ok())
    }

    /// Locate the ignore file for a repository rooted at `root`
    ///
    /// An explicit `--ignore-file` always wins; otherwise the first existing
    /// file among `<root>/.gitignore` and the global ignore file is used.
    #[must_use]
    pub fn ignore_path(&self, root: &Path) -> Option<PathBuf> {
        if self.no_ignore {
            return None;
        }
        if let Some(ref path) = self.ignore_file {
            return Some(path.clone());
        }

        let local = root.join(".gitignore");
        if local.is_file() {
            return Some(local);
        }
        global_ignore_path().filter(|path| path.is_file())
    }

    /// Commit walk derived from the history selection flags
    #[must_use]
    pub fn walk_options(&self) -> WalkOptions {
        WalkOptions {
            limit: self.limit,
            from_ref: self.from.clone(),
            since: self.since,
            until: self.until,
            first_parent: self.first_parent,
        }
    }

    /// Replay options derived from `--chunk-size` and `--no-verify`
    #[must_use]
    pub fn replay_options(&self) -> ReplayOptions {
        let options = ReplayOptions::default().with_chunk_size(self.chunk_size);
        if self.no_verify {
            options.without_verification()
        } else {
            options
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The repository path is specified but doesn't exist or isn't a directory
    /// - The ignore file is specified but doesn't exist
    /// - The output directory exists but isn't a directory
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref repo) = self.repo {
            if !repo.exists() {
                return Err(ConfigError::RepoNotFound(repo.clone()));
            }
            if !repo.is_dir() {
                return Err(ConfigError::RepoNotDirectory(repo.clone()));
            }
        }

        if let Some(ref ignore_file) = self.ignore_file
            && !ignore_file.is_file()
        {
            return Err(ConfigError::IgnoreFileNotFound(ignore_file.clone()));
        }

        if let Some(ref output_dir) = self.output_dir
            && output_dir.exists()
            && !output_dir.is_dir()
        {
            return Err(ConfigError::OutputNotDirectory(output_dir.clone()));
        }

        Ok(())
    }

    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

fn parse_chunk_size(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("chunk size must be at least 1".to_string()),
        Ok(size) => Ok(size),
        Err(e) => Err(e.to_string()),
    }
}

fn parse_time(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(time) = DateTime::parse_from_rfc3339(value) {
        return Ok(time.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|time| time.and_utc())
        .ok_or_else(|| format!("expected RFC 3339 or YYYY-MM-DD, got `{value}`"))
}

/// Global ignore file shared by every repository
///
/// Location is platform-specific:
/// - macOS: ~/Library/Application Support/retrace/ignore
/// - Linux: ~/.config/retrace/ignore
/// - Windows: %APPDATA%\retrace\ignore
#[must_use]
pub fn global_ignore_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("retrace").join("ignore"))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Repository path not found
    #[error("Repository path not found: {0}")]
    RepoNotFound(PathBuf),

    /// Repository path is not a directory
    #[error("Repository path is not a directory: {0}")]
    RepoNotDirectory(PathBuf),

    /// Ignore file not found
    #[error("Ignore file not found: {0}")]
    IgnoreFileNotFound(PathBuf),

    /// Output path exists and is not a directory
    #[error("Output path is not a directory: {0}")]
    OutputNotDirectory(PathBuf),
}

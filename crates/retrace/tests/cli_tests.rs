// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! CLI tests for argument parsing
//!
//! These tests verify flag parsing, defaults and the options derived from a
//! parsed configuration.

use std::path::PathBuf;

use clap::Parser;
use retrace::config::{Config, ConfigError, OutputFormat};
use retrace_core::DEFAULT_CHUNK_SIZE;
use tracing::Level;

fn parse(args: &[&str]) -> Config {
    let argv = std::iter::once("retrace").chain(args.iter().copied());
    Config::try_parse_from(argv).expect("parse should succeed")
}

// ============================================================================
// Defaults
// ============================================================================

#[test]
fn test_no_arguments() {
    let config = parse(&[]);
    assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
    assert_eq!(config.format, OutputFormat::Text);
    assert!(config.limit.is_none());
    assert!(config.from.is_none());
    assert!(!config.first_parent);
    assert!(!config.no_verify);
    assert!(!config.no_ignore);
    assert_eq!(config.log_level(), Level::INFO);
}

// ============================================================================
// History selection
// ============================================================================

#[test]
fn test_limit_short_and_long() {
    assert_eq!(parse(&["-n", "3"]).limit, Some(3));
    assert_eq!(parse(&["--limit", "10"]).limit, Some(10));
}

#[test]
fn test_from_and_first_parent() {
    let config = parse(&["--from", "v1.0", "--first-parent"]);
    let walk = config.walk_options();
    assert_eq!(walk.from_ref.as_deref(), Some("v1.0"));
    assert!(walk.first_parent);
}

#[test]
fn test_invalid_limit_rejected() {
    let result = Config::try_parse_from(["retrace", "--limit", "many"]);
    assert!(result.is_err());
}

#[test]
fn test_date_window() {
    let config = parse(&["--since", "2026-01-01", "--until", "2026-01-31T18:30:00+01:00"]);
    let walk = config.walk_options();
    assert_eq!(
        walk.since.map(|t| t.to_rfc3339()).as_deref(),
        Some("2026-01-01T00:00:00+00:00")
    );
    assert_eq!(
        walk.until.map(|t| t.to_rfc3339()).as_deref(),
        Some("2026-01-31T17:30:00+00:00")
    );
}

#[test]
fn test_invalid_date_rejected() {
    let result = Config::try_parse_from(["retrace", "--since", "last week"]);
    assert!(result.is_err(), "free-form dates should be rejected");
}

// ============================================================================
// Replay options
// ============================================================================

#[test]
fn test_chunk_size() {
    let config = parse(&["--chunk-size", "4"]);
    assert_eq!(config.replay_options().chunk_size, 4);
}

#[test]
fn test_zero_chunk_size_rejected() {
    let result = Config::try_parse_from(["retrace", "--chunk-size", "0"]);
    assert!(result.is_err(), "chunk size 0 should be rejected");
}

#[test]
fn test_no_verify() {
    let config = parse(&["--no-verify"]);
    assert!(!config.replay_options().verify_deletions);
}

// ============================================================================
// Output
// ============================================================================

#[test]
fn test_format_values() {
    assert_eq!(parse(&["--format", "json"]).format, OutputFormat::Json);
    assert_eq!(parse(&["-f", "summary"]).format, OutputFormat::Summary);
    assert_eq!(parse(&["--format", "text"]).format, OutputFormat::Text);
}

#[test]
fn test_unknown_format_rejected() {
    let result = Config::try_parse_from(["retrace", "--format", "yaml"]);
    assert!(result.is_err());
}

#[test]
fn test_output_files() {
    let config = parse(&["--log-file", "log.txt", "-o", "out"]);
    assert_eq!(config.log_file, Some(PathBuf::from("log.txt")));
    assert_eq!(config.output_dir, Some(PathBuf::from("out")));
}

// ============================================================================
// Ignore rules
// ============================================================================

#[test]
fn test_ignore_file_flag() {
    let config = parse(&["--ignore-file", "/tmp/rules"]);
    assert_eq!(config.ignore_file, Some(PathBuf::from("/tmp/rules")));
}

#[test]
fn test_no_ignore_conflicts_with_ignore_file() {
    let result = Config::try_parse_from(["retrace", "--no-ignore", "--ignore-file", "/tmp/rules"]);
    assert!(result.is_err());
}

#[test]
fn test_missing_ignore_file_fails_validation() {
    let config = parse(&["--ignore-file", "/nonexistent/rules/12345"]);
    assert!(matches!(
        config.validate(),
        Err(ConfigError::IgnoreFileNotFound(_))
    ));
}

// ============================================================================
// Logging flags
// ============================================================================

#[test]
fn test_verbose_flag() {
    let config = parse(&["-v"]);
    assert!(config.verbose);
    assert_eq!(config.log_level(), Level::DEBUG);
}

#[test]
fn test_quiet_flag() {
    let config = parse(&["--quiet"]);
    assert!(config.quiet);
    assert_eq!(config.log_level(), Level::WARN);
}

#[test]
fn test_verbose_takes_precedence_over_quiet() {
    let config = parse(&["-v", "-q"]);
    assert_eq!(config.log_level(), Level::DEBUG);
}

// ============================================================================
// Repository path
// ============================================================================

#[test]
fn test_repo_flag() {
    let config = parse(&["--repo", "/tmp"]);
    assert_eq!(config.repo_path(), Some(PathBuf::from("/tmp")));
    assert!(config.validate().is_ok());
}

#[test]
fn test_repo_that_is_a_file_fails_validation() {
    let file = tempfile::NamedTempFile::new().expect("temp file");
    let config = Config {
        repo: Some(file.path().to_path_buf()),
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::RepoNotDirectory(_))
    ));
}

// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Running a replay from a [`Config`]
//!
//! # Example
//!
//! ```no_run
//! use retrace::config::Config;
//!
//! let config = Config::default();
//! let summary = retrace::run::run(&config).expect("replay");
//! eprintln!("Replayed {} commits", summary.commits);
//! ```

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Component, Path};

use anyhow::{Context, Result};
use retrace_core::{CommitSource, IgnoreRules, ReplaySession, ReplaySummary, VirtualFileStore};
use retrace_git::GitRepo;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::output::OpWriter;

/// Replay the configured repository, writing operations to stdout
///
/// # Errors
///
/// Returns an error if the repository cannot be opened, the ignore file
/// cannot be read, the replay fails, or an output file cannot be written.
pub fn run(config: &Config) -> Result<ReplaySummary> {
    let stdout = io::stdout().lock();
    run_with_writer(config, BufWriter::new(stdout))
}

/// Replay the configured repository, writing operations to `out`
///
/// A closed pipe on `out` stops the replay early without an error.
///
/// # Errors
///
/// See [`run`].
pub fn run_with_writer<W: Write>(config: &Config, out: W) -> Result<ReplaySummary> {
    let start = config
        .repo_path()
        .context("Failed to determine the current directory")?;
    let repo = GitRepo::discover(&start)
        .with_context(|| format!("Failed to open repository at {}", start.display()))?
        .with_walk_options(config.walk_options());
    let root = repo
        .workdir()
        .map_or_else(|| start.clone(), Path::to_path_buf);

    let ignore = load_ignore_rules(config, &root)?;
    let history = repo.history().context("Failed to read history")?;
    info!(
        path = %root.display(),
        commits = history.len(),
        rules = ignore.len(),
        "Starting replay"
    );

    // A walk that stops short of the root starts from the parent's tree.
    let seed: Vec<(String, String)> = match history.iter().next().and_then(|first| first.parents.first()) {
        Some(parent) => repo
            .snapshot(parent)
            .with_context(|| format!("Failed to read the tree of {parent}"))?
            .into_iter()
            .filter(|(path, _)| !ignore.is_ignored(path))
            .collect(),
        None => Vec::new(),
    };

    let mut session = ReplaySession::new(ignore, config.replay_options());
    seed_store(session.store_mut(), &seed);
    let mut writer = OpWriter::new(out, config.format);
    let result = session.replay(&history, &repo, &mut writer);

    match writer.finish() {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            debug!("Output closed, replay stopped");
        }
        Err(e) => return Err(e).context("Failed to write operations"),
    }
    let summary = result.context("Replay failed")?;

    if let Some(ref path) = config.log_file {
        fs::write(path, session.log().render())
            .with_context(|| format!("Failed to write commit log to {}", path.display()))?;
        debug!(path = %path.display(), entries = session.log().entries().len(), "Wrote commit log");
    }

    if let Some(ref dir) = config.output_dir {
        let files = write_tree(session.store(), dir)?;
        info!(path = %dir.display(), files, "Wrote replayed tree");
    }

    Ok(summary)
}

/// Fill `store` with files that exist before the first replayed commit
///
/// Seeded files are closed and produce no operations.
pub fn seed_store(store: &mut VirtualFileStore, files: &[(String, String)]) {
    for (path, content) in files {
        store.write(path, content);
        store.close(path);
    }
    if !files.is_empty() {
        debug!(files = files.len(), "Seeded store from parent tree");
    }
}

/// Load the ignore rules that apply to a repository rooted at `root`
///
/// # Errors
///
/// Returns an error if the ignore file cannot be read or holds an invalid
/// pattern.
pub fn load_ignore_rules(config: &Config, root: &Path) -> Result<IgnoreRules> {
    let Some(path) = config.ignore_path(root) else {
        debug!("No ignore file, replaying every path");
        return Ok(IgnoreRules::empty());
    };

    let text = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read ignore file {}", path.display()))?;
    let rules = IgnoreRules::parse(&text)
        .with_context(|| format!("Invalid ignore file {}", path.display()))?;
    debug!(path = %path.display(), rules = rules.len(), "Loaded ignore rules");
    Ok(rules)
}

/// Write every tracked file of `store` under `dir`, returning how many were
/// written
///
/// Non-empty files get a trailing newline. Paths that would escape `dir`
/// are skipped.
///
/// # Errors
///
/// Returns an error if a directory or file cannot be created.
pub fn write_tree(store: &VirtualFileStore, dir: &Path) -> Result<usize> {
    let mut written = 0;
    for path in store.paths() {
        let relative = Path::new(path);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            warn!(path, "Skipping path outside the output directory");
            continue;
        }

        let target = dir.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let mut content = store.read(path).unwrap_or_default();
        if store.lines(path).is_some_and(|lines| !lines.is_empty()) {
            content.push('\n');
        }
        fs::write(&target, content)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        written += 1;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn test_write_tree() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut store = VirtualFileStore::new();
        store.write("src/lib.rs", "fn main() {}\n");
        store.ensure("empty.txt");

        let written = write_tree(&store, dir.path()).expect("write tree");
        assert_eq!(written, 2);
        assert_eq!(
            fs::read_to_string(dir.path().join("src/lib.rs")).expect("read"),
            "fn main() {}\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("empty.txt")).expect("read"),
            ""
        );
    }

    #[test]
    fn test_seed_store_emits_closed_files() {
        let mut store = VirtualFileStore::new();
        seed_store(
            &mut store,
            &[("a.txt".to_string(), "one\ntwo\n".to_string())],
        );
        assert_eq!(store.read("a.txt").as_deref(), Some("one\ntwo"));
        assert!(!store.is_open("a.txt"));
    }

    #[test]
    fn test_write_tree_skips_escaping_paths() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut store = VirtualFileStore::new();
        store.write("../outside.txt", "x");
        store.write("/abs.txt", "x");

        assert_eq!(write_tree(&store, dir.path()).expect("write tree"), 0);
    }

    #[test]
    fn test_load_ignore_rules_without_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = Config {
            no_ignore: true,
            ..Default::default()
        };
        let rules = load_ignore_rules(&config, dir.path()).expect("rules");
        assert!(rules.is_empty());
    }

    #[test]
    fn test_load_ignore_rules_from_gitignore() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join(".gitignore"), "target/\n*.key\n").expect("write");

        let rules = load_ignore_rules(&Config::default(), dir.path()).expect("rules");
        assert_eq!(rules.len(), 2);
        assert!(rules.is_ignored("secret.key"));
    }
}

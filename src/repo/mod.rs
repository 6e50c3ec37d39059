// src/repo/mod.rs

//! Git repository snapshots recorded alongside every run.
//!
//! A [`RepoState`] pins down exactly which code a run was submitted from:
//! the HEAD commit, the uncommitted diff on top of it (plus a blake3 digest
//! of that diff, handy for comparing runs) and the short status of every
//! changed path.

use std::path::{Path, PathBuf};

use git2::{DiffFormat, DiffOptions, Repository, Status, StatusOptions};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::JhConfig;
use crate::errors::{JobHelperError, Result};

/// State of one git working tree at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoState {
    pub directory: PathBuf,
    /// HEAD commit id; `None` on an unborn branch.
    pub commit: Option<String>,
    /// Unified diff of the working tree (index included) against HEAD.
    pub diff: String,
    /// blake3 hex digest of `diff`.
    pub diff_digest: String,
    /// `(path, code)` pairs, `code` in `git status --short` spelling.
    pub status: Vec<(String, String)>,
}

impl RepoState {
    /// Snapshot the repository containing `path`.
    pub fn snapshot(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::discover(path).map_err(|e| {
            JobHelperError::Repo(format!("no git repository at {}: {}", path.display(), e.message()))
        })?;

        let directory = repo
            .workdir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| path.to_path_buf());

        let head = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let commit = head.as_ref().map(|c| c.id().to_string());

        let head_tree = match head.as_ref() {
            Some(c) => Some(c.tree()?),
            None => None,
        };
        let mut opts = DiffOptions::new();
        opts.include_untracked(true).show_untracked_content(true);
        let diff = repo.diff_tree_to_workdir_with_index(head_tree.as_ref(), Some(&mut opts))?;

        let mut buf = Vec::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            match line.origin() {
                '+' | '-' | ' ' => buf.push(line.origin() as u8),
                _ => {}
            }
            buf.extend_from_slice(line.content());
            true
        })?;
        let diff = String::from_utf8_lossy(&buf).into_owned();
        let diff_digest = blake3::hash(diff.as_bytes()).to_hex().to_string();

        let mut status_opts = StatusOptions::new();
        status_opts.include_untracked(true).include_ignored(false);
        let status = repo
            .statuses(Some(&mut status_opts))?
            .iter()
            .filter_map(|entry| {
                let code = short_status(entry.status())?;
                Some((entry.path()?.to_string(), code))
            })
            .collect();

        debug!(directory = ?directory, commit = ?commit, "snapshotted repository");

        Ok(Self {
            directory,
            commit,
            diff,
            diff_digest,
            status,
        })
    }

    /// Any staged, unstaged or untracked change.
    pub fn is_dirty(&self) -> bool {
        !self.status.is_empty()
    }
}

/// Two-letter `git status --short` code; `None` for clean or ignored.
fn short_status(s: Status) -> Option<String> {
    if s.is_empty() || s.contains(Status::IGNORED) {
        return None;
    }
    if s.contains(Status::WT_NEW) && !s.intersects(index_bits()) {
        return Some("??".to_string());
    }

    let index = if s.contains(Status::INDEX_NEW) {
        'A'
    } else if s.contains(Status::INDEX_MODIFIED) {
        'M'
    } else if s.contains(Status::INDEX_DELETED) {
        'D'
    } else if s.contains(Status::INDEX_RENAMED) {
        'R'
    } else if s.contains(Status::INDEX_TYPECHANGE) {
        'T'
    } else {
        ' '
    };
    let worktree = if s.contains(Status::WT_MODIFIED) {
        'M'
    } else if s.contains(Status::WT_DELETED) {
        'D'
    } else if s.contains(Status::WT_RENAMED) {
        'R'
    } else if s.contains(Status::WT_TYPECHANGE) {
        'T'
    } else if s.contains(Status::CONFLICTED) {
        'U'
    } else {
        ' '
    };
    Some(format!("{index}{worktree}"))
}

fn index_bits() -> Status {
    Status::INDEX_NEW
        | Status::INDEX_MODIFIED
        | Status::INDEX_DELETED
        | Status::INDEX_RENAMED
        | Status::INDEX_TYPECHANGE
}

/// Records the repositories named in `[repo_watcher]`.
#[derive(Debug, Clone, Default)]
pub struct RepoWatcher {
    force_commit: Vec<PathBuf>,
    watched: Vec<PathBuf>,
}

impl RepoWatcher {
    pub fn new(force_commit: Vec<PathBuf>, watched: Vec<PathBuf>) -> Self {
        Self {
            force_commit,
            watched,
        }
    }

    pub fn from_config(cfg: &JhConfig) -> Self {
        let section = &cfg.repo_watcher;
        Self::new(
            section.force_commit_repos.iter().map(|p| cfg.resolve_path(p)).collect(),
            section.watched_repos.iter().map(|p| cfg.resolve_path(p)).collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.force_commit.is_empty() && self.watched.is_empty()
    }

    /// Snapshot every configured repository.
    ///
    /// Fails if a force-commit repository has uncommitted changes.
    pub fn repo_states(&self) -> Result<Vec<RepoState>> {
        let mut states: Vec<RepoState> = Vec::new();

        for path in &self.force_commit {
            let state = RepoState::snapshot(path)?;
            if state.is_dirty() {
                let changed: Vec<&str> = state.status.iter().map(|(p, _)| p.as_str()).collect();
                return Err(JobHelperError::Repo(format!(
                    "repository {} has uncommitted changes ({}); commit them before submitting",
                    state.directory.display(),
                    changed.join(", ")
                )));
            }
            states.push(state);
        }

        for path in &self.watched {
            let state = RepoState::snapshot(path)?;
            if states.iter().any(|s| s.directory == state.directory) {
                continue;
            }
            states.push(state);
        }

        if !states.is_empty() {
            info!(count = states.len(), "recorded repository states");
        }
        Ok(states)
    }
}

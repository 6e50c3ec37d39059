// src/archive/mod.rs

//! Archiving of old Slurm job output (`*.out`) and submitted scripts
//! (`*.sh`) into a gzipped tarball next to them.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::Local;
use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::{debug, info, warn};

use crate::errors::{JobHelperError, Result};

const ARCHIVED_EXTENSIONS: [&str; 2] = ["out", "sh"];

/// Outcome of a [`compress_logs`] call that found something to archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedLogs {
    pub archive: PathBuf,
    pub files: Vec<PathBuf>,
}

/// `*.out` and `*.sh` files directly in `dir` last modified before
/// `cutoff`, sorted by path. A missing directory has none.
pub fn stale_log_files(dir: &Path, cutoff: SystemTime) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let archived = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| ARCHIVED_EXTENSIONS.contains(&e));
        if !archived || !entry.file_type()?.is_file() {
            continue;
        }
        if entry.metadata()?.modified()? < cutoff {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Convert a `--hours` value, rejecting negative and non-finite input.
pub fn age_from_hours(hours: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(hours * 3600.0)
        .map_err(|_| JobHelperError::Config(format!("invalid number of hours: {hours}")))
}

/// Move every log file older than `older_than` into
/// `<dir>/<YYYYmmdd_HHMMSS>.tar.gz`, then delete the originals.
///
/// Returns `None` (after a warning) when there is nothing to archive.
pub fn compress_logs(dir: &Path, older_than: Duration) -> Result<Option<CompressedLogs>> {
    let cutoff = SystemTime::now()
        .checked_sub(older_than)
        .unwrap_or(SystemTime::UNIX_EPOCH);
    let files = stale_log_files(dir, cutoff)?;
    if files.is_empty() {
        warn!(dir = ?dir, "no log files to compress");
        return Ok(None);
    }

    let archive = archive_path(dir);
    info!(archive = ?archive, count = files.len(), "compressing log files");

    let mut builder = tar::Builder::new(GzEncoder::new(File::create(&archive)?, Compression::default()));
    for path in &files {
        let name = path
            .file_name()
            .ok_or_else(|| JobHelperError::Config(format!("not a file: {}", path.display())))?;
        builder.append_path_with_name(path, name)?;
    }
    builder.into_inner()?.finish()?;

    for path in &files {
        fs::remove_file(path)?;
        debug!(path = ?path, "archived");
    }

    Ok(Some(CompressedLogs { archive, files }))
}

/// Timestamped archive name, suffixed when an archive from the same second
/// already exists.
fn archive_path(dir: &Path) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let mut path = dir.join(format!("{stamp}.tar.gz"));
    let mut n = 1;
    while path.exists() {
        path = dir.join(format!("{stamp}_{n}.tar.gz"));
        n += 1;
    }
    path
}

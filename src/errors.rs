// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobHelperError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Cycle detected in job graph: {0}")]
    DagCycle(String),

    #[error("'{0}' is reserved and can not be used here")]
    ReservedName(String),

    #[error("job '{job}' is defined in both {first:?} and {second:?}")]
    MergeConflict {
        job: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("failed to parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("failed to render job '{job}': {message}")]
    Render { job: String, message: String },

    #[error("submission of job '{job}' failed: {message}")]
    Submission { job: String, message: String },

    #[error("scheduler error: {0}")]
    Scheduler(String),

    #[error("repository error: {0}")]
    Repo(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<git2::Error> for JobHelperError {
    fn from(err: git2::Error) -> Self {
        JobHelperError::Repo(err.message().to_string())
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, JobHelperError>;

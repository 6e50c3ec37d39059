// src/types.rs

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Job names are free-form strings throughout the crate.
pub type JobName = String;

/// Sentinel dependency target: "no real dependency, hang off the root".
pub const START: &str = "START";

/// Integer job id assigned by the batch scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(JobId)
    }
}

/// What a submission hands back.
///
/// - `Id`: the job really went to the scheduler.
/// - `DryRun`: the script was only printed; dependents refer to the job by
///   name instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobHandle {
    Id(JobId),
    DryRun,
}

impl JobHandle {
    pub fn job_id(&self) -> Option<JobId> {
        match self {
            JobHandle::Id(id) => Some(*id),
            JobHandle::DryRun => None,
        }
    }
}

/// Lifecycle state of a submitted job as reported by the scheduler's
/// accounting interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_completed(&self) -> bool {
        matches!(self, JobState::Completed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Pending => "PENDING",
            JobState::Running => "RUNNING",
            JobState::Completed => "COMPLETED",
            JobState::Failed => "FAILED",
            JobState::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

impl FromStr for JobState {
    type Err = String;

    /// Parse a Slurm state string. `sacct` appends details such as
    /// `CANCELLED by 1234`, so only the first word is significant.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let word = s
            .split_whitespace()
            .next()
            .unwrap_or("")
            .trim_end_matches('+')
            .to_uppercase();
        match word.as_str() {
            "PENDING" | "REQUEUED" | "REQUEUE_HOLD" | "REQUEUE_FED" | "SUSPENDED"
            | "CONFIGURING" | "RESIZING" => Ok(JobState::Pending),
            "RUNNING" | "COMPLETING" | "STOPPED" => Ok(JobState::Running),
            "COMPLETED" => Ok(JobState::Completed),
            "FAILED" | "TIMEOUT" | "OUT_OF_MEMORY" | "NODE_FAIL" | "PREEMPTED"
            | "BOOT_FAIL" | "DEADLINE" | "REVOKED" | "SPECIAL_EXIT" => Ok(JobState::Failed),
            "CANCELLED" => Ok(JobState::Cancelled),
            other => Err(format!("unknown job state '{other}'")),
        }
    }
}

/// Accounting record for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobInfo {
    pub state: JobState,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

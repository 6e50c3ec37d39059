// src/result/mod.rs

//! Record of one submitted run, and recovery of its unfinished jobs.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::engine::Project;
use crate::errors::{JobHelperError, Result};
use crate::graph::{flowchart, NodeClass, ProjectConfig};
use crate::repo::RepoState;
use crate::scheduler::SchedulerBackend;
use crate::types::{JobId, JobInfo, JobName, JobState};

/// Everything needed to inspect or redo a run: the graph as it was
/// submitted, the id every job got, and the state of the code.
///
/// Stored as `<project log dir>/<first job id>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningResult {
    pub config: ProjectConfig,
    pub jobs: BTreeMap<JobName, JobId>,
    pub time: DateTime<Local>,
    #[serde(default)]
    pub repo_states: Vec<RepoState>,
}

/// What [`RunningResult::recover`] ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoverOutcome {
    /// Every recorded job completed.
    NothingToRecover,
    /// The user did not confirm.
    Declined,
    /// Unfinished jobs were cancelled and submitted again.
    Resubmitted {
        jobs: Vec<JobName>,
        result: Option<PathBuf>,
    },
}

impl RunningResult {
    pub fn new(
        config: ProjectConfig,
        jobs: BTreeMap<JobName, JobId>,
        repo_states: Vec<RepoState>,
    ) -> Self {
        Self {
            config,
            jobs,
            time: Local::now(),
            repo_states,
        }
    }

    pub fn path_for(dir: &Path, id: JobId) -> PathBuf {
        dir.join(format!("{id}.json"))
    }

    /// Write the record as `<dir>/<first_id>.json`.
    pub fn save(&self, dir: impl AsRef<Path>, first_id: JobId) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = Self::path_for(dir, first_id);
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| JobHelperError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Ids of the records in `dir`, newest first. A missing directory has
    /// no records.
    pub fn list(dir: impl AsRef<Path>) -> Result<Vec<JobId>> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()).map(str::parse::<JobId>) {
                Some(Ok(id)) => ids.push(id),
                _ => debug!(path = ?path, "ignoring non-result file"),
            }
        }
        ids.sort_unstable_by(|a, b| b.cmp(a));
        Ok(ids)
    }

    /// Current scheduler state of every recorded job.
    ///
    /// Jobs the scheduler has no record of are left out.
    pub async fn job_states(&self, scheduler: &dyn SchedulerBackend) -> Result<BTreeMap<JobName, JobInfo>> {
        let ids: Vec<JobId> = self.jobs.values().copied().collect();
        let mut by_id = scheduler.job_states(&ids).await?;

        let mut states = BTreeMap::new();
        for (name, id) in &self.jobs {
            match by_id.remove(id) {
                Some(info) => {
                    states.insert(name.clone(), info);
                }
                None => warn!(job = %name, job_id = %id, "scheduler has no record of job"),
            }
        }
        Ok(states)
    }

    /// Chart of the recorded graph: jobs colored by their scheduler state,
    /// jobs that were not part of this run marked `norun`.
    pub fn status_chart(&self, states: &BTreeMap<JobName, JobInfo>) -> String {
        let nodes: BTreeMap<JobName, NodeClass> = self
            .config
            .names()
            .filter_map(|name| {
                let class = if !self.jobs.contains_key(name) {
                    Some(NodeClass::NoRun)
                } else {
                    states.get(name).and_then(|info| NodeClass::from_state(info.state))
                };
                class.map(|c| (name.to_string(), c))
            })
            .collect();
        flowchart(&nodes, &self.config.links())
    }

    /// Cancel and resubmit every job that did not complete.
    ///
    /// `confirm` is shown the jobs about to be resubmitted and decides
    /// whether to go ahead. The resubmission uses the graph stored in this
    /// record, not whatever the graph file says today.
    pub async fn recover<F>(&self, project: &Project, confirm: F, dry_run: bool) -> Result<RecoverOutcome>
    where
        F: FnOnce(&[JobName]) -> Result<bool>,
    {
        let states = self.job_states(project.scheduler()).await?;

        let mut unfinished: Vec<JobName> = Vec::new();
        let mut to_cancel: Vec<JobId> = Vec::new();
        for (name, id) in &self.jobs {
            match states.get(name).map(|info| info.state) {
                Some(JobState::Completed) => continue,
                Some(JobState::Running) => {
                    warn!(job = %name, job_id = %id, "job is still running; it will be cancelled");
                }
                _ => {}
            }
            unfinished.push(name.clone());
            to_cancel.push(*id);
        }

        if unfinished.is_empty() {
            info!("every job completed; nothing to recover");
            return Ok(RecoverOutcome::NothingToRecover);
        }

        if !confirm(&unfinished)? {
            info!("recovery declined");
            return Ok(RecoverOutcome::Declined);
        }

        if dry_run {
            info!(jobs = ?to_cancel, "dry run; not cancelling");
        } else {
            project.scheduler().cancel(&to_cancel).await?;
        }

        let reruns = unfinished.join(";");
        let result = project
            .with_graph(self.config.clone())
            .run(&reruns, false, dry_run)
            .await?;

        Ok(RecoverOutcome::Resubmitted {
            jobs: unfinished,
            result,
        })
    }
}

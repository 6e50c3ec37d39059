// src/graph/closure.rs

//! Which jobs must be (re)submitted for a rerun request.

use std::collections::HashSet;

use tracing::debug;

use crate::errors::{JobHelperError, Result};
use crate::graph::model::{JobConfig, ProjectConfig};
use crate::types::{JobName, START};

/// Ordered set of jobs selected for submission.
///
/// Order is insertion order: explicitly requested jobs first, then jobs
/// pulled in by the closure in discovery order. The submission engine
/// re-derives a dependency-safe order, so this only seeds the traversal.
#[derive(Debug, Clone, Default)]
pub struct JobsToRun {
    entries: Vec<(JobName, JobConfig)>,
}

impl JobsToRun {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Remove a pending job by name, handing ownership to the caller.
    pub fn take(&mut self, name: &str) -> Option<(JobName, JobConfig)> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx))
    }

    /// Remove the most recently inserted job.
    pub fn pop(&mut self) -> Option<(JobName, JobConfig)> {
        self.entries.pop()
    }

    fn push(&mut self, name: JobName, job: JobConfig) {
        self.entries.push((name, job));
    }
}

/// Split a `;`-separated job list, ignoring blank entries.
pub fn parse_joblist(joblist: &str) -> Vec<&str> {
    joblist
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

impl ProjectConfig {
    /// Compute the jobs to submit for a rerun request.
    ///
    /// - `joblist`: `;`-separated names to force; `START` stands for the
    ///   synthetic root.
    /// - `run_following`: also pull in every job that depends, directly or
    ///   transitively and through any dependency kind, on a selected job.
    ///
    /// A listed name that is neither `START` nor a job in the graph is an
    /// error.
    pub fn jobs_to_run(&self, joblist: &str, run_following: bool) -> Result<JobsToRun> {
        let mut remaining = self.jobs().clone();
        let mut selected: HashSet<JobName> = HashSet::new();
        let mut to_run = JobsToRun::default();

        for name in parse_joblist(joblist) {
            if !selected.insert(name.to_string()) {
                continue;
            }
            match remaining.remove(name) {
                Some(job) => to_run.push(name.to_string(), job),
                None if name == START => {}
                None => return Err(JobHelperError::JobNotFound(name.to_string())),
            }
        }

        if !run_following {
            return Ok(to_run);
        }

        // Fixpoint: move the first remaining job that references anything
        // already selected, then rescan from the start.
        loop {
            let next = remaining
                .iter()
                .find(|(_, job)| {
                    job.dependency
                        .names_referenced()
                        .any(|dep| selected.contains(dep))
                })
                .map(|(name, _)| name.clone());

            let Some(name) = next else { break };
            if let Some(job) = remaining.remove(&name) {
                debug!(job = %name, "pulled into run by dependency closure");
                selected.insert(name.clone());
                to_run.push(name, job);
            }
        }

        Ok(to_run)
    }
}

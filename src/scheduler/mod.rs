// src/scheduler/mod.rs

//! Pluggable batch-scheduler abstraction.
//!
//! The submission engine talks to a [`SchedulerBackend`] instead of calling
//! `sbatch` directly, so graph logic stays independent of any one batch
//! system's syntax and tests can swap in a fake.
//!
//! - [`slurm`] holds the production Slurm implementation.

pub mod slurm;

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;
use crate::graph::DependencySpec;
use crate::types::{JobHandle, JobId, JobInfo};

pub use slurm::SlurmScheduler;

/// Boxed future returned by backend methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Everything a backend needs to submit one job.
#[derive(Debug, Clone, Copy)]
pub struct SubmitRequest<'a> {
    pub job_name: &'a str,
    /// Rendered command text of the job.
    pub script: &'a str,
    /// Dependencies already resolved to job ids (or names in dry-run).
    pub dependency: &'a DependencySpec,
    /// Extra scheduler options from the job's `slurm_config`.
    pub options: &'a BTreeMap<String, String>,
    pub dry_run: bool,
}

/// Trait abstracting the external batch scheduler.
///
/// Production code uses [`SlurmScheduler`]; tests provide their own
/// implementation that records submissions instead of running `sbatch`.
pub trait SchedulerBackend: Send + Sync {
    /// Submit one job and return its handle.
    ///
    /// In dry-run mode implementations print the job and return
    /// [`JobHandle::DryRun`]. Any error is fatal to the whole run.
    fn submit<'a>(&'a self, request: SubmitRequest<'a>) -> BoxFuture<'a, Result<JobHandle>>;

    /// Symbolic job names a raw dependency spec refers to, in the shape the
    /// graph traversal understands.
    fn names_in(&self, dependency: &DependencySpec) -> DependencySpec {
        dependency.clone()
    }

    /// Current accounting records for the given ids.
    ///
    /// Ids the scheduler knows nothing about are simply missing from the map.
    fn job_states<'a>(&'a self, ids: &'a [JobId]) -> BoxFuture<'a, Result<BTreeMap<JobId, JobInfo>>>;

    /// Cancel the given jobs.
    fn cancel<'a>(&'a self, ids: &'a [JobId]) -> BoxFuture<'a, Result<()>>;
}

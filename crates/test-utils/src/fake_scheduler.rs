use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use jobhelper::errors::{JobHelperError, Result};
use jobhelper::graph::DependencySpec;
use jobhelper::scheduler::{BoxFuture, SchedulerBackend, SubmitRequest};
use jobhelper::types::{JobHandle, JobId, JobInfo, JobState};

/// One `submit` call as the fake saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub job_name: String,
    pub script: String,
    pub dependency: DependencySpec,
    pub options: BTreeMap<String, String>,
    pub dry_run: bool,
    pub handle: JobHandle,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    submissions: Vec<Submission>,
    states: BTreeMap<JobId, JobInfo>,
    cancelled: Vec<JobId>,
    fail_on: Option<String>,
}

/// A fake scheduler that:
/// - records every submission
/// - hands out increasing ids starting at the configured first id
/// - reports whatever states the test set, PENDING otherwise
/// - records cancellations.
#[derive(Debug, Clone)]
pub struct FakeScheduler {
    inner: Arc<Mutex<Inner>>,
}

impl Default for FakeScheduler {
    fn default() -> Self {
        Self::starting_at(1000)
    }
}

impl FakeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(first_id: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                next_id: first_id,
                ..Inner::default()
            })),
        }
    }

    /// Make `submit` fail for this job name.
    pub fn fail_on(&self, job_name: &str) {
        self.inner.lock().unwrap().fail_on = Some(job_name.to_string());
    }

    pub fn set_state(&self, id: JobId, state: JobState) {
        self.inner.lock().unwrap().states.insert(
            id,
            JobInfo {
                state,
                start: None,
                end: None,
            },
        );
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.inner.lock().unwrap().submissions.clone()
    }

    /// Submitted job names, in submission order.
    pub fn submitted_names(&self) -> Vec<String> {
        self.submissions().into_iter().map(|s| s.job_name).collect()
    }

    pub fn submission(&self, job_name: &str) -> Option<Submission> {
        self.submissions().into_iter().find(|s| s.job_name == job_name)
    }

    pub fn cancelled(&self) -> Vec<JobId> {
        self.inner.lock().unwrap().cancelled.clone()
    }
}

impl SchedulerBackend for FakeScheduler {
    fn submit<'a>(&'a self, request: SubmitRequest<'a>) -> BoxFuture<'a, Result<JobHandle>> {
        Box::pin(async move {
            let mut inner = self.inner.lock().unwrap();

            if inner.fail_on.as_deref() == Some(request.job_name) {
                return Err(JobHelperError::Submission {
                    job: request.job_name.to_string(),
                    message: "sbatch: error: invalid partition".to_string(),
                });
            }

            let handle = if request.dry_run {
                JobHandle::DryRun
            } else {
                let id = JobId(inner.next_id);
                inner.next_id += 1;
                JobHandle::Id(id)
            };

            inner.submissions.push(Submission {
                job_name: request.job_name.to_string(),
                script: request.script.to_string(),
                dependency: request.dependency.clone(),
                options: request.options.clone(),
                dry_run: request.dry_run,
                handle,
            });
            Ok(handle)
        })
    }

    fn job_states<'a>(&'a self, ids: &'a [JobId]) -> BoxFuture<'a, Result<BTreeMap<JobId, JobInfo>>> {
        Box::pin(async move {
            let inner = self.inner.lock().unwrap();
            Ok(ids
                .iter()
                .map(|id| {
                    let info = inner.states.get(id).cloned().unwrap_or(JobInfo {
                        state: JobState::Pending,
                        start: None,
                        end: None,
                    });
                    (*id, info)
                })
                .collect())
        })
    }

    fn cancel<'a>(&'a self, ids: &'a [JobId]) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.inner.lock().unwrap().cancelled.extend_from_slice(ids);
            Ok(())
        })
    }
}

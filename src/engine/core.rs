// src/engine/core.rs

use tracing::trace;

use crate::graph::{DependencySpec, JobConfig, JobsToRun};
use crate::types::JobName;

/// Order in which the selected jobs must be submitted.
///
/// Depth-first over an explicit stack: the stack is seeded with the last
/// pending job; while the job on top still has a dependency (in bucket
/// order) among the pending jobs, that dependency is moved onto the stack.
/// A job with nothing pending is popped and emitted. Repeats until both the
/// stack and the pending set are empty.
///
/// `names_in` maps a job's dependency spec to the job names it refers to;
/// normally [`SchedulerBackend::names_in`](crate::scheduler::SchedulerBackend::names_in).
///
/// Every dependency that is itself selected comes out before its dependents,
/// and each job comes out exactly once.
pub fn submission_order<F>(mut pending: JobsToRun, names_in: F) -> Vec<(JobName, JobConfig)>
where
    F: Fn(&DependencySpec) -> DependencySpec,
{
    let mut order = Vec::with_capacity(pending.len());
    let mut stack: Vec<(JobName, JobConfig)> = Vec::new();

    while let Some(seed) = pending.pop() {
        stack.push(seed);

        while let Some((name, job)) = stack.last() {
            let deps = names_in(&job.dependency);
            let next = deps
                .names_referenced()
                .find(|dep| pending.contains(dep))
                .map(str::to_string);

            match next.and_then(|dep| pending.take(&dep)) {
                Some(entry) => {
                    trace!(job = %name, dependency = %entry.0, "descending into pending dependency");
                    stack.push(entry);
                }
                None => {
                    if let Some(done) = stack.pop() {
                        order.push(done);
                    }
                }
            }
        }
    }

    order
}

// src/engine/project.rs

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::commands::{CommandRegistry, RenderContext};
use crate::config::JhConfig;
use crate::errors::{JobHelperError, Result};
use crate::graph::{render_chart, JobConfig, ProjectConfig};
use crate::repo::RepoWatcher;
use crate::result::RunningResult;
use crate::scheduler::{SchedulerBackend, SlurmScheduler, SubmitRequest};
use crate::types::{JobHandle, JobId, JobName};

use super::core::submission_order;

/// Knobs for a run that come from `[project]`.
#[derive(Debug, Clone)]
pub struct ProjectSettings {
    /// Where running-result records are written.
    pub log_dir: PathBuf,
    /// Pause after every submission.
    pub submit_delay: Duration,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("log/project"),
            submit_delay: Duration::from_millis(200),
        }
    }
}

impl ProjectSettings {
    pub fn from_config(cfg: &JhConfig) -> Self {
        Self {
            log_dir: cfg.project_log_dir(),
            submit_delay: Duration::from_millis(cfg.project.submit_delay_ms),
        }
    }
}

/// A job graph bound to a command registry and a scheduler.
///
/// This is the async shell around the pure ordering in
/// [`submission_order`]: it renders each job, resolves its dependencies
/// against the handles gathered so far and hands it to the scheduler.
#[derive(Clone)]
pub struct Project {
    graph: ProjectConfig,
    registry: CommandRegistry,
    scheduler: Arc<dyn SchedulerBackend>,
    settings: ProjectSettings,
    repo_watcher: RepoWatcher,
}

impl fmt::Debug for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Project")
            .field("jobs", &self.graph.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Project {
    pub fn new(
        graph: ProjectConfig,
        registry: CommandRegistry,
        scheduler: Arc<dyn SchedulerBackend>,
    ) -> Self {
        Self {
            graph,
            registry,
            scheduler,
            settings: ProjectSettings::default(),
            repo_watcher: RepoWatcher::default(),
        }
    }

    /// Production wiring: Slurm backend, commands and settings from `cfg`.
    pub fn from_config(cfg: &JhConfig, graph: ProjectConfig) -> Result<Self> {
        let registry = CommandRegistry::from_config(cfg)?;
        let scheduler = Arc::new(SlurmScheduler::from_config(cfg)?);
        Ok(Self::new(graph, registry, scheduler)
            .with_settings(ProjectSettings::from_config(cfg))
            .with_repo_watcher(RepoWatcher::from_config(cfg)))
    }

    pub fn with_settings(mut self, settings: ProjectSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_repo_watcher(mut self, watcher: RepoWatcher) -> Self {
        self.repo_watcher = watcher;
        self
    }

    /// Same wiring, different job graph.
    pub fn with_graph(&self, graph: ProjectConfig) -> Self {
        Self {
            graph,
            ..self.clone()
        }
    }

    pub fn graph(&self) -> &ProjectConfig {
        &self.graph
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn scheduler(&self) -> &dyn SchedulerBackend {
        self.scheduler.as_ref()
    }

    pub fn settings(&self) -> &ProjectSettings {
        &self.settings
    }

    /// Submit `reruns` (`;`-separated) and, with `run_following`, every job
    /// downstream of them.
    ///
    /// Returns the path of the saved [`RunningResult`], or `None` for a dry
    /// run or when nothing was submitted.
    pub async fn run(&self, reruns: &str, run_following: bool, dry_run: bool) -> Result<Option<PathBuf>> {
        let to_run = self.graph.jobs_to_run(reruns, run_following)?;
        info!(
            jobs = ?to_run.names().collect::<Vec<_>>(),
            dry_run,
            "jobs selected for submission"
        );

        let order = submission_order(to_run, |dep| self.scheduler.names_in(dep));
        if order.is_empty() {
            warn!(reruns = %reruns, "no jobs to submit");
            return Ok(None);
        }

        let repo_states = if dry_run {
            Vec::new()
        } else {
            self.repo_watcher.repo_states()?
        };

        let ctx = RenderContext {
            graph: &self.graph,
            registry: &self.registry,
        };
        let mut handles: HashMap<JobName, JobHandle> = HashMap::new();
        let mut submitted: BTreeMap<JobName, JobId> = BTreeMap::new();
        let mut first_id: Option<JobId> = None;

        for (name, job) in order {
            let script = render_job(&ctx, &name, &job)?;
            let dependency = job.dependency.resolve_to_handles(&handles, dry_run);
            let options = job.scheduler_options();

            debug!(job = %name, ?dependency, "submitting job");
            let handle = self
                .scheduler
                .submit(SubmitRequest {
                    job_name: &name,
                    script: &script,
                    dependency: &dependency,
                    options: &options,
                    dry_run,
                })
                .await
                .map_err(|e| match e {
                    JobHelperError::Submission { .. } => e,
                    other => JobHelperError::Submission {
                        job: name.clone(),
                        message: other.to_string(),
                    },
                })?;

            if let Some(id) = handle.job_id() {
                first_id.get_or_insert(id);
                submitted.insert(name.clone(), id);
            }
            handles.insert(name, handle);

            if !self.settings.submit_delay.is_zero() {
                tokio::time::sleep(self.settings.submit_delay).await;
            }
        }

        if dry_run {
            info!(jobs = handles.len(), "dry run finished; nothing recorded");
            return Ok(None);
        }
        let Some(first_id) = first_id else {
            warn!("scheduler returned no job ids; nothing recorded");
            return Ok(None);
        };

        let result = RunningResult::new(self.graph.clone(), submitted, repo_states);
        let path = result.save(&self.settings.log_dir, first_id)?;
        info!(path = ?path, jobs = result.jobs.len(), "saved running result");
        Ok(Some(path))
    }

    /// Draw the graph as a Mermaid flowchart, greying out jobs a run with
    /// these arguments would not submit.
    ///
    /// `output` is `-` (stdout), a `.html` page or a `.mmd` file.
    pub fn jobflow(&self, reruns: &str, run_following: bool, output: &str) -> Result<()> {
        let chart = self.graph.jobflow_chart(reruns, run_following)?;
        render_chart(&chart, output)
    }
}

fn render_job(ctx: &RenderContext<'_>, name: &str, job: &JobConfig) -> Result<String> {
    ctx.registry
        .resolve(&job.command)
        .and_then(|runnable| runnable.materialize(&job.config))
        .and_then(|instance| instance.render(ctx))
        .map_err(|e| JobHelperError::Render {
            job: name.to_string(),
            message: e.to_string(),
        })
}

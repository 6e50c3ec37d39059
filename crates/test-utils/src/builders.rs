#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use jobhelper::commands::CommandRegistry;
use jobhelper::engine::{Project, ProjectSettings};
use jobhelper::graph::{ConfigPayload, DependencyKind, JobConfig, ProjectConfig, RawProjectConfig};

use crate::fake_scheduler::FakeScheduler;

/// Builder for `ProjectConfig` to simplify test setup.
pub struct ProjectConfigBuilder {
    config: RawProjectConfig,
}

impl ProjectConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RawProjectConfig::default(),
        }
    }

    pub fn with_job(mut self, name: &str, job: JobConfigBuilder) -> Self {
        self.config.jobs.insert(name.to_string(), job.build());
        self
    }

    pub fn raw(self) -> RawProjectConfig {
        self.config
    }

    pub fn build(self) -> ProjectConfig {
        ProjectConfig::try_from(self.config).expect("Failed to build valid project from builder")
    }
}

impl Default for ProjectConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobConfig`.
pub struct JobConfigBuilder {
    job: JobConfig,
}

impl JobConfigBuilder {
    /// A `shell` job running `sh`.
    pub fn shell(sh: &str) -> Self {
        Self::command("shell", json!({ "sh": sh }))
    }

    /// A job of any command; `config` must be a JSON object.
    pub fn command(command: &str, config: Value) -> Self {
        let payload: ConfigPayload = match config {
            Value::Object(map) => map,
            other => panic!("job config must be an object, got {other}"),
        };
        Self {
            job: JobConfig::new(command, payload),
        }
    }

    pub fn dep(mut self, kind: DependencyKind, name: &str) -> Self {
        self.job.dependency.bucket_mut(kind).push(name.to_string());
        self
    }

    pub fn after_ok(self, name: &str) -> Self {
        self.dep(DependencyKind::AfterOk, name)
    }

    pub fn after_start(self) -> Self {
        self.after_ok("START")
    }

    pub fn slurm(mut self, key: &str, value: Value) -> Self {
        self.job.slurm_config.insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> JobConfig {
        self.job
    }
}

/// A project wired to a fresh `FakeScheduler`, with no submit delay and
/// results written under `log_dir`.
pub fn fake_project(graph: ProjectConfig, log_dir: &Path) -> (Project, FakeScheduler) {
    fake_project_with(graph, CommandRegistry::new(), log_dir)
}

pub fn fake_project_with(
    graph: ProjectConfig,
    registry: CommandRegistry,
    log_dir: &Path,
) -> (Project, FakeScheduler) {
    let scheduler = FakeScheduler::new();
    let project = Project::new(graph, registry, Arc::new(scheduler.clone())).with_settings(
        ProjectSettings {
            log_dir: log_dir.to_path_buf(),
            submit_delay: Duration::ZERO,
        },
    );
    (project, scheduler)
}

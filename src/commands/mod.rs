// src/commands/mod.rs

//! Command registry: maps a job's `command` string to something that can
//! turn its config payload into a script.
//!
//! - [`shell`]: the built-in `shell` command (`{sh: "..."}`).
//! - [`combo`]: the built-in `job_combo` command, which concatenates the
//!   scripts of several sub-jobs.
//! - [`template`]: user commands declared in `jh_config.toml`.
//!
//! Library users can plug in their own commands with
//! [`CommandRegistry::register`].

pub mod combo;
pub mod shell;
pub mod template;

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use tracing::debug;

use crate::config::JhConfig;
use crate::errors::{JobHelperError, Result};
use crate::graph::{ConfigPayload, ProjectConfig};
use crate::types::JobName;

pub use combo::{ComboItem, JobCombo};
pub use shell::ShellCommand;
pub use template::TemplateCommand;

pub const SHELL: &str = "shell";
pub const JOB_COMBO: &str = "job_combo";

/// Built-in command names that user configuration may not redefine.
pub const RESERVED_COMMANDS: [&str; 2] = [SHELL, JOB_COMBO];

/// A user-defined command.
///
/// Implementations validate the payload and produce a [`JobInstance`],
/// usually [`JobInstance::User`].
pub trait UserCommand: Send + Sync + Debug {
    fn materialize(&self, config: &ConfigPayload) -> Result<JobInstance>;
}

/// What a command name resolves to.
#[derive(Debug, Clone)]
pub enum Runnable {
    Shell,
    JobCombo,
    User(Arc<dyn UserCommand>),
}

impl Runnable {
    /// Build a job instance from a job's config payload.
    pub fn materialize(&self, config: &ConfigPayload) -> Result<JobInstance> {
        match self {
            Runnable::Shell => ShellCommand::from_payload(config).map(JobInstance::Shell),
            Runnable::JobCombo => JobCombo::from_payload(config).map(JobInstance::JobCombo),
            Runnable::User(cmd) => cmd.materialize(config),
        }
    }
}

/// Script produced by a user command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserJob {
    pub run_cmd: String,
}

/// A materialized job, ready to be rendered to script text.
#[derive(Debug, Clone)]
pub enum JobInstance {
    Shell(ShellCommand),
    JobCombo(JobCombo),
    User(UserJob),
}

/// Everything a job needs to render itself.
///
/// `job_combo` looks sub-jobs up in `graph` and resolves their commands
/// through `registry`.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub graph: &'a ProjectConfig,
    pub registry: &'a CommandRegistry,
}

impl JobInstance {
    pub fn render(&self, ctx: &RenderContext<'_>) -> Result<String> {
        self.render_nested(ctx, &mut Vec::new())
    }

    /// `visiting` holds the named combo members currently being expanded.
    pub(crate) fn render_nested(
        &self,
        ctx: &RenderContext<'_>,
        visiting: &mut Vec<JobName>,
    ) -> Result<String> {
        match self {
            JobInstance::Shell(sh) => Ok(sh.sh.clone()),
            JobInstance::JobCombo(combo) => combo.render(ctx, visiting),
            JobInstance::User(job) => Ok(job.run_cmd.clone()),
        }
    }
}

/// Explicit name -> command map.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    user: BTreeMap<String, Arc<dyn UserCommand>>,
}

impl CommandRegistry {
    /// Registry with only the built-ins.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every `[commands.<name>]` from the tool config.
    pub fn from_config(cfg: &JhConfig) -> Result<Self> {
        let mut registry = Self::new();
        for (name, section) in cfg.commands.iter() {
            let cmd = TemplateCommand::new(&section.run)?;
            registry.register(name, Arc::new(cmd))?;
        }
        Ok(registry)
    }

    /// Add a user command. `shell` and `job_combo` can not be replaced.
    pub fn register(&mut self, name: impl Into<String>, cmd: Arc<dyn UserCommand>) -> Result<()> {
        let name = name.into();
        if RESERVED_COMMANDS.contains(&name.as_str()) {
            return Err(JobHelperError::ReservedName(name));
        }
        debug!(command = %name, "registered user command");
        self.user.insert(name, cmd);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<Runnable> {
        match name {
            SHELL => Ok(Runnable::Shell),
            JOB_COMBO => Ok(Runnable::JobCombo),
            other => self
                .user
                .get(other)
                .cloned()
                .map(Runnable::User)
                .ok_or_else(|| JobHelperError::Config(format!("unknown command '{other}'"))),
        }
    }

    /// All command names, built-ins first.
    pub fn names(&self) -> Vec<&str> {
        RESERVED_COMMANDS
            .iter()
            .copied()
            .chain(self.user.keys().map(String::as_str))
            .collect()
    }
}

/// Deserialize a command payload into its typed form.
pub(crate) fn parse_payload<T: serde::de::DeserializeOwned>(
    command: &str,
    config: &ConfigPayload,
) -> Result<T> {
    serde_json::from_value(serde_json::Value::Object(config.clone())).map_err(|e| {
        JobHelperError::Config(format!("invalid config for command '{command}': {e}"))
    })
}

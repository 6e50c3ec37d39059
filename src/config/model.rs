// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Tool configuration as read from `jh_config.toml`.
///
/// ```toml
/// [project]
/// log_dir = "log/project"
/// submit_delay_ms = 200
///
/// [slurm]
/// shell = "/bin/bash"
/// sbatch_cmd = "sbatch"
///
/// [repo_watcher]
/// watched_repos = ["."]
///
/// [commands.train]
/// run = "python train.py --lr {lr}"
/// ```
///
/// All sections are optional and have reasonable defaults. Relative paths
/// are resolved against the directory holding the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JhConfig {
    #[serde(default)]
    pub project: ProjectSection,

    #[serde(default)]
    pub slurm: SlurmSection,

    #[serde(default)]
    pub repo_watcher: RepoWatcherSection,

    /// User commands from `[commands.<name>]`.
    #[serde(default)]
    pub commands: BTreeMap<String, CommandSection>,

    /// Directory relative paths are resolved against.
    #[serde(skip)]
    pub root_dir: PathBuf,
}

impl JhConfig {
    /// Resolve a configured path against the config file's directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_dir.join(path)
        }
    }

    /// Where running-result records are written.
    pub fn project_log_dir(&self) -> PathBuf {
        self.resolve_path(&self.project.log_dir)
    }

    /// Where Slurm output and submitted scripts go.
    pub fn job_log_dir(&self) -> PathBuf {
        self.resolve_path(&self.slurm.log_dir)
    }
}

/// `[project]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSection {
    #[serde(default = "default_project_log_dir")]
    pub log_dir: PathBuf,

    /// Pause between two submissions, in milliseconds.
    #[serde(default = "default_submit_delay_ms")]
    pub submit_delay_ms: u64,
}

fn default_project_log_dir() -> PathBuf {
    PathBuf::from("log/project")
}

fn default_submit_delay_ms() -> u64 {
    200
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            log_dir: default_project_log_dir(),
            submit_delay_ms: default_submit_delay_ms(),
        }
    }
}

/// `[slurm]` section: how to talk to the batch system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlurmSection {
    /// Interpreter written into the script's shebang line.
    #[serde(default = "default_shell")]
    pub shell: String,

    #[serde(default = "default_sbatch_cmd")]
    pub sbatch_cmd: String,

    #[serde(default = "default_sacct_cmd")]
    pub sacct_cmd: String,

    #[serde(default = "default_scancel_cmd")]
    pub scancel_cmd: String,

    /// Job output (`%j.out`) and saved submission scripts.
    #[serde(default = "default_job_log_dir")]
    pub log_dir: PathBuf,
}

fn default_shell() -> String {
    "/bin/sh".to_string()
}

fn default_sbatch_cmd() -> String {
    "sbatch".to_string()
}

fn default_sacct_cmd() -> String {
    "sacct".to_string()
}

fn default_scancel_cmd() -> String {
    "scancel".to_string()
}

fn default_job_log_dir() -> PathBuf {
    PathBuf::from("log/jobs")
}

impl Default for SlurmSection {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            sbatch_cmd: default_sbatch_cmd(),
            sacct_cmd: default_sacct_cmd(),
            scancel_cmd: default_scancel_cmd(),
            log_dir: default_job_log_dir(),
        }
    }
}

/// `[repo_watcher]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoWatcherSection {
    /// Repositories that must be clean before a real run.
    #[serde(default)]
    pub force_commit_repos: Vec<PathBuf>,

    /// Repositories whose state is recorded as-is.
    #[serde(default)]
    pub watched_repos: Vec<PathBuf>,
}

/// `[commands.<name>]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandSection {
    /// Command template; `{key}` is replaced by the job config's `key`.
    pub run: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

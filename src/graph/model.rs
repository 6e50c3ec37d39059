// src/graph/model.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::graph::dependency::DependencySpec;
use crate::types::JobName;

/// Opaque key-value payload forwarded verbatim to a job's command.
pub type ConfigPayload = serde_json::Map<String, serde_json::Value>;

/// Job graph as read from a YAML / TOML / JSON file.
///
/// ```yaml
/// jobs:
///   prepare:
///     command: shell
///     config: { sh: "python prepare.py" }
///     dependency: [START]
///   train:
///     command: train
///     config: { lr: 0.01 }
///     dependency:
///       afterok: [prepare]
///     slurm_config: { partition: gpu }
/// ```
///
/// This is the unvalidated form; use [`ProjectConfig`] (via `TryFrom`) for
/// anything that drives submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProjectConfig {
    #[serde(default)]
    pub jobs: BTreeMap<JobName, JobConfig>,
}

/// Validated job graph.
///
/// Guarantees that no job is named `START` and that the dependency edges
/// between known jobs are acyclic. Dangling references are allowed (and
/// warned about during validation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawProjectConfig")]
pub struct ProjectConfig {
    jobs: BTreeMap<JobName, JobConfig>,
}

impl ProjectConfig {
    /// Internal constructor used after validation.
    pub(crate) fn new_unchecked(jobs: BTreeMap<JobName, JobConfig>) -> Self {
        Self { jobs }
    }

    pub fn jobs(&self) -> &BTreeMap<JobName, JobConfig> {
        &self.jobs
    }

    pub fn get(&self, name: &str) -> Option<&JobConfig> {
        self.jobs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.jobs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.jobs.keys().map(String::as_str)
    }
}

/// One `jobs.<name>` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Key into the command registry (`shell`, `job_combo`, or a user command).
    pub command: String,

    /// Payload handed to the command when it is materialized.
    #[serde(default)]
    pub config: ConfigPayload,

    #[serde(default, skip_serializing_if = "DependencySpec::is_empty")]
    pub dependency: DependencySpec,

    /// Extra scheduler options, e.g. `partition = "gpu"`.
    ///
    /// Rendered as `#SBATCH --<key> <value>` lines by the Slurm backend.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub slurm_config: BTreeMap<String, serde_json::Value>,
}

impl JobConfig {
    pub fn new(command: impl Into<String>, config: ConfigPayload) -> Self {
        Self {
            command: command.into(),
            config,
            dependency: DependencySpec::default(),
            slurm_config: BTreeMap::new(),
        }
    }

    /// Scheduler options as plain strings, with `null` values dropped.
    pub fn scheduler_options(&self) -> BTreeMap<String, String> {
        self.slurm_config
            .iter()
            .filter_map(|(k, v)| scalar_to_string(v).map(|s| (k.replace('_', "-"), s)))
            .collect()
    }
}

/// Render a JSON scalar the way it would be typed on a command line.
pub(crate) fn scalar_to_string(v: &serde_json::Value) -> Option<String> {
    match v {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// src/graph/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::warn;

use crate::errors::{JobHelperError, Result};
use crate::graph::dependency::DependencySpec;
use crate::graph::model::{ProjectConfig, RawProjectConfig};
use crate::types::START;

impl TryFrom<RawProjectConfig> for ProjectConfig {
    type Error = JobHelperError;

    fn try_from(mut raw: RawProjectConfig) -> std::result::Result<Self, Self::Error> {
        normalize_slurm_config(&mut raw)?;
        validate_raw_project(&raw)?;
        Ok(ProjectConfig::new_unchecked(raw.jobs))
    }
}

/// Move `slurm_config.dependency` (the older place for it) into
/// `dependency`, and reject scheduler options the backend owns or can not
/// put on one `#SBATCH` line.
pub fn normalize_slurm_config(raw: &mut RawProjectConfig) -> Result<()> {
    for (name, job) in raw.jobs.iter_mut() {
        if let Some(nested) = job.slurm_config.remove("dependency") {
            let spec: DependencySpec = serde_json::from_value(nested).map_err(|e| {
                JobHelperError::Config(format!(
                    "job '{name}': invalid slurm_config.dependency: {e}"
                ))
            })?;
            if !spec.is_empty() {
                if !job.dependency.is_empty() {
                    return Err(JobHelperError::Config(format!(
                        "job '{name}' sets both dependency and slurm_config.dependency"
                    )));
                }
                job.dependency = spec;
            }
        }

        for (key, value) in &job.slurm_config {
            if key.replace('_', "-") == "job-name" {
                return Err(JobHelperError::Config(format!(
                    "job '{name}': slurm_config.{key} is set from the job name"
                )));
            }
            if value.is_array() || value.is_object() {
                return Err(JobHelperError::Config(format!(
                    "job '{name}': slurm_config.{key} must be a string, number or boolean"
                )));
            }
        }
    }
    Ok(())
}

/// Semantic checks on a freshly parsed job graph.
///
/// - no job may be called `START`
/// - dependencies on unknown jobs are warned about, not rejected
/// - the graph formed by known jobs must be acyclic (self-loops included)
pub fn validate_raw_project(cfg: &RawProjectConfig) -> Result<()> {
    ensure_no_reserved_job(cfg)?;
    warn_dangling_dependencies(cfg);
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_no_reserved_job(cfg: &RawProjectConfig) -> Result<()> {
    if cfg.jobs.contains_key(START) {
        return Err(JobHelperError::ReservedName(format!(
            "{START} (job name)"
        )));
    }
    Ok(())
}

fn warn_dangling_dependencies(cfg: &RawProjectConfig) {
    for (name, job) in cfg.jobs.iter() {
        for dep in job.dependency.names_referenced() {
            if dep != START && !cfg.jobs.contains_key(dep) {
                warn!(job = %name, dep = %dep, "dependency refers to a job that is not in the graph");
            }
        }
    }
}

fn validate_dag(cfg: &RawProjectConfig) -> Result<()> {
    // Edge direction: dep -> job.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.jobs.keys() {
        graph.add_node(name.as_str());
    }

    for (name, job) in cfg.jobs.iter() {
        for dep in job.dependency.names_referenced() {
            if cfg.jobs.contains_key(dep) {
                graph.add_edge(dep, name.as_str(), ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(JobHelperError::DagCycle(format!(
            "cycle detected in job graph involving job '{}'",
            cycle.node_id()
        ))),
    }
}

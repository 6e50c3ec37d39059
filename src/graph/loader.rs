// src/graph/loader.rs

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{JobHelperError, Result};
use crate::graph::model::{ProjectConfig, RawProjectConfig};

/// Serialization format of a job-graph file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Yaml,
    Toml,
    Json,
}

impl GraphFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Ok(GraphFormat::Yaml),
            "toml" => Ok(GraphFormat::Toml),
            "json" => Ok(GraphFormat::Json),
            _ => Err(JobHelperError::Config(format!(
                "unsupported job graph file {:?} (expected .yaml, .yml, .toml or .json)",
                path
            ))),
        }
    }
}

/// Parse job-graph text without validating it.
pub fn parse_raw(content: &str, format: GraphFormat, origin: &Path) -> Result<RawProjectConfig> {
    let parsed = match format {
        GraphFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        GraphFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        GraphFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|message| JobHelperError::Parse {
        path: origin.to_path_buf(),
        message,
    })
}

/// Read one job-graph file without validating it.
pub fn load_raw(path: impl AsRef<Path>) -> Result<RawProjectConfig> {
    let path = path.as_ref();
    let format = GraphFormat::from_path(path)?;
    let contents = fs::read_to_string(path)?;
    parse_raw(&contents, format, path)
}

/// Load and validate a single job-graph file.
pub fn load_project(path: impl AsRef<Path>) -> Result<ProjectConfig> {
    let raw = load_raw(path)?;
    ProjectConfig::try_from(raw)
}

/// Load several job-graph files and merge them into one graph.
///
/// Job names must be disjoint across files; a collision is reported with the
/// job name and both files. Validation runs on the merged graph, so
/// dependencies may cross file boundaries.
pub fn load_projects<P: AsRef<Path>>(paths: &[P]) -> Result<ProjectConfig> {
    if paths.is_empty() {
        return Err(JobHelperError::Config(
            "at least one job graph file is required".to_string(),
        ));
    }

    let mut merged = RawProjectConfig::default();
    let mut origin: BTreeMap<String, PathBuf> = BTreeMap::new();

    for path in paths {
        let path = path.as_ref();
        let raw = load_raw(path)?;
        debug!(file = ?path, jobs = raw.jobs.len(), "loaded job graph file");

        for (name, job) in raw.jobs {
            if let Some(first) = origin.get(&name) {
                return Err(JobHelperError::MergeConflict {
                    job: name,
                    first: first.clone(),
                    second: path.to_path_buf(),
                });
            }
            origin.insert(name.clone(), path.to_path_buf());
            merged.jobs.insert(name, job);
        }
    }

    ProjectConfig::try_from(merged)
}

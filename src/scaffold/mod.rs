// src/scaffold/mod.rs

//! `jh init`: a starter `jh_config.toml` and job graph.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::loader::CONFIG_FILE_NAME;
use crate::config::{CommandSection, JhConfig};
use crate::errors::{JobHelperError, Result};

pub const EXAMPLE_GRAPH_FILE: &str = "project.yaml";

const EXAMPLE_GRAPH: &str = r#"# Submit with: jh run project.yaml --no-dry-run
jobs:
  prepare:
    command: shell
    config:
      sh: echo preparing
    dependency: [START]
  add_one:
    command: add_one
    config:
      n: 1
    dependency:
      afterok: [prepare]
    slurm_config:
      time: "00:05:00"
  report:
    command: shell
    config:
      sh: echo done
    dependency:
      afterany: [add_one]
"#;

/// The configuration `jh init` writes: defaults, the current repository
/// watched, and one example command.
pub fn starter_config() -> JhConfig {
    let mut cfg = JhConfig::default();
    cfg.repo_watcher.watched_repos = vec![PathBuf::from(".")];
    cfg.commands.insert(
        "add_one".to_string(),
        CommandSection {
            run: "echo $(( {n} + 1 ))".to_string(),
            description: Some("print n + 1".to_string()),
        },
    );
    cfg
}

/// Write `jh_config.toml` and `project.yaml` into `dir`.
///
/// Existing files are only replaced with `force`. Returns the written paths.
pub fn init_project(dir: &Path, force: bool) -> Result<Vec<PathBuf>> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    let graph_path = dir.join(EXAMPLE_GRAPH_FILE);

    if !force {
        if let Some(existing) = [&config_path, &graph_path].into_iter().find(|p| p.exists()) {
            return Err(JobHelperError::Config(format!(
                "{} already exists; use --force to overwrite",
                existing.display()
            )));
        }
    }

    if git2::Repository::discover(dir).is_err() {
        warn!(dir = ?dir, "not inside a git repository; recording code state needs one");
    }

    fs::create_dir_all(dir)?;
    let text = toml::to_string_pretty(&starter_config())
        .map_err(|e| JobHelperError::Config(format!("failed to serialize config: {e}")))?;
    fs::write(&config_path, text)?;
    fs::write(&graph_path, EXAMPLE_GRAPH)?;
    info!(dir = ?dir, "initialized job helper project");

    Ok(vec![config_path, graph_path])
}

// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::JhConfig;
use crate::config::validate::validate_config;
use crate::errors::{JobHelperError, Result};

/// File name looked up when no explicit config path is given.
pub const CONFIG_FILE_NAME: &str = "jh_config.toml";

/// Environment variable pointing at an explicit config file.
pub const CONFIG_ENV_VAR: &str = "JHCFG";

/// Load a configuration file and return it without validation.
///
/// `root_dir` is set to the file's parent directory.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<JhConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let mut config: JhConfig = toml::from_str(&contents).map_err(|e| JobHelperError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    config.root_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir()?,
    };

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<JhConfig> {
    let config = load_from_path(&path)?;
    validate_config(&config)?;
    Ok(config)
}

/// Find the config file to use.
///
/// 1. `$JHCFG` if set.
/// 2. The nearest `jh_config.toml` in the current directory or a parent.
pub fn discover_config_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(p));
    }

    let cwd = std::env::current_dir().ok()?;
    cwd.ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

/// Load the explicit path if given, otherwise discover one; fall back to
/// defaults rooted at the current directory when nothing is found.
pub fn load_or_default(explicit: Option<&Path>) -> Result<JhConfig> {
    let path = explicit.map(Path::to_path_buf).or_else(discover_config_path);

    match path {
        Some(path) => {
            debug!(config = ?path, "loading jh config");
            load_and_validate(path)
        }
        None => {
            debug!("no jh config found; using defaults");
            Ok(JhConfig {
                root_dir: std::env::current_dir()?,
                ..JhConfig::default()
            })
        }
    }
}

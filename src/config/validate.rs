// src/config/validate.rs

use crate::commands::RESERVED_COMMANDS;
use crate::config::model::JhConfig;
use crate::errors::{JobHelperError, Result};

/// Run semantic validation against a loaded configuration.
///
/// This checks:
/// - no user command shadows a built-in (`shell`, `job_combo`)
/// - every user command has a non-empty `run` template
/// - the Slurm executables are not blank
pub fn validate_config(cfg: &JhConfig) -> Result<()> {
    validate_commands(cfg)?;
    validate_slurm(cfg)?;
    Ok(())
}

fn validate_commands(cfg: &JhConfig) -> Result<()> {
    for (name, cmd) in cfg.commands.iter() {
        if RESERVED_COMMANDS.contains(&name.as_str()) {
            return Err(JobHelperError::ReservedName(name.clone()));
        }
        if cmd.run.trim().is_empty() {
            return Err(JobHelperError::Config(format!(
                "[commands.{name}].run must not be empty"
            )));
        }
    }
    Ok(())
}

fn validate_slurm(cfg: &JhConfig) -> Result<()> {
    let fields = [
        ("shell", &cfg.slurm.shell),
        ("sbatch_cmd", &cfg.slurm.sbatch_cmd),
        ("sacct_cmd", &cfg.slurm.sacct_cmd),
        ("scancel_cmd", &cfg.slurm.scancel_cmd),
    ];
    for (key, value) in fields {
        if value.trim().is_empty() {
            return Err(JobHelperError::Config(format!(
                "[slurm].{key} must not be empty"
            )));
        }
    }
    Ok(())
}

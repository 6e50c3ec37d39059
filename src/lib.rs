// src/lib.rs

pub mod archive;
pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod errors;
pub mod graph;
pub mod logging;
pub mod repo;
pub mod result;
pub mod scaffold;
pub mod scheduler;
pub mod types;

use std::path::PathBuf;

use anyhow::{Context, Result};
use dialoguer::Confirm;
use tracing::{debug, info};

use crate::archive::{age_from_hours, compress_logs};

use crate::cli::{CliArgs, Command, RecordArg, Selection};
use crate::config::{load_or_default, JhConfig};
use crate::engine::Project;
use crate::errors::JobHelperError;
use crate::graph::{load_projects, render_chart};
use crate::result::{RecoverOutcome, RunningResult};
use crate::types::{JobId, JobName};

/// High-level entry point used by `main.rs`.
///
/// Loads `jh_config.toml` once and dispatches to the subcommand.
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(args.config.as_deref())?;
    debug!(root = ?cfg.root_dir, "configuration loaded");

    match args.command {
        Command::Run { selection, no_dry_run } => {
            let project = load_project(&cfg, &selection)?;
            let recorded = project
                .run(&selection.reruns, selection.run_following(), !no_dry_run)
                .await?;
            if let Some(path) = recorded {
                info!(path = ?path, "run recorded");
            }
        }
        Command::Jobflow { selection, output } => {
            let project = load_project(&cfg, &selection)?;
            project.jobflow(&selection.reruns, selection.run_following(), &output)?;
        }
        Command::Status { record, chart } => {
            let (path, result) = load_record(&cfg, &record)?;
            let project = Project::from_config(&cfg, result.config.clone())?;
            let states = result.job_states(project.scheduler()).await?;

            println!("{}", path.display());
            println!("{:<24} {:>10}  {:<10} {:<20} {:<20}", "JOB", "ID", "STATE", "START", "END");
            for (name, id) in &result.jobs {
                let (state, start, end) = match states.get(name) {
                    Some(info) => (
                        info.state.to_string(),
                        info.start.map(|t| t.to_string()).unwrap_or_default(),
                        info.end.map(|t| t.to_string()).unwrap_or_default(),
                    ),
                    None => ("UNKNOWN".to_string(), String::new(), String::new()),
                };
                println!("{name:<24} {id:>10}  {state:<10} {start:<20} {end:<20}");
            }

            if let Some(output) = chart {
                render_chart(&result.status_chart(&states), &output)?;
            }
        }
        Command::Recover { record, yes, dry_run } => {
            let (path, result) = load_record(&cfg, &record)?;
            let project = Project::from_config(&cfg, result.config.clone())?;
            info!(record = ?path, "recovering run");

            let outcome = result
                .recover(&project, |jobs| confirm_rerun(jobs, yes), dry_run)
                .await?;
            match outcome {
                RecoverOutcome::NothingToRecover => println!("all jobs completed"),
                RecoverOutcome::Declined => println!("recovery cancelled"),
                RecoverOutcome::Resubmitted { jobs, result } => {
                    println!("resubmitted: {}", jobs.join(", "));
                    if let Some(path) = result {
                        println!("new record: {}", path.display());
                    }
                }
            }
        }
        Command::Results => {
            let dir = cfg.project_log_dir();
            for id in RunningResult::list(&dir)? {
                let path = RunningResult::path_for(&dir, id);
                match RunningResult::load(&path) {
                    Ok(r) => println!(
                        "{id:>10}  {}  {} job(s)",
                        r.time.format("%Y-%m-%d %H:%M:%S"),
                        r.jobs.len()
                    ),
                    Err(e) => println!("{id:>10}  unreadable: {e}"),
                }
            }
        }
        Command::CompressLog { hours } => {
            let dir = cfg.job_log_dir();
            if let Some(done) = compress_logs(&dir, age_from_hours(hours)?)? {
                println!("{} file(s) -> {}", done.files.len(), done.archive.display());
            }
        }
        Command::Init { dir, force } => {
            for path in scaffold::init_project(&dir, force)? {
                println!("wrote {}", path.display());
            }
            println!("try: jh run {}", dir.join(scaffold::EXAMPLE_GRAPH_FILE).display());
        }
    }

    Ok(())
}

fn load_project(cfg: &JhConfig, selection: &Selection) -> Result<Project> {
    let graph = load_projects(&selection.files)?;
    info!(files = ?selection.files, jobs = graph.len(), "loaded job graph");
    Ok(Project::from_config(cfg, graph)?)
}

/// Resolve a record argument: a job id, a path, or the newest record.
fn load_record(cfg: &JhConfig, arg: &RecordArg) -> Result<(PathBuf, RunningResult)> {
    let dir = cfg.project_log_dir();
    let path = match arg.record.as_deref() {
        Some(s) => match s.parse::<JobId>() {
            Ok(id) => RunningResult::path_for(&dir, id),
            Err(_) => PathBuf::from(s),
        },
        None => {
            let newest = RunningResult::list(&dir)?
                .into_iter()
                .next()
                .ok_or_else(|| JobHelperError::Config(format!("no recorded runs in {}", dir.display())))?;
            RunningResult::path_for(&dir, newest)
        }
    };

    let result = RunningResult::load(&path).with_context(|| format!("loading {}", path.display()))?;
    Ok((path, result))
}

fn confirm_rerun(jobs: &[JobName], assume_yes: bool) -> errors::Result<bool> {
    println!("unfinished jobs: {}", jobs.join(", "));
    if assume_yes {
        return Ok(true);
    }
    Confirm::new()
        .with_prompt("Cancel and resubmit these jobs?")
        .default(false)
        .interact()
        .map_err(|e| JobHelperError::Other(e.into()))
}

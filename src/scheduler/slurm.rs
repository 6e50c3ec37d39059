// src/scheduler/slurm.rs

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;

use chrono::NaiveDateTime;
use regex::Regex;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::config::JhConfig;
use crate::errors::{JobHelperError, Result};
use crate::graph::DependencySpec;
use crate::scheduler::{BoxFuture, SchedulerBackend, SubmitRequest};
use crate::types::{JobHandle, JobId, JobInfo, JobState};

const SACCT_FORMAT: &str = "jobid,jobname,start,end,state";

/// Slurm's `--dependency` value for an already-resolved spec.
///
/// `afterok:10:11,afterany:12`; `None` when every bucket is empty.
pub fn dependency_field(spec: &DependencySpec) -> Option<String> {
    let parts: Vec<String> = spec
        .buckets()
        .map(|(kind, ids)| format!("{}:{}", kind, ids.join(":")))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(","))
    }
}

/// Parse the table printed by `sacct --parsable2`.
///
/// The first line is a `|`-separated header; columns are located by name so
/// extra or reordered columns are fine. Step rows (`123.batch`), blank
/// lines and rows in a state we can not classify are skipped;
/// `Unknown`/`None` timestamps become `None`.
pub fn parse_sacct(output: &str) -> Result<BTreeMap<JobId, JobInfo>> {
    let mut lines = output.lines().filter(|l| !l.trim().is_empty());
    let Some(header) = lines.next() else {
        return Ok(BTreeMap::new());
    };

    let columns: Vec<String> = header.split('|').map(|c| c.trim().to_lowercase()).collect();
    let col = |name: &str| {
        columns.iter().position(|c| c == name).ok_or_else(|| {
            JobHelperError::Scheduler(format!("sacct output has no '{name}' column"))
        })
    };
    let (id_col, state_col) = (col("jobid")?, col("state")?);
    let start_col = col("start").ok();
    let end_col = col("end").ok();

    let mut jobs = BTreeMap::new();
    for line in lines {
        let fields: Vec<&str> = line.split('|').collect();
        let Some(id) = fields.get(id_col).and_then(|s| s.parse::<JobId>().ok()) else {
            continue;
        };
        let state_str = fields.get(state_col).copied().unwrap_or("");
        let state: JobState = match state_str.parse() {
            Ok(state) => state,
            Err(e) => {
                warn!(job_id = %id, "skipping sacct row: {e}");
                continue;
            }
        };
        let time_at = |c: Option<usize>| c.and_then(|c| fields.get(c)).and_then(|s| parse_time(s));

        jobs.insert(
            id,
            JobInfo {
                state,
                start: time_at(start_col),
                end: time_at(end_col),
            },
        );
    }
    Ok(jobs)
}

fn parse_time(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    match s {
        "" | "Unknown" | "None" => None,
        _ => s.parse().ok(),
    }
}

/// Production backend: pipes job scripts into `sbatch`.
#[derive(Debug, Clone)]
pub struct SlurmScheduler {
    shell: String,
    sbatch_cmd: String,
    sacct_cmd: String,
    scancel_cmd: String,
    job_log_dir: PathBuf,
    submitted: Regex,
}

impl SlurmScheduler {
    pub fn from_config(cfg: &JhConfig) -> Result<Self> {
        let submitted = Regex::new(r"Submitted batch job (\d+)")
            .map_err(|e| JobHelperError::Other(e.into()))?;
        Ok(Self {
            shell: cfg.slurm.shell.clone(),
            sbatch_cmd: cfg.slurm.sbatch_cmd.clone(),
            sacct_cmd: cfg.slurm.sacct_cmd.clone(),
            scancel_cmd: cfg.slurm.scancel_cmd.clone(),
            job_log_dir: cfg.job_log_dir(),
            submitted,
        })
    }

    /// Full batch script for a request: shebang, `#SBATCH` header, command.
    pub fn script(&self, request: &SubmitRequest<'_>) -> String {
        let mut header: Vec<(String, String)> = vec![(
            "output".to_string(),
            self.job_log_dir.join("%j.out").display().to_string(),
        )];
        let mut set = |key: &str, value: String| {
            match header.iter_mut().find(|(k, _)| k == key) {
                Some(entry) => entry.1 = value,
                None => header.push((key.to_string(), value)),
            }
        };

        for (key, value) in request.options {
            set(key, value.clone());
        }
        if let Some(dep) = dependency_field(request.dependency) {
            set("dependency", dep);
        }
        set("job-name", request.job_name.to_string());

        let mut lines = vec![format!("#!{}", self.shell)];
        lines.extend(
            header
                .iter()
                .map(|(k, v)| format!("#SBATCH --{k:<19} {v}")),
        );
        lines.push(request.script.to_string());
        lines.join("\n")
    }

    /// Extract the job id from `sbatch` stdout.
    pub fn parse_job_id(&self, stdout: &str) -> Option<JobId> {
        self.submitted
            .captures(stdout)
            .and_then(|caps| caps[1].parse().ok())
    }

    async fn sbatch(&self, job_name: &str, script: &str) -> Result<JobId> {
        std::fs::create_dir_all(&self.job_log_dir)?;

        let mut child = shell_command(&self.sbatch_cmd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            let written = match stdin.write_all(script.as_bytes()).await {
                Ok(()) => stdin.write_all(b"\n").await,
                Err(e) => Err(e),
            };
            match written {
                // sbatch quit without reading; its exit status and output
                // are reported below.
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                    debug!(job = %job_name, "sbatch closed stdin early");
                }
                other => other?,
            }
        }

        let output = child.wait_with_output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        let job_id = match self.parse_job_id(&stdout) {
            Some(id) if output.status.success() => id,
            _ => {
                error!(job = %job_name, "sbatch rejected the job script:\n{script}");
                return Err(JobHelperError::Submission {
                    job: job_name.to_string(),
                    message: format!(
                        "'{}' exited with {}: {}{}",
                        self.sbatch_cmd,
                        output.status,
                        stdout.trim(),
                        stderr.trim()
                    ),
                });
            }
        };

        info!(job = %job_name, job_id = %job_id, "{}", stdout.trim());

        let script_path = self.job_log_dir.join(format!("{job_id}_slurm.sh"));
        std::fs::write(&script_path, format!("{script}\n"))?;
        debug!(path = ?script_path, "saved submitted script");

        Ok(job_id)
    }

    async fn run_capture(&self, cmd: String) -> Result<String> {
        debug!(%cmd, "running scheduler command");
        let output = shell_command(&cmd).stdin(Stdio::null()).output().await?;
        if !output.status.success() {
            return Err(JobHelperError::Scheduler(format!(
                "'{}' exited with {}: {}",
                cmd,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn shell_command(cmd: &str) -> Command {
    let mut c = Command::new("sh");
    c.arg("-c").arg(cmd);
    c
}

fn join_ids(ids: &[JobId]) -> String {
    ids.iter().map(JobId::to_string).collect::<Vec<_>>().join(",")
}

impl SchedulerBackend for SlurmScheduler {
    fn submit<'a>(&'a self, request: SubmitRequest<'a>) -> BoxFuture<'a, Result<JobHandle>> {
        Box::pin(async move {
            let script = self.script(&request);

            if request.dry_run {
                println!("{script}");
                info!(job = %request.job_name, "dry run; not submitted");
                return Ok(JobHandle::DryRun);
            }

            let id = self.sbatch(request.job_name, &script).await?;
            Ok(JobHandle::Id(id))
        })
    }

    fn job_states<'a>(&'a self, ids: &'a [JobId]) -> BoxFuture<'a, Result<BTreeMap<JobId, JobInfo>>> {
        Box::pin(async move {
            if ids.is_empty() {
                return Ok(BTreeMap::new());
            }
            let cmd = format!(
                "{} --jobs={} --format={} --parsable2 --allocations",
                self.sacct_cmd,
                join_ids(ids),
                SACCT_FORMAT
            );
            let out = self.run_capture(cmd).await?;
            parse_sacct(&out)
        })
    }

    fn cancel<'a>(&'a self, ids: &'a [JobId]) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            if ids.is_empty() {
                return Ok(());
            }
            let joined = ids
                .iter()
                .map(JobId::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            self.run_capture(format!("{} {}", self.scancel_cmd, joined))
                .await?;
            info!(jobs = %joined, "cancelled jobs");
            Ok(())
        })
    }
}

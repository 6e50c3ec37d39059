// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command-line arguments for `jh`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "jh",
    version,
    about = "Submit dependency graphs of jobs to Slurm.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to `jh_config.toml`.
    ///
    /// If omitted, `$JHCFG` or the nearest `jh_config.toml` walking up from
    /// the current directory is used; otherwise built-in defaults.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `JH_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Submit jobs from one or more job-graph files.
    ///
    /// Prints the scripts only, unless `--no-dry-run` is given.
    Run {
        #[command(flatten)]
        selection: Selection,

        /// Really submit the jobs to the scheduler.
        #[arg(long)]
        no_dry_run: bool,
    },

    /// Draw the job graph as a Mermaid flowchart.
    Jobflow {
        #[command(flatten)]
        selection: Selection,

        /// `-` for stdout, or a `.html` / `.mmd` file.
        #[arg(short, long, value_name = "PATH", default_value = "-")]
        output: String,
    },

    /// Show the scheduler state of every job of a recorded run.
    Status {
        #[command(flatten)]
        record: RecordArg,

        /// Also draw the run's graph colored by job state (`-`, `.html` or
        /// `.mmd`).
        #[arg(long, value_name = "PATH")]
        chart: Option<String>,
    },

    /// Cancel and resubmit the unfinished jobs of a recorded run.
    Recover {
        #[command(flatten)]
        record: RecordArg,

        /// Don't ask for confirmation.
        #[arg(short, long)]
        yes: bool,

        /// Print the scripts instead of cancelling and submitting.
        #[arg(long)]
        dry_run: bool,
    },

    /// List recorded runs, newest first.
    Results,

    /// Archive Slurm `*.out` and `*.sh` files into `<timestamp>.tar.gz`.
    CompressLog {
        /// Only files not modified for this many hours.
        #[arg(long, value_name = "HOURS", default_value_t = 24.0)]
        hours: f64,
    },

    /// Write a starter `jh_config.toml` and `project.yaml`.
    Init {
        /// Directory to initialize.
        #[arg(value_name = "DIR", default_value = ".")]
        dir: PathBuf,

        /// Overwrite existing files.
        #[arg(long)]
        force: bool,
    },
}

/// Which jobs of which graph.
#[derive(Debug, Clone, Args)]
pub struct Selection {
    /// Job-graph files (YAML, TOML or JSON); job names must not overlap.
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// `;`-separated jobs to (re)run. `START` means every root job.
    #[arg(short, long, value_name = "JOBS", default_value = "START")]
    pub reruns: String,

    /// Only the listed jobs, not the jobs that depend on them.
    #[arg(long)]
    pub no_following: bool,
}

impl Selection {
    pub fn run_following(&self) -> bool {
        !self.no_following
    }
}

/// A running-result record: a job id, a path, or the latest when omitted.
#[derive(Debug, Clone, Args)]
pub struct RecordArg {
    #[arg(value_name = "ID|PATH")]
    pub record: Option<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

// tests/slurm_backend.rs

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use jobhelper::config::JhConfig;
use jobhelper::errors::JobHelperError;
use jobhelper::graph::DependencySpec;
use jobhelper::scheduler::slurm::{dependency_field, parse_sacct};
use jobhelper::scheduler::{SchedulerBackend, SlurmScheduler, SubmitRequest};
use jobhelper::types::{JobHandle, JobId, JobState};
use jobhelper_test_utils::init_tracing;
use tempfile::tempdir;

fn config_in(root: &Path) -> JhConfig {
    JhConfig {
        root_dir: root.to_path_buf(),
        ..JhConfig::default()
    }
}

fn request<'a>(
    script: &'a str,
    dependency: &'a DependencySpec,
    options: &'a BTreeMap<String, String>,
    dry_run: bool,
) -> SubmitRequest<'a> {
    SubmitRequest {
        job_name: "train",
        script,
        dependency,
        options,
        dry_run,
    }
}

#[test]
fn test_dependency_field_is_omitted_when_empty() {
    assert_eq!(dependency_field(&DependencySpec::default()), None);
    assert_eq!(
        dependency_field(&DependencySpec::after_ok(["1", "2"])).as_deref(),
        Some("afterok:1:2")
    );
}

#[test]
fn test_script_layout() {
    let dir = tempdir().unwrap();
    let slurm = SlurmScheduler::from_config(&config_in(dir.path())).unwrap();
    let dependency = DependencySpec::after_ok(["41"]);
    let mut options = BTreeMap::new();
    options.insert("partition".to_string(), "gpu".to_string());

    let script = slurm.script(&request("python train.py", &dependency, &options, false));

    let out = dir.path().join("log/jobs/%j.out");
    let expected = format!(
        "#!/bin/sh\n\
         #SBATCH --output              {}\n\
         #SBATCH --partition           gpu\n\
         #SBATCH --dependency          afterok:41\n\
         #SBATCH --job-name            train\n\
         python train.py",
        out.display()
    );
    assert_eq!(script, expected);
}

#[test]
fn test_user_output_option_replaces_default() {
    let dir = tempdir().unwrap();
    let slurm = SlurmScheduler::from_config(&config_in(dir.path())).unwrap();
    let dependency = DependencySpec::default();
    let mut options = BTreeMap::new();
    options.insert("output".to_string(), "/scratch/%j.log".to_string());

    let script = slurm.script(&request("true", &dependency, &options, false));

    let output_lines: Vec<&str> = script.lines().filter(|l| l.contains("--output")).collect();
    assert_eq!(output_lines, vec!["#SBATCH --output              /scratch/%j.log"]);
    assert!(!script.contains("--dependency"));
}

#[test]
fn test_parse_job_id() {
    let dir = tempdir().unwrap();
    let slurm = SlurmScheduler::from_config(&config_in(dir.path())).unwrap();

    assert_eq!(slurm.parse_job_id("Submitted batch job 12345\n"), Some(JobId(12345)));
    assert_eq!(slurm.parse_job_id("sbatch: error: Batch job submission failed"), None);
}

#[test]
fn test_parse_sacct_table() {
    let out = "\
JobID|JobName|Start|End|State
101|prepare|2024-03-01T10:00:00|2024-03-01T10:05:00|COMPLETED
101.batch|batch|2024-03-01T10:00:00|2024-03-01T10:05:00|COMPLETED
102|train|2024-03-01T10:05:01|Unknown|RUNNING
103|eval|None|None|PENDING
104|old|2024-03-01T09:00:00|2024-03-01T09:30:00|CANCELLED by 1000
105|oom|2024-03-01T09:00:00|2024-03-01T09:01:00|OUT_OF_MEMORY
";

    let jobs = parse_sacct(out).unwrap();

    assert_eq!(jobs.len(), 5);
    let done = &jobs[&JobId(101)];
    assert_eq!(done.state, JobState::Completed);
    assert_eq!(
        done.start,
        Some(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(10, 0, 0).unwrap())
    );
    assert_eq!(jobs[&JobId(102)].state, JobState::Running);
    assert_eq!(jobs[&JobId(102)].end, None);
    assert_eq!(jobs[&JobId(103)].start, None);
    assert_eq!(jobs[&JobId(104)].state, JobState::Cancelled);
    assert_eq!(jobs[&JobId(105)].state, JobState::Failed);
}

#[test]
fn test_parse_sacct_needs_state_column() {
    assert!(parse_sacct("").unwrap().is_empty());
    assert!(matches!(
        parse_sacct("JobID|JobName\n1|x\n"),
        Err(JobHelperError::Scheduler(_))
    ));
}

#[test]
fn test_parse_sacct_maps_rarer_slurm_states() {
    let out = "\
JobID|JobName|Start|End|State
201|a|Unknown|Unknown|REVOKED
202|b|Unknown|Unknown|SPECIAL_EXIT
203|c|Unknown|Unknown|REQUEUE_HOLD
204|d|Unknown|Unknown|REQUEUE_FED
205|e|2024-03-01T10:00:00|Unknown|STOPPED
";

    let jobs = parse_sacct(out).unwrap();

    assert_eq!(jobs[&JobId(201)].state, JobState::Failed);
    assert_eq!(jobs[&JobId(202)].state, JobState::Failed);
    assert_eq!(jobs[&JobId(203)].state, JobState::Pending);
    assert_eq!(jobs[&JobId(204)].state, JobState::Pending);
    assert_eq!(jobs[&JobId(205)].state, JobState::Running);
}

#[test]
fn test_parse_sacct_skips_unclassifiable_state() {
    init_tracing();
    let out = "\
JobID|JobName|Start|End|State
100|a|2024-03-01T10:00:00|2024-03-01T10:05:00|COMPLETED
101|b|Unknown|Unknown|SOMETHING_NEW
";

    let jobs = parse_sacct(out).unwrap();

    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[&JobId(100)].state, JobState::Completed);
    assert!(!jobs.contains_key(&JobId(101)));
}

#[cfg(unix)]
#[tokio::test]
async fn test_submit_pipes_script_to_sbatch_and_saves_it() {
    init_tracing();
    let dir = tempdir().unwrap();
    let received = dir.path().join("received.sh");
    let mut cfg = config_in(dir.path());
    cfg.slurm.sbatch_cmd = format!("cat > {}; echo 'Submitted batch job 777'", received.display());
    let slurm = SlurmScheduler::from_config(&cfg).unwrap();
    let dependency = DependencySpec::default();
    let options = BTreeMap::new();

    let handle = slurm
        .submit(request("echo hello", &dependency, &options, false))
        .await
        .unwrap();

    assert_eq!(handle, JobHandle::Id(JobId(777)));
    let sent = fs::read_to_string(&received).unwrap();
    assert!(sent.starts_with("#!/bin/sh\n"));
    assert!(sent.contains("echo hello"));
    let saved = fs::read_to_string(dir.path().join("log/jobs/777_slurm.sh")).unwrap();
    assert_eq!(saved, sent);
}

#[cfg(unix)]
#[tokio::test]
async fn test_rejected_submission_carries_tool_output() {
    let dir = tempdir().unwrap();
    let mut cfg = config_in(dir.path());
    cfg.slurm.sbatch_cmd = "cat > /dev/null; echo 'sbatch: error: invalid partition' >&2; exit 1".into();
    let slurm = SlurmScheduler::from_config(&cfg).unwrap();
    let dependency = DependencySpec::default();
    let options = BTreeMap::new();

    match slurm.submit(request("true", &dependency, &options, false)).await {
        Err(JobHelperError::Submission { job, message }) => {
            assert_eq!(job, "train");
            assert!(message.contains("invalid partition"), "message was: {message}");
        }
        other => panic!("Expected Submission error, got: {:?}", other),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_sbatch_exiting_before_reading_script_reports_its_stderr() {
    init_tracing();
    let dir = tempdir().unwrap();
    let mut cfg = config_in(dir.path());
    cfg.slurm.sbatch_cmd = "echo 'sbatch: error: quota exceeded' >&2; exit 1".into();
    let slurm = SlurmScheduler::from_config(&cfg).unwrap();
    let dependency = DependencySpec::default();
    let options = BTreeMap::new();
    // Larger than a pipe buffer, so the write can not complete.
    let script = "echo padding\n".repeat(20_000);

    match slurm.submit(request(&script, &dependency, &options, false)).await {
        Err(JobHelperError::Submission { job, message }) => {
            assert_eq!(job, "train");
            assert!(message.contains("quota exceeded"), "message was: {message}");
        }
        other => panic!("Expected Submission error, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_dry_run_does_not_call_sbatch() {
    let dir = tempdir().unwrap();
    let mut cfg = config_in(dir.path());
    cfg.slurm.sbatch_cmd = "exit 1".into();
    let slurm = SlurmScheduler::from_config(&cfg).unwrap();
    let dependency = DependencySpec::after_ok(["prepare"]);
    let options = BTreeMap::new();

    let handle = slurm
        .submit(request("true", &dependency, &options, true))
        .await
        .unwrap();

    assert_eq!(handle, JobHandle::DryRun);
    assert!(!dir.path().join("log/jobs").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_job_states_and_cancel_use_configured_tools() {
    let dir = tempdir().unwrap();
    let cancelled = dir.path().join("cancelled");
    let mut cfg = config_in(dir.path());
    cfg.slurm.sacct_cmd =
        "printf 'JobID|JobName|Start|End|State\\n5|a|Unknown|Unknown|PENDING\\n6|b|Unknown|Unknown|FAILED\\n' #".into();
    cfg.slurm.scancel_cmd = format!("echo >> {} ", cancelled.display());
    let slurm = SlurmScheduler::from_config(&cfg).unwrap();

    let states = slurm.job_states(&[JobId(5), JobId(6)]).await.unwrap();
    assert_eq!(states[&JobId(5)].state, JobState::Pending);
    assert_eq!(states[&JobId(6)].state, JobState::Failed);
    assert!(slurm.job_states(&[]).await.unwrap().is_empty());

    slurm.cancel(&[JobId(5), JobId(6)]).await.unwrap();
    assert_eq!(fs::read_to_string(&cancelled).unwrap().trim(), "5 6");
}

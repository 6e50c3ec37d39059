// tests/scaffold.rs

use std::fs;
use std::path::PathBuf;

use jobhelper::commands::CommandRegistry;
use jobhelper::config::load_and_validate;
use jobhelper::errors::JobHelperError;
use jobhelper::graph::load_project;
use jobhelper::scaffold::init_project;
use jobhelper_test_utils::{fake_project_with, init_tracing};
use tempfile::tempdir;

#[tokio::test]
async fn test_init_writes_a_runnable_project() {
    init_tracing();
    let dir = tempdir().unwrap();

    let written = init_project(dir.path(), false).unwrap();

    let config_path = dir.path().join("jh_config.toml");
    let graph_path = dir.path().join("project.yaml");
    assert_eq!(written, vec![config_path.clone(), graph_path.clone()]);

    let cfg = load_and_validate(&config_path).unwrap();
    assert_eq!(cfg.repo_watcher.watched_repos, vec![PathBuf::from(".")]);
    assert_eq!(cfg.project.submit_delay_ms, 200);

    let graph = load_project(&graph_path).unwrap();
    let registry = CommandRegistry::from_config(&cfg).unwrap();
    let (project, scheduler) = fake_project_with(graph, registry, &dir.path().join("log"));

    let recorded = project.run("START", true, true).await.unwrap();

    assert_eq!(recorded, None);
    assert_eq!(scheduler.submitted_names(), vec!["prepare", "add_one", "report"]);
    assert_eq!(scheduler.submission("add_one").unwrap().script, "echo $(( 1 + 1 ))");
    assert_eq!(
        scheduler.submission("add_one").unwrap().options.get("time").map(String::as_str),
        Some("00:05:00")
    );
}

#[test]
fn test_init_does_not_overwrite_without_force() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("jh_config.toml");
    fs::write(&config_path, "# mine\n").unwrap();

    match init_project(dir.path(), false) {
        Err(JobHelperError::Config(msg)) => assert!(msg.contains("jh_config.toml")),
        other => panic!("Expected Config error, got: {:?}", other),
    }
    assert_eq!(fs::read_to_string(&config_path).unwrap(), "# mine\n");
    assert!(!dir.path().join("project.yaml").exists());

    init_project(dir.path(), true).unwrap();
    assert!(load_and_validate(&config_path).is_ok());
}

#[test]
fn test_init_creates_missing_directory() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("new/project");

    init_project(&target, false).unwrap();

    assert!(target.join("jh_config.toml").is_file());
    assert!(target.join("project.yaml").is_file());
}

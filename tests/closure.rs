// tests/closure.rs

use jobhelper::errors::JobHelperError;
use jobhelper::graph::{parse_joblist, DependencyKind, ProjectConfig};
use jobhelper_test_utils::{init_tracing, JobConfigBuilder, ProjectConfigBuilder};

/// prepare -> train -> eval, plus an unrelated `report` hanging off START.
fn pipeline() -> ProjectConfig {
    ProjectConfigBuilder::new()
        .with_job("prepare", JobConfigBuilder::shell("python prepare.py").after_start())
        .with_job("train", JobConfigBuilder::shell("python train.py").after_ok("prepare"))
        .with_job("eval", JobConfigBuilder::shell("python eval.py").after_ok("train"))
        .with_job("report", JobConfigBuilder::shell("python report.py").after_start())
        .build()
}

fn names(graph: &ProjectConfig, joblist: &str, run_following: bool) -> Vec<String> {
    graph
        .jobs_to_run(joblist, run_following)
        .unwrap()
        .names()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_parse_joblist_trims_and_drops_blanks() {
    assert_eq!(parse_joblist(" a ; b;;c ;"), vec!["a", "b", "c"]);
    assert!(parse_joblist("").is_empty());
    assert!(parse_joblist(" ; ").is_empty());
}

#[test]
fn test_without_following_only_listed_jobs_in_order() {
    init_tracing();
    let graph = pipeline();

    assert_eq!(names(&graph, "eval;prepare", false), vec!["eval", "prepare"]);
    assert_eq!(names(&graph, "START;train", false), vec!["train"]);
    assert!(names(&graph, "START", false).is_empty());
}

#[test]
fn test_start_with_following_selects_everything_reachable() {
    init_tracing();
    let graph = pipeline();

    let mut selected = names(&graph, "START", true);
    selected.sort();
    assert_eq!(selected, vec!["eval", "prepare", "report", "train"]);
}

#[test]
fn test_following_pulls_in_downstream_only() {
    init_tracing();
    let graph = pipeline();

    assert_eq!(names(&graph, "train", true), vec!["train", "eval"]);
    assert_eq!(names(&graph, "eval", true), vec!["eval"]);
}

#[test]
fn test_following_discovery_order_is_scan_order() {
    init_tracing();
    // `a` and `b` both hang off `root`; `c` hangs off `a`. Map order is
    // alphabetical, so `a` is found first, then the rescan finds `b` before
    // `c`.
    let graph = ProjectConfigBuilder::new()
        .with_job("root", JobConfigBuilder::shell("echo root"))
        .with_job("c", JobConfigBuilder::shell("echo c").after_ok("a"))
        .with_job("b", JobConfigBuilder::shell("echo b").after_ok("root"))
        .with_job("a", JobConfigBuilder::shell("echo a").after_ok("root"))
        .build();

    assert_eq!(names(&graph, "root", true), vec!["root", "a", "b", "c"]);
}

#[test]
fn test_following_crosses_every_dependency_kind() {
    init_tracing();
    let graph = ProjectConfigBuilder::new()
        .with_job("sim", JobConfigBuilder::shell("./sim"))
        .with_job(
            "cleanup",
            JobConfigBuilder::shell("./cleanup").dep(DependencyKind::AfterAny, "sim"),
        )
        .with_job(
            "alert",
            JobConfigBuilder::shell("./alert").dep(DependencyKind::AfterNotOk, "sim"),
        )
        .with_job(
            "archive",
            JobConfigBuilder::shell("./archive").dep(DependencyKind::After, "cleanup"),
        )
        .build();

    let mut selected = names(&graph, "sim", true);
    selected.sort();
    assert_eq!(selected, vec!["alert", "archive", "cleanup", "sim"]);
}

#[test]
fn test_duplicate_names_are_selected_once() {
    let graph = pipeline();
    assert_eq!(names(&graph, "train;train", false), vec!["train"]);
}

#[test]
fn test_unknown_job_name_is_an_error() {
    let graph = pipeline();

    match graph.jobs_to_run("train;nope", true) {
        Err(JobHelperError::JobNotFound(name)) => assert_eq!(name, "nope"),
        other => panic!("Expected JobNotFound, got: {:?}", other),
    }
}

#[test]
fn test_job_without_dependencies_is_not_reached_from_start() {
    // Roots that do not name START are only submitted when listed.
    let graph = ProjectConfigBuilder::new()
        .with_job("orphan", JobConfigBuilder::shell("echo orphan"))
        .with_job("child", JobConfigBuilder::shell("echo child").after_ok("orphan"))
        .build();

    assert!(names(&graph, "START", true).is_empty());
    assert_eq!(names(&graph, "orphan", true), vec!["orphan", "child"]);
}

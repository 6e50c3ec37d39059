// tests/dependency_resolution.rs

use std::collections::HashMap;

use jobhelper::graph::{DependencyKind, DependencySpec, JobConfig};
use jobhelper::scheduler::slurm::dependency_field;
use jobhelper::types::{JobHandle, JobId};
use jobhelper_test_utils::init_tracing;

fn handles(pairs: &[(&str, JobHandle)]) -> HashMap<String, JobHandle> {
    pairs
        .iter()
        .map(|(name, handle)| (name.to_string(), *handle))
        .collect()
}

#[test]
fn test_resolution_replaces_names_and_drops_unknown() {
    init_tracing();
    let submitted = handles(&[("A", JobHandle::Id(JobId(10))), ("B", JobHandle::Id(JobId(11)))]);
    let spec = DependencySpec::after_ok(["A", "B", "C"]);

    let resolved = spec.resolve_to_handles(&submitted, false);

    assert_eq!(resolved.bucket(DependencyKind::AfterOk), ["10", "11"]);
    assert!(resolved.bucket(DependencyKind::After).is_empty());
    assert_eq!(dependency_field(&resolved).as_deref(), Some("afterok:10:11"));
}

#[test]
fn test_resolution_drops_start_silently() {
    let spec = DependencySpec::after_ok(["START"]);
    let resolved = spec.resolve_to_handles(&HashMap::new(), false);

    assert!(resolved.is_empty());
    assert_eq!(dependency_field(&resolved), None);
}

#[test]
fn test_dry_run_keeps_names() {
    let submitted = handles(&[("A", JobHandle::DryRun)]);
    let spec = DependencySpec::after_ok(["A", "START"]);

    let resolved = spec.resolve_to_handles(&submitted, true);

    assert_eq!(resolved.bucket(DependencyKind::AfterOk), ["A"]);
}

#[test]
fn test_resolution_keeps_bucket_shape() {
    let submitted = handles(&[
        ("a", JobHandle::Id(JobId(1))),
        ("b", JobHandle::Id(JobId(2))),
        ("c", JobHandle::Id(JobId(3))),
    ]);
    let mut spec = DependencySpec::default();
    spec.bucket_mut(DependencyKind::After).push("a".into());
    spec.bucket_mut(DependencyKind::AfterAny).push("b".into());
    spec.bucket_mut(DependencyKind::AfterOk).push("c".into());

    let resolved = spec.resolve_to_handles(&submitted, false);

    assert_eq!(
        dependency_field(&resolved).as_deref(),
        Some("after:1,afterany:2,afterok:3")
    );
}

#[test]
fn test_names_referenced_follows_bucket_order() {
    let mut spec = DependencySpec::default();
    spec.bucket_mut(DependencyKind::AfterOk).push("z".into());
    spec.bucket_mut(DependencyKind::After).push("x".into());
    spec.bucket_mut(DependencyKind::AfterNotOk).push("y".into());
    spec.bucket_mut(DependencyKind::AfterOk).push("x".into());

    let names: Vec<&str> = spec.names_referenced().collect();
    assert_eq!(names, vec!["x", "y", "z", "x"]);
    assert!(spec.references("y"));
    assert!(!spec.references("w"));
}

#[test]
fn test_flat_list_means_afterok() {
    let job: JobConfig = serde_yaml::from_str(
        r#"
command: shell
config: { sh: "echo hi" }
dependency: [prepare, START]
"#,
    )
    .unwrap();

    assert_eq!(job.dependency, DependencySpec::after_ok(["prepare", "START"]));
}

#[test]
fn test_table_form_and_null_dependency() {
    let job: JobConfig = serde_yaml::from_str(
        r#"
command: shell
config: { sh: "echo hi" }
dependency:
  afterany: [a]
  afternotok: [b]
"#,
    )
    .unwrap();
    assert_eq!(job.dependency.bucket(DependencyKind::AfterAny), ["a"]);
    assert_eq!(job.dependency.bucket(DependencyKind::AfterNotOk), ["b"]);

    let empty: JobConfig = serde_yaml::from_str(
        r#"
command: shell
config: { sh: "echo hi" }
dependency:
"#,
    )
    .unwrap();
    assert!(empty.dependency.is_empty());
}

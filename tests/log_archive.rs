// tests/log_archive.rs

use std::fs::{self, File};
use std::path::Path;
use std::time::{Duration, SystemTime};

use flate2::read::GzDecoder;
use jobhelper::archive::{age_from_hours, compress_logs, stale_log_files};
use jobhelper::errors::JobHelperError;
use jobhelper_test_utils::init_tracing;
use tempfile::tempdir;

const DAY: Duration = Duration::from_secs(24 * 3600);

fn write_aged(dir: &Path, name: &str, age: Duration) {
    let path = dir.join(name);
    fs::write(&path, name).unwrap();
    File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(SystemTime::now() - age)
        .unwrap();
}

fn archive_entries(path: &Path) -> Vec<String> {
    let mut archive = tar::Archive::new(GzDecoder::new(File::open(path).unwrap()));
    let mut names: Vec<String> = archive
        .entries()
        .unwrap()
        .map(|e| e.unwrap().path().unwrap().display().to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn test_old_outputs_and_scripts_are_archived_and_removed() {
    init_tracing();
    let dir = tempdir().unwrap();
    write_aged(dir.path(), "100.out", 2 * DAY);
    write_aged(dir.path(), "100_slurm.sh", 2 * DAY);
    write_aged(dir.path(), "101.out", Duration::ZERO);
    write_aged(dir.path(), "notes.txt", 2 * DAY);

    let done = compress_logs(dir.path(), DAY).unwrap().unwrap();

    assert_eq!(done.files.len(), 2);
    assert!(done.archive.starts_with(dir.path()));
    assert!(done.archive.to_string_lossy().ends_with(".tar.gz"));
    assert_eq!(archive_entries(&done.archive), vec!["100.out", "100_slurm.sh"]);

    assert!(!dir.path().join("100.out").exists());
    assert!(!dir.path().join("100_slurm.sh").exists());
    assert!(dir.path().join("101.out").exists());
    assert!(dir.path().join("notes.txt").exists());
}

#[test]
fn test_nothing_to_archive() {
    init_tracing();
    let dir = tempdir().unwrap();
    write_aged(dir.path(), "101.out", Duration::ZERO);

    assert_eq!(compress_logs(dir.path(), DAY).unwrap(), None);
    assert_eq!(compress_logs(&dir.path().join("missing"), DAY).unwrap(), None);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_second_archive_in_the_same_second_does_not_overwrite() {
    let dir = tempdir().unwrap();
    write_aged(dir.path(), "1.out", 2 * DAY);
    let first = compress_logs(dir.path(), DAY).unwrap().unwrap();
    write_aged(dir.path(), "2.out", 2 * DAY);
    let second = compress_logs(dir.path(), DAY).unwrap().unwrap();

    assert_ne!(first.archive, second.archive);
    assert_eq!(archive_entries(&first.archive), vec!["1.out"]);
    assert_eq!(archive_entries(&second.archive), vec!["2.out"]);
}

#[test]
fn test_stale_files_respect_cutoff() {
    let dir = tempdir().unwrap();
    write_aged(dir.path(), "a.out", 3 * DAY);
    write_aged(dir.path(), "b.sh", Duration::ZERO);

    let cutoff = SystemTime::now() - DAY;
    assert_eq!(stale_log_files(dir.path(), cutoff).unwrap(), vec![dir.path().join("a.out")]);
}

#[test]
fn test_hours_are_validated() {
    assert_eq!(age_from_hours(1.5).unwrap(), Duration::from_secs(5400));
    assert_eq!(age_from_hours(0.0).unwrap(), Duration::ZERO);
    assert!(matches!(age_from_hours(-1.0), Err(JobHelperError::Config(_))));
    assert!(matches!(age_from_hours(f64::NAN), Err(JobHelperError::Config(_))));
}

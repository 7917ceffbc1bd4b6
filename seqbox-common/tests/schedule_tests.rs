//! Integration tests for CSV schedule loading
//!
//! Exercises file-backed loading end to end: the inline unit tests cover the
//! reader path, these cover filesystem behavior (missing files, real files).

use seqbox_common::schedule::{LoadError, Schedule};
use std::io::Write;

fn write_csv(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).expect("create csv");
    file.write_all(content.as_bytes()).expect("write csv");
    path
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_csv(&dir, "run.csv", "Time (min),Output\n0,A\n1,B\n3,C\n");

    let schedule = Schedule::load(&path).expect("load should succeed");
    assert_eq!(schedule.len(), 3);
    assert_eq!(schedule.get(0).unwrap().offset_minutes, 0.0);
    assert_eq!(schedule.get(2).unwrap().command, b"C");
}

#[test]
fn test_load_missing_file_is_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("no-such-schedule.csv");

    match Schedule::load(&path) {
        Err(LoadError::NotFound(details)) => {
            assert!(details.contains("no-such-schedule.csv"));
        }
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_load_empty_data_section() {
    // Header only, zero entries: valid, the player finishes immediately.
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_csv(&dir, "empty.csv", "Time (min),Output\n");

    let schedule = Schedule::load(&path).expect("load should succeed");
    assert!(schedule.is_empty());
}

#[test]
fn test_load_malformed_row_reports_line_number() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_csv(
        &dir,
        "bad.csv",
        "Time (min),Output\n0,A\n1,B\nlater,C\n",
    );

    match Schedule::load(&path) {
        Err(LoadError::Malformed { line, details }) => {
            assert_eq!(line, 4);
            assert!(details.contains("later"));
        }
        other => panic!("expected Malformed, got {:?}", other),
    }
}

#[test]
fn test_load_extra_columns_are_ignored() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_csv(
        &dir,
        "extra.csv",
        "Step,Time (min),Output,Comment\n1,0,A,start pump\n2,2,B,heater on\n",
    );

    let schedule = Schedule::load(&path).expect("load should succeed");
    assert_eq!(schedule.len(), 2);
    assert_eq!(schedule.get(1).unwrap().offset_minutes, 2.0);
    assert_eq!(schedule.get(1).unwrap().command, b"B");
}

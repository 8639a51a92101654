//! Rotation and Retention Invariant Tests
//!
//! - Size rotation: crossing the size threshold produces one historical file
//!   and resets the byte counter
//! - Count retention: only the newest N historical files survive
//! - Disk-space retention: history stays within its byte budget
//! - Naming collision: rotations within one timestamp tick get distinct names
//! - Time rotation: an old enough active file rotates

use auditlog_core::{FileWriterConfig, RetentionConfig, RotationConfig};
use auditlog_durability::{RotatingFile, TimestampNamingPolicy};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

const MILLIS_FORMAT: &str = "-%Y.%m.%d-%H.%M.%S%.3f";

fn size_config(max_file_size: u64) -> FileWriterConfig {
    FileWriterConfig::for_testing().with_rotation(
        RotationConfig::new()
            .with_enabled(true)
            .with_max_file_size(max_file_size)
            .with_file_suffix(MILLIS_FORMAT),
    )
}

fn historical_contents(file: &RotatingFile) -> Vec<String> {
    file.naming()
        .list_historical_files()
        .unwrap()
        .iter()
        .map(|f| std::fs::read_to_string(&f.path).unwrap())
        .collect()
}

/// Write `bytes` bytes of `fill` and rotate, spacing rotations so every
/// historical file gets its own modification time.
fn fill_and_rotate(file: &mut RotatingFile, fill: char, bytes: usize) {
    file.write(&fill.to_string().repeat(bytes)).unwrap();
    assert!(file.rotate_if_needed().unwrap());
    std::thread::sleep(Duration::from_millis(5));
}

// ============================================================================
// Size rotation
// ============================================================================

#[test]
fn test_size_rotation_produces_one_historical_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("audit.log");
    let mut file = RotatingFile::open(&path, &size_config(100)).unwrap();

    file.write(&"x".repeat(101)).unwrap();
    assert_eq!(file.bytes_written(), 101);
    assert!(file.rotate_if_needed().unwrap());

    assert_eq!(file.bytes_written(), 0);
    assert_eq!(file.naming().list_historical_files().unwrap().len(), 1);
    assert!(path.exists());
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);

    // nothing more to do until the threshold is crossed again
    assert!(!file.rotate_if_needed().unwrap());
}

#[test]
fn test_size_rotation_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("audit.log");

    {
        let mut file = RotatingFile::open(&path, &size_config(100)).unwrap();
        file.write(&"x".repeat(60)).unwrap();
        file.close().unwrap();
    }

    let mut file = RotatingFile::open(&path, &size_config(100)).unwrap();
    assert_eq!(file.bytes_written(), 60);
    file.write(&"y".repeat(40)).unwrap();
    assert!(file.rotate_if_needed().unwrap());

    let contents = historical_contents(&file);
    assert_eq!(contents, vec![format!("{}{}", "x".repeat(60), "y".repeat(40))]);
}

// ============================================================================
// Retention
// ============================================================================

#[test]
fn test_count_retention_keeps_newest() {
    let temp_dir = TempDir::new().unwrap();
    let config =
        size_config(100).with_retention(RetentionConfig::new().with_max_history_files(3));
    let mut file = RotatingFile::open(temp_dir.path().join("audit.log"), &config).unwrap();

    for fill in ['a', 'b', 'c', 'd'] {
        fill_and_rotate(&mut file, fill, 100);
    }

    let contents = historical_contents(&file);
    assert_eq!(contents.len(), 3);
    assert_eq!(
        contents,
        vec!["b".repeat(100), "c".repeat(100), "d".repeat(100)]
    );
}

#[test]
fn test_disk_space_retention_within_budget() {
    let temp_dir = TempDir::new().unwrap();
    let config = size_config(100).with_retention(RetentionConfig::new().with_max_disk_space(300));
    let mut file = RotatingFile::open(temp_dir.path().join("audit.log"), &config).unwrap();

    for fill in ['a', 'b', 'c', 'd'] {
        fill_and_rotate(&mut file, fill, 100);
    }

    let history = file.naming().list_historical_files().unwrap();
    assert_eq!(history.len(), 3);
    assert!(history.iter().map(|f| f.size).sum::<u64>() <= 300);
    assert_eq!(historical_contents(&file)[0], "b".repeat(100));
}

#[test]
fn test_retention_ignores_unrelated_files() {
    let temp_dir = TempDir::new().unwrap();
    let config =
        size_config(10).with_retention(RetentionConfig::new().with_max_history_files(1));
    std::fs::write(temp_dir.path().join("notes.txt"), b"keep me").unwrap();
    std::fs::write(temp_dir.path().join("audit.log.bak"), b"keep me too").unwrap();

    let mut file = RotatingFile::open(temp_dir.path().join("audit.log"), &config).unwrap();
    for fill in ['a', 'b', 'c'] {
        fill_and_rotate(&mut file, fill, 10);
    }

    assert_eq!(file.naming().list_historical_files().unwrap().len(), 1);
    assert!(temp_dir.path().join("notes.txt").exists());
    assert!(temp_dir.path().join("audit.log.bak").exists());
}

#[test]
fn test_enforce_retention_on_preexisting_history() {
    let temp_dir = TempDir::new().unwrap();
    let naming = TimestampNamingPolicy::new(temp_dir.path().join("audit.log"), MILLIS_FORMAT, "");
    for second in 0..5 {
        let name = format!("audit.log-2026.01.01-00.00.0{second}.000");
        std::fs::write(temp_dir.path().join(name), b"old").unwrap();
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(naming.list_historical_files().unwrap().len(), 5);

    let config =
        size_config(100).with_retention(RetentionConfig::new().with_max_history_files(2));
    let file = RotatingFile::open(temp_dir.path().join("audit.log"), &config).unwrap();
    let outcome = file.enforce_retention();

    assert_eq!(outcome.deleted.len(), 3);
    assert!(outcome.failed.is_empty());
    let remaining: Vec<_> = naming
        .list_historical_files()
        .unwrap()
        .into_iter()
        .map(|f| file_name(&f.path))
        .collect();
    assert_eq!(
        remaining,
        vec![
            "audit.log-2026.01.01-00.00.03.000",
            "audit.log-2026.01.01-00.00.04.000"
        ]
    );
}

// ============================================================================
// Naming
// ============================================================================

#[test]
fn test_collision_within_one_tick() {
    let temp_dir = TempDir::new().unwrap();
    // one-year resolution: both rotations land in the same tick
    let config = FileWriterConfig::for_testing().with_rotation(
        RotationConfig::new()
            .with_enabled(true)
            .with_max_file_size(1)
            .with_file_suffix("-%Y"),
    );
    let mut file = RotatingFile::open(temp_dir.path().join("audit.log"), &config).unwrap();

    file.write("first").unwrap();
    assert!(file.rotate_if_needed().unwrap());
    file.write("second").unwrap();
    assert!(file.rotate_if_needed().unwrap());

    let mut names: Vec<String> = file
        .naming()
        .list_historical_files()
        .unwrap()
        .iter()
        .map(|f| file_name(&f.path))
        .collect();
    names.sort();
    assert_eq!(names.len(), 2);
    assert_ne!(names[0], names[1]);
    assert!(names[1].ends_with(".1"));
    assert!(names[1].starts_with(&names[0]));
}

#[test]
fn test_prefixed_names() {
    let temp_dir = TempDir::new().unwrap();
    let config = FileWriterConfig::for_testing().with_rotation(
        RotationConfig::new()
            .with_enabled(true)
            .with_max_file_size(1)
            .with_file_prefix("archived-"),
    );
    let mut file = RotatingFile::open(temp_dir.path().join("audit.log"), &config).unwrap();
    file.write("x").unwrap();
    assert!(file.rotate_if_needed().unwrap());

    let history = file.naming().list_historical_files().unwrap();
    assert_eq!(history.len(), 1);
    assert!(file_name(&history[0].path).starts_with("archived-audit.log-"));
}

// ============================================================================
// Time rotation
// ============================================================================

#[test]
fn test_interval_rotation() {
    let temp_dir = TempDir::new().unwrap();
    let config = FileWriterConfig::for_testing().with_rotation(
        RotationConfig::new()
            .with_enabled(true)
            .with_interval(Some(Duration::from_millis(50)))
            .with_file_suffix(MILLIS_FORMAT),
    );
    let mut file = RotatingFile::open(temp_dir.path().join("audit.log"), &config).unwrap();
    file.write("tick\n").unwrap();
    assert!(!file.rotate_if_needed().unwrap());

    std::thread::sleep(Duration::from_millis(80));
    assert!(file.rotate_if_needed().unwrap());
    assert_eq!(historical_contents(&file), vec!["tick\n".to_string()]);
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

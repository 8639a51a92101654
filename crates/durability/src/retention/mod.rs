//! Retention policy system for historical audit files
//!
//! This module decides which historical files must go so the archive
//! directory does not grow unbounded.
//!
//! # Overview
//!
//! - Policies are pure: they inspect a [`HistorySnapshot`] and return files
//! - The caller unions every policy's selection and deletes the result
//! - Deletion is best-effort: a failure is logged and the rest still proceed
//! - A file that is already gone counts as deleted
//!
//! # Policy Types
//!
//! - **MaxFileCount**: Keep only the newest N historical files
//! - **MaxDiskSpace**: Keep the archive within a byte budget
//! - **MinFreeSpace**: Keep a free-space floor on the archive filesystem

mod policy;

pub use policy::{files_to_delete_union, HistorySnapshot, RetentionPolicy};

use std::collections::BTreeSet;
use std::io;
use std::path::PathBuf;
use tracing::{info, warn};

/// Outcome of one deletion pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionInfo {
    /// Files removed (or already gone)
    pub deleted: Vec<PathBuf>,
    /// Files that could not be removed
    pub failed: Vec<PathBuf>,
}

/// Delete every file in `files`, continuing past failures.
pub fn delete_files(files: BTreeSet<PathBuf>) -> RetentionInfo {
    let mut outcome = RetentionInfo::default();
    for path in files {
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!(target: "auditlog::retention", path = %path.display(), "Deleted historical file");
                outcome.deleted.push(path);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                outcome.deleted.push(path);
            }
            Err(e) => {
                warn!(
                    target: "auditlog::retention",
                    path = %path.display(),
                    error = %e,
                    "Could not delete historical file"
                );
                outcome.failed.push(path);
            }
        }
    }
    outcome
}

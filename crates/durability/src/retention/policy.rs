//! Retention policy types
//!
//! Select historical files for deletion so the archive stays within budget.
//! Policies never delete anything themselves; they only look at a
//! [`HistorySnapshot`] and return what should go.
//!
//! # Policy Types
//!
//! - **MaxFileCount(n)**: Keep only the newest N historical files
//! - **MaxDiskSpace(bytes)**: Keep historical files within a total byte budget
//! - **MinFreeSpace(bytes)**: Delete oldest files while the filesystem is below a free-space floor
//!
//! # Example
//!
//! ```ignore
//! use auditlog_durability::retention::{RetentionPolicy, HistorySnapshot};
//!
//! let policies = vec![
//!     RetentionPolicy::max_file_count(3),
//!     RetentionPolicy::max_disk_space(10 * 1024 * 1024),
//! ];
//! let snapshot = HistorySnapshot::capture(&naming, &policies)?;
//! let doomed = files_to_delete_union(&policies, &snapshot);
//! ```

use crate::naming::{HistoricalFile, TimestampNamingPolicy};
use auditlog_core::RetentionConfig;
use std::collections::BTreeSet;
use std::io;
use std::path::PathBuf;

/// A rule selecting historical files for deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionPolicy {
    /// Keep at most this many historical files.
    MaxFileCount(usize),

    /// Keep the historical files' combined size within this many bytes.
    MaxDiskSpace(u64),

    /// Keep at least this many bytes free on the archive filesystem.
    MinFreeSpace(u64),
}

impl RetentionPolicy {
    /// Create a MaxFileCount policy
    pub fn max_file_count(count: usize) -> Self {
        RetentionPolicy::MaxFileCount(count)
    }

    /// Create a MaxDiskSpace policy
    pub fn max_disk_space(bytes: u64) -> Self {
        RetentionPolicy::MaxDiskSpace(bytes)
    }

    /// Create a MinFreeSpace policy
    pub fn min_free_space(bytes: u64) -> Self {
        RetentionPolicy::MinFreeSpace(bytes)
    }

    /// Build the active policies from configuration.
    ///
    /// Non-positive limits mean unlimited and produce no policy.
    pub fn from_config(config: &RetentionConfig) -> Vec<RetentionPolicy> {
        let mut policies = Vec::new();
        if config.max_history_files > 0 {
            policies.push(RetentionPolicy::MaxFileCount(config.max_history_files as usize));
        }
        if config.max_disk_space > 0 {
            policies.push(RetentionPolicy::MaxDiskSpace(config.max_disk_space as u64));
        }
        if config.min_free_space > 0 {
            policies.push(RetentionPolicy::MinFreeSpace(config.min_free_space as u64));
        }
        policies
    }

    /// Whether evaluating this policy needs the filesystem's free space.
    pub fn needs_free_space(&self) -> bool {
        matches!(self, RetentionPolicy::MinFreeSpace(_))
    }

    /// Files this policy wants deleted, oldest first.
    ///
    /// `snapshot.files` must be ordered oldest to newest.
    pub fn files_to_delete<'a>(&self, snapshot: &'a HistorySnapshot) -> Vec<&'a HistoricalFile> {
        let files = &snapshot.files;
        match *self {
            RetentionPolicy::MaxFileCount(max) => {
                if max == 0 || files.len() <= max {
                    return Vec::new();
                }
                files[..files.len() - max].iter().collect()
            }
            RetentionPolicy::MaxDiskSpace(budget) => {
                if budget == 0 {
                    return Vec::new();
                }
                let used: u64 = files.iter().map(|f| f.size).sum();
                if used <= budget {
                    return Vec::new();
                }
                oldest_covering(files, used - budget)
            }
            RetentionPolicy::MinFreeSpace(floor) => match snapshot.free_space {
                Some(free) if free < floor => oldest_covering(files, floor - free),
                _ => Vec::new(),
            },
        }
    }
}

/// Historical listing plus the filesystem facts policies may need.
#[derive(Debug, Clone, Default)]
pub struct HistorySnapshot {
    /// Historical files, oldest first
    pub files: Vec<HistoricalFile>,
    /// Bytes available to this process on the archive filesystem, if known
    pub free_space: Option<u64>,
}

impl HistorySnapshot {
    /// Snapshot a listing with no free-space information.
    pub fn from_files(files: Vec<HistoricalFile>) -> Self {
        HistorySnapshot {
            files,
            free_space: None,
        }
    }

    /// List the naming policy's directory, querying free space only when a
    /// policy needs it.
    pub fn capture(
        naming: &TimestampNamingPolicy,
        policies: &[RetentionPolicy],
    ) -> io::Result<Self> {
        let files = naming.list_historical_files()?;
        let free_space = if policies.iter().any(RetentionPolicy::needs_free_space) {
            match fs2::available_space(naming.directory()) {
                Ok(bytes) => Some(bytes),
                Err(e) if e.kind() == io::ErrorKind::NotFound => None,
                Err(e) => return Err(e),
            }
        } else {
            None
        };
        Ok(HistorySnapshot { files, free_space })
    }
}

/// Union of every policy's delete set.
pub fn files_to_delete_union(
    policies: &[RetentionPolicy],
    snapshot: &HistorySnapshot,
) -> BTreeSet<PathBuf> {
    policies
        .iter()
        .flat_map(|p| p.files_to_delete(snapshot))
        .map(|f| f.path.clone())
        .collect()
}

/// Greedily take files from the oldest end until `needed` bytes are covered.
fn oldest_covering(files: &[HistoricalFile], needed: u64) -> Vec<&HistoricalFile> {
    let mut freed = 0u64;
    let mut selected = Vec::new();
    for file in files {
        if freed >= needed {
            break;
        }
        freed += file.size;
        selected.push(file);
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::{Duration, SystemTime};

    fn listing(sizes: &[u64]) -> HistorySnapshot {
        let files = sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| HistoricalFile {
                path: PathBuf::from(format!("audit.log-{i:04}")),
                size,
                modified: SystemTime::UNIX_EPOCH + Duration::from_secs(i as u64),
            })
            .collect();
        HistorySnapshot::from_files(files)
    }

    fn names(files: Vec<&HistoricalFile>) -> Vec<String> {
        files
            .into_iter()
            .map(|f| f.path.display().to_string())
            .collect()
    }

    #[test]
    fn test_from_config_unlimited() {
        assert!(RetentionPolicy::from_config(&RetentionConfig::default()).is_empty());
        let config = RetentionConfig::new()
            .with_max_history_files(0)
            .with_max_disk_space(-5);
        assert!(RetentionPolicy::from_config(&config).is_empty());
    }

    #[test]
    fn test_from_config_all() {
        let config = RetentionConfig::new()
            .with_max_history_files(3)
            .with_max_disk_space(300)
            .with_min_free_space(1024);
        assert_eq!(
            RetentionPolicy::from_config(&config),
            vec![
                RetentionPolicy::MaxFileCount(3),
                RetentionPolicy::MaxDiskSpace(300),
                RetentionPolicy::MinFreeSpace(1024),
            ]
        );
    }

    #[test]
    fn test_count_within_budget() {
        let snapshot = listing(&[1, 1, 1]);
        assert!(RetentionPolicy::max_file_count(3)
            .files_to_delete(&snapshot)
            .is_empty());
    }

    #[test]
    fn test_count_deletes_oldest() {
        let snapshot = listing(&[1, 1, 1, 1, 1]);
        let doomed = RetentionPolicy::max_file_count(3).files_to_delete(&snapshot);
        assert_eq!(names(doomed), vec!["audit.log-0000", "audit.log-0001"]);
    }

    #[test]
    fn test_disk_space_within_budget() {
        let snapshot = listing(&[100, 100, 100]);
        assert!(RetentionPolicy::max_disk_space(300)
            .files_to_delete(&snapshot)
            .is_empty());
    }

    #[test]
    fn test_disk_space_greedy_oldest() {
        // 450 used, budget 300: need 150 freed, oldest two cover it
        let snapshot = listing(&[100, 100, 200, 50]);
        let doomed = RetentionPolicy::max_disk_space(300).files_to_delete(&snapshot);
        assert_eq!(names(doomed), vec!["audit.log-0000", "audit.log-0001"]);
    }

    #[test]
    fn test_disk_space_single_large_file() {
        let snapshot = listing(&[1000, 10, 10]);
        let doomed = RetentionPolicy::max_disk_space(500).files_to_delete(&snapshot);
        assert_eq!(names(doomed), vec!["audit.log-0000"]);
    }

    #[test]
    fn test_free_space_unknown_deletes_nothing() {
        let snapshot = listing(&[100, 100]);
        assert!(RetentionPolicy::min_free_space(u64::MAX)
            .files_to_delete(&snapshot)
            .is_empty());
    }

    #[test]
    fn test_free_space_below_floor() {
        let mut snapshot = listing(&[100, 100, 100]);
        snapshot.free_space = Some(850);
        let doomed = RetentionPolicy::min_free_space(1000).files_to_delete(&snapshot);
        assert_eq!(names(doomed), vec!["audit.log-0000", "audit.log-0001"]);

        snapshot.free_space = Some(1000);
        assert!(RetentionPolicy::min_free_space(1000)
            .files_to_delete(&snapshot)
            .is_empty());
    }

    #[test]
    fn test_union_deduplicates() {
        let snapshot = listing(&[100, 100, 100, 100]);
        let policies = [
            RetentionPolicy::max_file_count(3),
            RetentionPolicy::max_disk_space(200),
        ];
        let doomed = files_to_delete_union(&policies, &snapshot);
        assert_eq!(doomed.len(), 2);
        assert!(doomed.contains(&PathBuf::from("audit.log-0000")));
        assert!(doomed.contains(&PathBuf::from("audit.log-0001")));
    }

    proptest! {
        #[test]
        fn prop_count_keeps_newest(len in 0usize..40, max in 1usize..20) {
            let snapshot = listing(&vec![1; len]);
            let doomed = RetentionPolicy::max_file_count(max).files_to_delete(&snapshot);
            prop_assert_eq!(len - doomed.len(), len.min(max));
            for (i, f) in doomed.iter().enumerate() {
                prop_assert_eq!(&f.path, &snapshot.files[i].path);
            }
        }

        #[test]
        fn prop_disk_space_is_minimal_oldest_prefix(
            sizes in proptest::collection::vec(0u64..500, 0..30),
            budget in 1u64..3000,
        ) {
            let snapshot = listing(&sizes);
            let doomed = RetentionPolicy::max_disk_space(budget).files_to_delete(&snapshot);
            let total: u64 = sizes.iter().sum();
            let freed: u64 = doomed.iter().map(|f| f.size).sum();

            // stays within budget
            prop_assert!(total - freed <= budget);
            // takes a prefix of the oldest files
            for (i, f) in doomed.iter().enumerate() {
                prop_assert_eq!(&f.path, &snapshot.files[i].path);
            }
            // stops as soon as enough was freed
            if let Some(last) = doomed.last() {
                prop_assert!(total - (freed - last.size) > budget);
            }
        }
    }
}

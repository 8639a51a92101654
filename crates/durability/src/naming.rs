//! Historical file naming.
//!
//! Historical files live next to the active file and are named
//! `<prefix><base name><timestamp>[.<collision>]`, where the timestamp is
//! rendered with a chrono strftime format in UTC. The naming convention is
//! the only persisted index: every listing is rebuilt from the directory.

use auditlog_core::DEFAULT_ROTATION_FILE_SUFFIX;
use chrono::format::{parse, Item, Parsed, StrftimeItems};
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::warn;

/// A closed file produced by a rotation, as seen on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoricalFile {
    /// Full path
    pub path: PathBuf,
    /// Size in bytes at listing time
    pub size: u64,
    /// Last modification time at listing time
    pub modified: SystemTime,
}

/// Generates timestamped names for historical files and lists existing ones.
#[derive(Debug, Clone)]
pub struct TimestampNamingPolicy {
    initial: PathBuf,
    dir: PathBuf,
    base_name: String,
    prefix: String,
    format: String,
}

impl TimestampNamingPolicy {
    /// Create a naming policy for the active file at `initial`.
    ///
    /// An empty or unparsable `suffix_format` is replaced by
    /// [`DEFAULT_ROTATION_FILE_SUFFIX`] with a warning.
    pub fn new(initial: impl Into<PathBuf>, suffix_format: &str, prefix: &str) -> Self {
        let initial = initial.into();
        let dir = match initial.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let base_name = initial
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let format = if is_valid_format(suffix_format) {
            suffix_format.to_string()
        } else {
            warn!(
                target: "auditlog::naming",
                format = suffix_format,
                default = DEFAULT_ROTATION_FILE_SUFFIX,
                "Invalid rotation file suffix, using default"
            );
            DEFAULT_ROTATION_FILE_SUFFIX.to_string()
        };

        TimestampNamingPolicy {
            initial,
            dir,
            base_name,
            prefix: prefix.to_string(),
            format,
        }
    }

    /// Path of the active file.
    pub fn initial_file(&self) -> &Path {
        &self.initial
    }

    /// Directory holding the active and historical files.
    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// The timestamp format actually in use.
    pub fn format(&self) -> &str {
        &self.format
    }

    /// The name a rotation at `now` would use for the given collision count.
    ///
    /// Collision 0 is the plain timestamped name; `n > 0` appends `.n`.
    pub fn candidate(&self, now: DateTime<Utc>, collision: u32) -> PathBuf {
        let mut name = String::with_capacity(
            self.prefix.len() + self.base_name.len() + self.format.len() + 8,
        );
        name.push_str(&self.prefix);
        name.push_str(&self.base_name);
        if write!(name, "{}", now.format(&self.format)).is_err() {
            // validated at construction; only reachable with exotic specifiers
            let _ = write!(name, "{}", now.format(DEFAULT_ROTATION_FILE_SUFFIX));
        }
        if collision > 0 {
            let _ = write!(name, ".{}", collision);
        }
        self.dir.join(name)
    }

    /// First free historical name for a rotation at `now`.
    ///
    /// Does not create the file.
    pub fn next_name(&self, now: DateTime<Utc>) -> io::Result<PathBuf> {
        let mut collision = 0u32;
        loop {
            let candidate = self.candidate(now, collision);
            if !candidate.try_exists()? {
                return Ok(candidate);
            }
            collision += 1;
        }
    }

    /// Whether `file_name` belongs to this policy's historical set.
    pub fn matches(&self, file_name: &str) -> bool {
        let Some(rest) = file_name
            .strip_prefix(self.prefix.as_str())
            .and_then(|r| r.strip_prefix(self.base_name.as_str()))
        else {
            return false;
        };
        if rest.is_empty() {
            return false;
        }
        if self.parses_timestamp(rest) {
            return true;
        }
        match rest.rsplit_once('.') {
            Some((stamp, counter))
                if !counter.is_empty() && counter.bytes().all(|b| b.is_ascii_digit()) =>
            {
                self.parses_timestamp(stamp)
            }
            _ => false,
        }
    }

    /// All historical files, oldest first by modification time.
    ///
    /// A missing directory yields an empty listing. Files that vanish while
    /// listing are skipped.
    pub fn list_historical_files(&self) -> io::Result<Vec<HistoricalFile>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !self.matches(name) {
                continue;
            }
            let path = entry.path();
            if path == self.initial {
                continue;
            }
            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            };
            if !metadata.is_file() {
                continue;
            }
            files.push(HistoricalFile {
                path,
                size: metadata.len(),
                modified: metadata.modified()?,
            });
        }

        sort_oldest_first(&mut files);
        Ok(files)
    }

    fn parses_timestamp(&self, text: &str) -> bool {
        let mut parsed = Parsed::new();
        parse(&mut parsed, text, StrftimeItems::new(&self.format)).is_ok()
    }
}

/// Order by modification time, breaking ties by path.
pub(crate) fn sort_oldest_first(files: &mut [HistoricalFile]) {
    files.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));
}

fn is_valid_format(format: &str) -> bool {
    !format.is_empty() && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

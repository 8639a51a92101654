//! Rotating file controller.
//!
//! Owns the active file and swaps it into history when a rotation rule
//! fires, then prunes history with the retention policies.
//!
//! # Rotation
//!
//! 1. Flush and close the active file
//! 2. Ask the naming policy for a free historical name
//! 3. Rename the active file to that name
//! 4. Open a fresh file at the active path, reset counters
//! 5. Run retention and delete what it selects
//!
//! If step 3 fails the active file is reopened and keeps receiving writes.
//! If step 4 fails the archive is moved back before the error is returned.
//! After a failed rotation, rule-driven rotations are not retried until the
//! check interval has passed. If the active file cannot be reopened, the
//! next write tries again.

use super::hooks::{NoOpHooks, RotationContext, RotationHooks};
use super::policy::{ActiveFileState, RotationPolicy};
use crate::naming::TimestampNamingPolicy;
use crate::retention::{self, HistorySnapshot, RetentionInfo, RetentionPolicy};
use crate::sink::MeteredSink;
use auditlog_core::{Error, FileWriterConfig, Result};
use chrono::Utc;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use tracing::{error, info, trace, warn};

type ActiveSink = MeteredSink<BufWriter<File>>;

/// The active file plus everything needed to rotate it.
///
/// Not internally synchronized: share it behind a mutex (see
/// [`crate::writer::AsyncWriter`]) when more than one thread needs it.
pub struct RotatingFile {
    path: PathBuf,
    naming: TimestampNamingPolicy,
    rotation_policies: Vec<RotationPolicy>,
    retention_policies: Vec<RetentionPolicy>,
    sink: ActiveSink,
    created_at: SystemTime,
    hooks: Box<dyn RotationHooks>,
    retry_interval: Duration,
    retry_after: Option<Instant>,
    closed: bool,
    #[cfg(test)]
    failing_opens: u32,
}

impl RotatingFile {
    /// Open (or create) the active file at `path`.
    ///
    /// When appending to an existing non-empty file, its age is taken from
    /// the file's on-disk timestamps so time-based rotation survives restarts.
    pub fn open(path: impl Into<PathBuf>, config: &FileWriterConfig) -> Result<Self> {
        config.validate()?;
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let naming = TimestampNamingPolicy::new(
            path.clone(),
            &config.rotation.file_suffix,
            &config.rotation.file_prefix,
        );

        let existing = if config.append {
            std::fs::metadata(&path).ok().filter(|m| m.len() > 0)
        } else {
            None
        };
        let created_at = existing
            .as_ref()
            .and_then(|m| m.created().or_else(|_| m.modified()).ok())
            .unwrap_or_else(SystemTime::now);

        let sink = open_sink(&path, config.append)?;

        info!(
            target: "auditlog::rotation",
            path = %path.display(),
            bytes = sink.bytes_written(),
            "Opened active audit file"
        );

        Ok(RotatingFile {
            path,
            naming,
            rotation_policies: RotationPolicy::from_config(&config.rotation),
            retention_policies: RetentionPolicy::from_config(&config.retention),
            sink,
            created_at,
            hooks: Box::new(NoOpHooks),
            retry_interval: config.check_interval,
            retry_after: None,
            closed: false,
            #[cfg(test)]
            failing_opens: 0,
        })
    }

    /// Replace the rotation hooks.
    pub fn set_hooks(&mut self, hooks: Box<dyn RotationHooks>) {
        self.hooks = hooks;
    }

    /// Append a record to the active file.
    ///
    /// Reopens the active file first if a failed rotation left it closed.
    pub fn write(&mut self, text: &str) -> Result<()> {
        trace!(target: "auditlog::rotation", bytes = text.len(), "Writing record");
        self.ensure_open()?;
        self.sink.write_str(text)?;
        Ok(())
    }

    /// Flush buffered bytes to the active file.
    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }

    /// Bytes written to the active file since it was created.
    ///
    /// Zero right after a rotation unless a post-rotation hook wrote a header.
    pub fn bytes_written(&self) -> u64 {
        self.sink.bytes_written()
    }

    /// Creation time of the active file, i.e. the time of the last rotation.
    pub fn last_rotation_time(&self) -> SystemTime {
        self.created_at
    }

    /// Active file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Naming policy in use.
    pub fn naming(&self) -> &TimestampNamingPolicy {
        &self.naming
    }

    /// Whether any configured rotation rule fires at `now`.
    pub fn should_rotate(&self, now: SystemTime) -> bool {
        let state = ActiveFileState {
            bytes_written: self.sink.bytes_written(),
            created_at: self.created_at,
        };
        self.rotation_policies
            .iter()
            .any(|p| p.should_rotate(&state, now))
    }

    /// Rotate if a rotation rule fires. Returns whether a rotation happened.
    ///
    /// After a failed rotation this returns `Ok(false)` until the check
    /// interval has passed.
    pub fn rotate_if_needed(&mut self) -> Result<bool> {
        if let Some(retry_after) = self.retry_after {
            if Instant::now() < retry_after {
                return Ok(false);
            }
        }
        if !self.should_rotate(SystemTime::now()) {
            return Ok(false);
        }
        trace!(target: "auditlog::rotation", path = %self.path.display(), "Must rotate");
        self.rotate_tracked()
    }

    /// Rotate regardless of the rules and of any retry delay. Returns whether
    /// a rotation happened.
    pub fn force_rotation(&mut self) -> Result<bool> {
        self.rotate_tracked()
    }

    /// Apply the retention policies to the current history.
    ///
    /// Failures are logged; retention never fails the caller.
    pub fn enforce_retention(&self) -> RetentionInfo {
        if self.retention_policies.is_empty() {
            return RetentionInfo::default();
        }
        let snapshot = match HistorySnapshot::capture(&self.naming, &self.retention_policies) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(
                    target: "auditlog::retention",
                    path = %self.path.display(),
                    error = %e,
                    "Failed to list historical files"
                );
                return RetentionInfo::default();
            }
        };
        let doomed = retention::files_to_delete_union(&self.retention_policies, &snapshot);
        retention::delete_files(doomed)
    }

    /// Flush and close the active file. Further writes fail.
    pub fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.sink.close()?;
        Ok(())
    }

    fn rotate_tracked(&mut self) -> Result<bool> {
        let result = self.rotate();
        self.retry_after = match result {
            Err(_) if !self.retry_interval.is_zero() => Some(Instant::now() + self.retry_interval),
            _ => None,
        };
        result
    }

    fn rotate(&mut self) -> Result<bool> {
        if !self.path.try_exists()? {
            return Ok(false);
        }
        self.ensure_open()?;

        let historical = self.naming.next_name(Utc::now())?;
        let ctx = RotationContext {
            active: &self.path,
            historical: &historical,
        };
        self.hooks.pre_rotation(&ctx, &mut self.sink)?;

        if let Err(e) = self.sink.close() {
            self.restore_active();
            return Err(e.into());
        }

        trace!(
            target: "auditlog::rotation",
            from = %self.path.display(),
            to = %historical.display(),
            "Renaming active file"
        );
        if let Err(source) = std::fs::rename(&self.path, &historical) {
            error!(
                target: "auditlog::rotation",
                path = %self.path.display(),
                error = %source,
                "Unable to rename the audit file; writes continue to the current file"
            );
            self.restore_active();
            return Err(Error::Rotation {
                from: self.path.clone(),
                to: historical,
                source,
            });
        }

        match self.reopen() {
            Ok(sink) => self.sink = sink,
            Err(source) => {
                error!(
                    target: "auditlog::rotation",
                    path = %self.path.display(),
                    error = %source,
                    "Unable to open a fresh audit file; restoring the previous one"
                );
                match std::fs::rename(&historical, &self.path) {
                    Ok(()) => self.restore_active(),
                    Err(e) => error!(
                        target: "auditlog::rotation",
                        archived = %historical.display(),
                        error = %e,
                        "Unable to move the archived audit file back"
                    ),
                }
                return Err(Error::Rotation {
                    from: self.path.clone(),
                    to: historical,
                    source,
                });
            }
        }
        self.created_at = SystemTime::now();

        info!(
            target: "auditlog::rotation",
            path = %self.path.display(),
            archived = %historical.display(),
            "Rotated audit file"
        );

        let ctx = RotationContext {
            active: &self.path,
            historical: &historical,
        };
        if let Err(e) = self.hooks.post_rotation(&ctx, &mut self.sink) {
            warn!(
                target: "auditlog::rotation",
                path = %self.path.display(),
                error = %e,
                "Post-rotation hook failed"
            );
        }

        self.enforce_retention();
        Ok(true)
    }

    /// Reopen the active file if a failed rotation left it closed.
    fn ensure_open(&mut self) -> io::Result<()> {
        if self.sink.is_closed() && !self.closed {
            self.sink = self.reopen()?;
            info!(target: "auditlog::rotation", path = %self.path.display(), "Reopened active audit file");
        }
        Ok(())
    }

    /// Reopen the active file after a failed rotation step; a failure here is
    /// logged and left for the next write to retry.
    fn restore_active(&mut self) {
        match self.reopen() {
            Ok(sink) => self.sink = sink,
            Err(e) => error!(
                target: "auditlog::rotation",
                path = %self.path.display(),
                error = %e,
                "Unable to reopen the audit file; the next write retries"
            ),
        }
    }

    fn reopen(&mut self) -> io::Result<ActiveSink> {
        if let Some(e) = self.simulated_open_failure() {
            return Err(e);
        }
        open_sink(&self.path, true)
    }

    #[cfg(not(test))]
    fn simulated_open_failure(&mut self) -> Option<io::Error> {
        None
    }

    #[cfg(test)]
    fn simulated_open_failure(&mut self) -> Option<io::Error> {
        if self.failing_opens == 0 {
            return None;
        }
        self.failing_opens -= 1;
        Some(io::Error::new(io::ErrorKind::Other, "simulated open failure"))
    }
}

impl Drop for RotatingFile {
    fn drop(&mut self) {
        let _ = self.sink.close();
    }
}

fn open_sink(path: &Path, append: bool) -> io::Result<ActiveSink> {
    let mut options = OpenOptions::new();
    options.create(true);
    if append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }
    let file = options.open(path)?;
    let initial = if append { file.metadata()?.len() } else { 0 };
    Ok(MeteredSink::new(BufWriter::new(file), initial))
}

//! Rotation rules.
//!
//! Rules are evaluated in a fixed order: size first, then age, then the
//! daily schedule. The first rule that fires triggers the rotation.

use auditlog_core::RotationConfig;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// What a rule needs to know about the active file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveFileState {
    /// Bytes written to the active file
    pub bytes_written: u64,
    /// When the active file was created (or last rotated)
    pub created_at: SystemTime,
}

/// A condition under which the active file must be rotated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationPolicy {
    /// Rotate once the active file holds at least this many bytes.
    MaxFileSize(u64),

    /// Rotate once the active file is at least this old.
    Interval(Duration),

    /// Rotate whenever one of these offsets from UTC midnight has passed
    /// since the active file was created.
    DailyTimes(Vec<Duration>),
}

impl RotationPolicy {
    /// Build the active rules from configuration, in evaluation order.
    ///
    /// Returns nothing when rotation is disabled.
    pub fn from_config(config: &RotationConfig) -> Vec<RotationPolicy> {
        let mut policies = Vec::new();
        if !config.enabled {
            return policies;
        }
        if config.max_file_size > 0 {
            policies.push(RotationPolicy::MaxFileSize(config.max_file_size));
        }
        if let Some(interval) = config.interval.filter(|d| !d.is_zero()) {
            policies.push(RotationPolicy::Interval(interval));
        }
        if !config.daily_times.is_empty() {
            policies.push(RotationPolicy::DailyTimes(config.daily_times.clone()));
        }
        policies
    }

    /// Whether this rule wants the active file rotated at `now`.
    pub fn should_rotate(&self, state: &ActiveFileState, now: SystemTime) -> bool {
        match self {
            RotationPolicy::MaxFileSize(max) => state.bytes_written >= *max,
            RotationPolicy::Interval(interval) => now
                .duration_since(state.created_at)
                .map(|age| age >= *interval)
                .unwrap_or(false),
            RotationPolicy::DailyTimes(offsets) => offsets
                .iter()
                .filter_map(|offset| last_occurrence(*offset, now))
                .any(|scheduled| state.created_at < scheduled),
        }
    }
}

/// Most recent instant at or before `now` that is `offset` past a UTC midnight.
fn last_occurrence(offset: Duration, now: SystemTime) -> Option<SystemTime> {
    let since_epoch = now.duration_since(UNIX_EPOCH).ok()?;
    let midnight = UNIX_EPOCH + Duration::from_secs(since_epoch.as_secs() / DAY.as_secs() * DAY.as_secs());
    let offset = Duration::from_nanos((offset.as_nanos() % DAY.as_nanos()) as u64);
    let scheduled = midnight + offset;
    if scheduled <= now {
        Some(scheduled)
    } else {
        scheduled.checked_sub(DAY)
    }
}

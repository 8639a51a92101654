//! Writer configuration
//!
//! Value objects describing rotation, retention and the asynchronous
//! writer. They are loaded from TOML or built in code, and are immutable
//! once handed to a writer.

use crate::duration;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default suffix appended to historical file names (chrono strftime syntax).
pub const DEFAULT_ROTATION_FILE_SUFFIX: &str = "-%Y.%m.%d-%H.%M.%S";

/// Default capacity of the producer queue.
pub const DEFAULT_BUFFER_CAPACITY: usize = 5000;

/// Rotation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Master switch; when false the active file grows forever.
    pub enabled: bool,

    /// Rotate once the active file reaches this many bytes (0 = off).
    pub max_file_size: u64,

    /// Rotate once the active file is this old (`None` = off).
    #[serde(with = "duration::optional")]
    pub interval: Option<Duration>,

    /// Rotate at these offsets from UTC midnight, every day.
    #[serde(with = "duration::list")]
    pub daily_times: Vec<Duration>,

    /// Prefix prepended to historical file names.
    pub file_prefix: String,

    /// Timestamp format appended to historical file names.
    pub file_suffix: String,
}

impl Default for RotationConfig {
    fn default() -> Self {
        RotationConfig {
            enabled: false,
            max_file_size: 0,
            interval: None,
            daily_times: Vec::new(),
            file_prefix: String::new(),
            file_suffix: DEFAULT_ROTATION_FILE_SUFFIX.to_string(),
        }
    }
}

impl RotationConfig {
    /// Create a disabled rotation configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable rotation (builder pattern).
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the size threshold (builder pattern).
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Set the age threshold (builder pattern).
    pub fn with_interval(mut self, interval: Option<Duration>) -> Self {
        self.interval = interval.filter(|d| !d.is_zero());
        self
    }

    /// Set the daily rotation times (builder pattern).
    pub fn with_daily_times(mut self, times: Vec<Duration>) -> Self {
        self.daily_times = times;
        self
    }

    /// Set the historical file prefix (builder pattern).
    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    /// Set the historical file timestamp format (builder pattern).
    pub fn with_file_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.file_suffix = suffix.into();
        self
    }

    /// Whether any rotation rule would ever fire.
    pub fn has_rules(&self) -> bool {
        self.enabled
            && (self.max_file_size > 0 || self.interval.is_some() || !self.daily_times.is_empty())
    }
}

/// Retention settings. Non-positive values mean unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Maximum number of historical files to keep.
    pub max_history_files: i64,

    /// Maximum bytes all historical files may occupy together.
    pub max_disk_space: i64,

    /// Minimum free bytes to keep available on the archive filesystem.
    pub min_free_space: i64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        RetentionConfig {
            max_history_files: -1,
            max_disk_space: -1,
            min_free_space: -1,
        }
    }
}

impl RetentionConfig {
    /// Create an unlimited retention configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the history file count budget (builder pattern).
    pub fn with_max_history_files(mut self, count: i64) -> Self {
        self.max_history_files = count;
        self
    }

    /// Set the disk space budget (builder pattern).
    pub fn with_max_disk_space(mut self, bytes: i64) -> Self {
        self.max_disk_space = bytes;
        self
    }

    /// Set the free space floor (builder pattern).
    pub fn with_min_free_space(mut self, bytes: i64) -> Self {
        self.min_free_space = bytes;
        self
    }

    /// Whether any retention rule is active.
    pub fn has_rules(&self) -> bool {
        self.max_history_files > 0 || self.max_disk_space > 0 || self.min_free_space > 0
    }
}

/// Full configuration of a rotating file writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileWriterConfig {
    /// How often rotation and retention are re-checked when idle (default: 5s).
    #[serde(with = "duration::required")]
    pub check_interval: Duration,

    /// Producer queue capacity (default: 5000).
    pub buffer_capacity: usize,

    /// Flush the file after every drained batch.
    pub auto_flush: bool,

    /// Append to an existing active file instead of truncating it.
    pub append: bool,

    /// How long the consumer waits for a record before re-checking state (default: 100ms).
    #[serde(with = "duration::required")]
    pub poll_timeout: Duration,

    /// Upper bound on waiting for the consumer to drain at shutdown (default: 10s).
    #[serde(with = "duration::required")]
    pub shutdown_timeout: Duration,

    /// Rotation rules
    pub rotation: RotationConfig,

    /// Retention rules
    pub retention: RetentionConfig,
}

impl Default for FileWriterConfig {
    fn default() -> Self {
        FileWriterConfig {
            check_interval: Duration::from_secs(5),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            auto_flush: true,
            append: true,
            poll_timeout: Duration::from_millis(100),
            shutdown_timeout: Duration::from_secs(10),
            rotation: RotationConfig::default(),
            retention: RetentionConfig::default(),
        }
    }
}

impl FileWriterConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration optimized for testing (short timeouts, small queue).
    pub fn for_testing() -> Self {
        FileWriterConfig {
            check_interval: Duration::from_millis(50),
            buffer_capacity: 64,
            poll_timeout: Duration::from_millis(10),
            shutdown_timeout: Duration::from_secs(5),
            ..Default::default()
        }
    }

    /// Set rotation rules (builder pattern).
    pub fn with_rotation(mut self, rotation: RotationConfig) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set retention rules (builder pattern).
    pub fn with_retention(mut self, retention: RetentionConfig) -> Self {
        self.retention = retention;
        self
    }

    /// Set the check interval (builder pattern).
    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    /// Set the queue capacity (builder pattern).
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Set auto-flush (builder pattern).
    pub fn with_auto_flush(mut self, auto_flush: bool) -> Self {
        self.auto_flush = auto_flush;
        self
    }

    /// Set append mode (builder pattern).
    pub fn with_append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_capacity == 0 {
            return Err(ConfigError::InvalidBufferCapacity);
        }
        if (self.rotation.has_rules() || self.retention.has_rules())
            && self.check_interval.is_zero()
        {
            return Err(ConfigError::InvalidCheckInterval);
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: FileWriterConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Serialize this config to TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Audit log writer configuration
#
# How often rotation and retention are re-checked while idle.
check_interval = "5s"

# Producer queue capacity; producers block when it is full.
buffer_capacity = 5000

# Flush the active file after every drained batch.
auto_flush = true

[rotation]
enabled = false
# Rotate once the active file reaches this many bytes (0 = disabled).
max_file_size = 0
# Rotate once the active file is this old ("disabled" to turn off).
interval = "disabled"
# Rotate every day at these offsets from UTC midnight.
daily_times = []
file_prefix = ""
file_suffix = "-%Y.%m.%d-%H.%M.%S"

[retention]
# Values <= 0 mean unlimited.
max_history_files = -1
max_disk_space = -1
min_free_space = -1
"#
    }
}

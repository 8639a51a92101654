//! auditlog - Durable, rotating, retention-bounded audit log writer
//!
//! Producers hand text records to an [`AsyncWriter`]; one consumer thread
//! appends them to an active file, rotates it into timestamped historical
//! files when a size, age, or time-of-day rule fires, and deletes the oldest
//! history once a count, disk-space, or free-space budget is exceeded.
//!
//! # Quick Start
//!
//! ```ignore
//! use auditlog::{AsyncWriter, FileWriterConfig, RetentionConfig, RotationConfig};
//!
//! let config = FileWriterConfig::new()
//!     .with_rotation(RotationConfig::new().with_enabled(true).with_max_file_size(10 << 20))
//!     .with_retention(RetentionConfig::new().with_max_history_files(7));
//!
//! let writer = AsyncWriter::open("/var/log/app/audit.log", &config)?;
//! writer.write("user=alice action=login\n")?;
//! writer.shutdown();
//! ```
//!
//! Configuration can also be loaded from TOML with [`FileWriterConfig::from_file`].

pub use auditlog_core::*;
pub use auditlog_durability::*;

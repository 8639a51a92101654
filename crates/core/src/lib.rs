//! Core types for auditlog
//!
//! This crate defines the foundational types used throughout the system:
//! - Error: Error type hierarchy (I/O, closed writer, rotation, config)
//! - Config: Rotation, retention and writer configuration value objects
//! - Duration: Human-readable duration parsing for configuration files

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod duration;
pub mod error;

pub use config::{
    FileWriterConfig, RetentionConfig, RotationConfig, DEFAULT_BUFFER_CAPACITY,
    DEFAULT_ROTATION_FILE_SUFFIX,
};
pub use duration::parse_duration;
pub use error::{ConfigError, Error, Result};

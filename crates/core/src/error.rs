//! Error types for auditlog
//!
//! This module defines the error taxonomy shared by the sink, the rotation
//! controller and the asynchronous writer.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for auditlog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the audit log writer
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error while writing, flushing or opening the active file
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The writer was stopped before the record was accepted
    #[error("writer closed")]
    WriterClosed,

    /// Rotation could not swap the active file; the previous active file
    /// keeps receiving writes
    #[error("failed to rotate {} to {}: {source}", from.display(), to.display())]
    Rotation {
        /// Active file path
        from: PathBuf,
        /// Historical file path that was attempted
        to: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Returns true if this error means the record was refused because the
    /// writer had already been stopped.
    pub fn is_closed(&self) -> bool {
        matches!(self, Error::WriterClosed)
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A duration string could not be parsed
    #[error("invalid {field} value '{value}'")]
    InvalidDuration {
        /// Which setting was being parsed
        field: &'static str,
        /// Offending input
        value: String,
    },

    /// Rotation or retention rules are active but nothing would ever check them
    #[error("rotation and retention check interval must be non-zero when a policy is enabled")]
    InvalidCheckInterval,

    /// Queue capacity of zero would block every producer forever
    #[error("buffer capacity must be at least 1")]
    InvalidBufferCapacity,

    /// Config file could not be read
    #[error("failed to read config file '{path}': {message}")]
    Read {
        /// File path
        path: String,
        /// OS error text
        message: String,
    },

    /// Config file is not valid TOML for this schema
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// Config could not be rendered as TOML
    #[error("failed to serialize config: {0}")]
    Serialize(String),
}

//! Durability layer for auditlog
//!
//! This crate handles everything that touches disk:
//!
//! - Byte-counting sink over the active file
//! - Timestamped naming of historical files and archive listing
//! - Retention policies: file count, disk budget, free-space floor
//! - Rotation rules and the rotating file controller
//! - Asynchronous writer with a bounded queue and one consumer thread

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod naming; // Historical file names and listing
pub mod retention; // Which historical files to delete
pub mod rotation; // Rotation rules, hooks, and the active file controller
pub mod sink; // Byte-counting write decorator
pub mod writer; // Bounded queue + consumer thread

// === Re-exports ===
pub use naming::{HistoricalFile, TimestampNamingPolicy};
pub use retention::{files_to_delete_union, HistorySnapshot, RetentionInfo, RetentionPolicy};
pub use rotation::{
    ActiveFileState, NoOpHooks, RotatingFile, RotationContext, RotationHooks, RotationPolicy,
    SharedRotatingFile,
};
pub use sink::MeteredSink;
pub use writer::AsyncWriter;

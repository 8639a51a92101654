//! File rotation
//!
//! [`RotatingFile`] owns the active audit file. It rotates the file into
//! history when one of its [`RotationPolicy`] rules fires, then runs the
//! retention policies over the archive.
//!
//! # Rules
//!
//! - **MaxFileSize**: bytes written to the active file reached a threshold
//! - **Interval**: the active file reached a maximum age
//! - **DailyTimes**: a fixed time of day passed since the last rotation

mod controller;
mod hooks;
mod policy;

pub use controller::RotatingFile;
pub use hooks::{NoOpHooks, RotationContext, RotationHooks};
pub use policy::{ActiveFileState, RotationPolicy};

use parking_lot::Mutex;
use std::sync::Arc;

/// A rotating file shared between the writer thread and out-of-band callers.
pub type SharedRotatingFile = Arc<Mutex<RotatingFile>>;

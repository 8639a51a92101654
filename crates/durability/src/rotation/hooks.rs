//! Rotation hooks.

use std::io::{self, Write};
use std::path::Path;

/// Paths involved in a rotation.
#[derive(Debug, Clone, Copy)]
pub struct RotationContext<'a> {
    /// The active file path (stable across rotations)
    pub active: &'a Path,
    /// Where the active file is being archived
    pub historical: &'a Path,
}

/// Callbacks run around a rotation.
///
/// `pre_rotation` may append a trailer to the outgoing file; an error aborts
/// the rotation and leaves the active file in place. If the rotation then
/// fails for another reason the trailer stays in the active file.
///
/// `post_rotation` may write a header into the fresh file; an error there is
/// only logged. The header counts toward the new file's bytes written, so
/// with a header the counter is not zero right after a rotation.
pub trait RotationHooks: Send {
    /// Called before the active file is closed and renamed.
    fn pre_rotation(&mut self, _ctx: &RotationContext<'_>, _out: &mut dyn Write) -> io::Result<()> {
        Ok(())
    }

    /// Called once the fresh active file is open.
    fn post_rotation(&mut self, _ctx: &RotationContext<'_>, _out: &mut dyn Write) -> io::Result<()> {
        Ok(())
    }
}

/// Hooks that do nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHooks;

impl RotationHooks for NoOpHooks {}

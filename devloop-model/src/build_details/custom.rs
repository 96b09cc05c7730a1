use crate::build_details::FastBuild;
use crate::live_update::LiveUpdate;
use std::path::PathBuf;

/// Delegates producing the image to a user-supplied command.
///
/// `deps` lists the local paths whose changes trigger a rebuild. `fast` only carries fast-build
/// and live-update data for the acceleration logic, it is never built on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomBuild {
    pub command: String,
    pub deps: Vec<PathBuf>,
    /// Tag the command is expected to produce, if it does not honor the expected reference.
    pub tag: String,
    /// The command pushes the image itself, or the image never needs pushing.
    pub disable_push: bool,
    pub fast: FastBuild,
    pub live_update: LiveUpdate,
}

impl CustomBuild {
    pub(crate) fn has_command(&self) -> bool {
        !self.command.trim().is_empty()
    }
}

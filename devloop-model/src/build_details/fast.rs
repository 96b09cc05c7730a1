use crate::cmd::Cmd;
use crate::live_update::LiveUpdate;
use serde::Deserialize;
use std::path::PathBuf;

/// An iterative build: a base image described by `base_dockerfile`, with local files synced
/// and commands run on top of it.
///
/// The default value is the empty sentinel returned by
/// [`ImageTarget::any_fast_build_info`](crate::image_target::ImageTarget::any_fast_build_info)
/// when no fast build is configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FastBuild {
    pub base_dockerfile: String,
    pub syncs: Vec<FileSync>,
    pub runs: Vec<Run>,
    pub entrypoint: Cmd,
    /// Restart the entrypoint in place instead of restarting the container after an update.
    pub hot_reload: bool,
    pub live_update: LiveUpdate,
}

impl FastBuild {
    /// Whether no field is set. A live update without steps counts as unset, whatever its base
    /// directory.
    pub fn is_empty(&self) -> bool {
        self.base_dockerfile.is_empty()
            && self.syncs.is_empty()
            && self.runs.is_empty()
            && self.entrypoint.is_empty()
            && !self.hot_reload
            && self.live_update.is_empty()
    }
}

/// Copies `local_path` into the image at `container_path`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileSync {
    pub local_path: PathBuf,
    pub container_path: String,
}

/// A command run on top of the base image, re-run only when files matching `triggers`
/// change (always, if there are none).
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Run {
    pub cmd: Cmd,
    #[serde(default)]
    pub triggers: Vec<String>,
}

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Hands the whole build to a standard image builder (`docker build`).
///
/// The dockerfile is given either inline in `dockerfile_contents` or as `dockerfile_path`.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct DockerBuild {
    #[serde(default)]
    pub dockerfile_contents: String,
    pub dockerfile_path: Option<PathBuf>,
    /// The build context sent to the builder.
    #[serde(default)]
    pub context: PathBuf,
    #[serde(default)]
    pub build_args: BTreeMap<String, String>,
    /// Stage of a multi-stage dockerfile to build, the last stage if unset.
    pub target_stage: Option<String>,
}

impl DockerBuild {
    pub(crate) fn has_dockerfile(&self) -> bool {
        !self.dockerfile_contents.trim().is_empty() || self.dockerfile_path.is_some()
    }
}

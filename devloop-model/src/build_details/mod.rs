mod custom;
mod docker;
mod fast;

pub use custom::*;
pub use docker::*;
pub use fast::*;

/// How an image is produced. Exactly one strategy is active and it never changes after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildDetails {
    Docker(DockerBuild),
    Fast(FastBuild),
    Custom(CustomBuild),
}

impl BuildDetails {
    pub fn is_docker_build(&self) -> bool {
        matches!(self, BuildDetails::Docker(_))
    }

    pub fn is_fast_build(&self) -> bool {
        matches!(self, BuildDetails::Fast(_))
    }

    pub fn is_custom_build(&self) -> bool {
        matches!(self, BuildDetails::Custom(_))
    }

    /// Short name of the strategy, used in log and error output.
    pub fn strategy_name(&self) -> &'static str {
        match self {
            BuildDetails::Docker(_) => "docker",
            BuildDetails::Fast(_) => "fast",
            BuildDetails::Custom(_) => "custom",
        }
    }
}

impl From<DockerBuild> for BuildDetails {
    fn from(value: DockerBuild) -> Self {
        BuildDetails::Docker(value)
    }
}

impl From<FastBuild> for BuildDetails {
    fn from(value: FastBuild) -> Self {
        BuildDetails::Fast(value)
    }
}

impl From<CustomBuild> for BuildDetails {
    fn from(value: CustomBuild) -> Self {
        BuildDetails::Custom(value)
    }
}

use crate::build_details::{BuildDetails, FastBuild};
use crate::live_update::LiveUpdate;
use crate::reference::ImageSelector;
use crate::target::TargetId;
use std::borrow::Cow;
use std::path::PathBuf;

/// A buildable image: which image to produce and how to build it.
///
/// The selector and the build strategy are both required at construction, there is no way to
/// create a target without them. Values are never modified in place; the `with_*` methods
/// return a new target.
///
/// # Examples
/// ```
/// use devloop_model::build_details::CustomBuild;
/// use devloop_model::image_ref;
/// use devloop_model::image_target::ImageTarget;
///
/// let target = ImageTarget::new(
///     image_ref!("gcr.io/foo/bar").into(),
///     CustomBuild {
///         command: String::from("./build.sh"),
///         deps: vec!["src".into()],
///         ..CustomBuild::default()
///     },
/// );
///
/// assert!(target.validate().is_ok());
/// assert!(target.any_fast_build_info().is_empty());
/// assert!(target.any_live_update_info().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTarget {
    reference: ImageSelector,
    build_details: BuildDetails,
    match_in_env_vars: bool,
    cache_paths: Vec<String>,
    dependency_ids: Vec<TargetId>,
}

impl ImageTarget {
    pub fn new(reference: ImageSelector, build_details: impl Into<BuildDetails>) -> Self {
        Self {
            reference,
            build_details: build_details.into(),
            match_in_env_vars: false,
            cache_paths: Vec::new(),
            dependency_ids: Vec::new(),
        }
    }

    pub fn id(&self) -> TargetId {
        TargetId::image(&self.reference)
    }

    pub fn reference(&self) -> &ImageSelector {
        &self.reference
    }

    pub fn build_details(&self) -> &BuildDetails {
        &self.build_details
    }

    /// Whether the image reference should also be replaced where it appears in container
    /// environment variables, not only in image fields.
    pub fn match_in_env_vars(&self) -> bool {
        self.match_in_env_vars
    }

    /// Container paths whose contents are kept between builds.
    pub fn cache_paths(&self) -> &[String] {
        &self.cache_paths
    }

    /// Targets that must be built before this one.
    pub fn dependency_ids(&self) -> &[TargetId] {
        &self.dependency_ids
    }

    #[must_use]
    pub fn with_build_details(self, build_details: impl Into<BuildDetails>) -> Self {
        Self {
            build_details: build_details.into(),
            ..self
        }
    }

    #[must_use]
    pub fn with_match_in_env_vars(self, match_in_env_vars: bool) -> Self {
        Self {
            match_in_env_vars,
            ..self
        }
    }

    #[must_use]
    pub fn with_cache_paths(self, cache_paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            cache_paths: cache_paths.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    #[must_use]
    pub fn with_dependency_ids(self, dependency_ids: impl IntoIterator<Item = TargetId>) -> Self {
        Self {
            dependency_ids: dependency_ids.into_iter().collect(),
            ..self
        }
    }

    /// The fast build of this target, whatever its strategy.
    ///
    /// Returns the fast build itself for [`BuildDetails::Fast`], the embedded one for
    /// [`BuildDetails::Custom`] and the empty sentinel for [`BuildDetails::Docker`]. Use
    /// [`FastBuild::is_empty`] to tell whether fast builds are available.
    pub fn any_fast_build_info(&self) -> Cow<'_, FastBuild> {
        match &self.build_details {
            BuildDetails::Fast(fast_build) => Cow::Borrowed(fast_build),
            BuildDetails::Custom(custom_build) => Cow::Borrowed(&custom_build.fast),
            BuildDetails::Docker(_) => Cow::Owned(FastBuild::default()),
        }
    }

    /// The live update of this target, whatever its strategy.
    ///
    /// A custom build's own live update takes precedence over the one of its embedded fast
    /// build. Docker builds always yield the empty sentinel. Use [`LiveUpdate::is_empty`] to
    /// tell whether live update is available.
    pub fn any_live_update_info(&self) -> Cow<'_, LiveUpdate> {
        match &self.build_details {
            BuildDetails::Fast(fast_build) => Cow::Borrowed(&fast_build.live_update),
            BuildDetails::Custom(custom_build) if custom_build.live_update.is_empty() => {
                Cow::Borrowed(&custom_build.fast.live_update)
            }
            BuildDetails::Custom(custom_build) => Cow::Borrowed(&custom_build.live_update),
            BuildDetails::Docker(_) => Cow::Owned(LiveUpdate::default()),
        }
    }

    /// Local paths whose changes should trigger a rebuild of this target.
    pub fn local_paths(&self) -> Vec<PathBuf> {
        match &self.build_details {
            BuildDetails::Docker(docker_build) => vec![docker_build.context.clone()],
            BuildDetails::Fast(fast_build) => fast_build
                .syncs
                .iter()
                .map(|sync| sync.local_path.clone())
                .collect(),
            BuildDetails::Custom(custom_build) => custom_build.deps.clone(),
        }
    }

    /// Checks the fields the active build strategy requires.
    ///
    /// Only the configuration itself is checked; whether files exist is a concern of the build.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let image = || self.reference.to_string();

        match &self.build_details {
            BuildDetails::Docker(docker_build) if !docker_build.has_dockerfile() => {
                Err(ValidationError::MissingDockerfile(image()))
            }
            BuildDetails::Fast(fast_build) if fast_build.base_dockerfile.trim().is_empty() => {
                Err(ValidationError::MissingBaseDockerfile(image()))
            }
            BuildDetails::Custom(custom_build) if !custom_build.has_command() => {
                Err(ValidationError::MissingCommand(image()))
            }
            BuildDetails::Docker(_) | BuildDetails::Fast(_) | BuildDetails::Custom(_) => Ok(()),
        }
    }
}

/// An error from [`ImageTarget::validate`], naming the image and the missing field.
#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum ValidationError {
    #[error("Image {0} has neither dockerfile contents nor a dockerfile path")]
    MissingDockerfile(String),

    #[error("Image {0} is missing a base dockerfile")]
    MissingBaseDockerfile(String),

    #[error("Image {0} is missing a build command")]
    MissingCommand(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_details::{CustomBuild, DockerBuild, FileSync};
    use crate::cmd::Cmd;
    use crate::live_update::LiveUpdateStep;

    // Macro-expanded `#[macro_export]` macros cannot be used by path within this crate, so
    // selectors are parsed instead of using `image_ref!`.
    fn selector() -> ImageSelector {
        "gcr.io/foo/bar".parse().unwrap()
    }

    fn fast_build() -> FastBuild {
        FastBuild {
            base_dockerfile: String::from("FROM alpine"),
            entrypoint: Cmd::new(["echo", "hi"]),
            ..FastBuild::default()
        }
    }

    fn custom_build(command: &str) -> CustomBuild {
        CustomBuild {
            command: String::from(command),
            deps: vec![PathBuf::from("foo"), PathBuf::from("bar")],
            ..CustomBuild::default()
        }
    }

    fn live_update() -> LiveUpdate {
        LiveUpdate::new(
            vec![
                LiveUpdateStep::Sync {
                    source: PathBuf::from("src"),
                    dest: String::from("/app"),
                },
                LiveUpdateStep::RestartContainer,
            ],
            "/base/dir",
        )
        .unwrap()
    }

    #[test]
    fn any_fast_build_info() {
        let fb = fast_build();

        let custom = ImageTarget::new(
            selector(),
            CustomBuild {
                fast: fb.clone(),
                ..custom_build("true")
            },
        );
        assert_eq!(*custom.any_fast_build_info(), fb);

        let fast = ImageTarget::new(selector(), fb.clone());
        assert_eq!(*fast.any_fast_build_info(), fb);

        let docker = ImageTarget::new(selector(), DockerBuild::default());
        assert!(docker.any_fast_build_info().is_empty());
    }

    #[test]
    fn any_fast_build_info_of_custom_build_without_fast_build() {
        let target = ImageTarget::new(selector(), custom_build("true"));

        assert!(target.any_fast_build_info().is_empty());
    }

    #[test]
    fn empty_live_update() {
        let lu = LiveUpdate::new(Vec::new(), "/base/dir").unwrap();
        let target = ImageTarget::new(
            selector(),
            CustomBuild {
                live_update: lu,
                ..custom_build("true")
            },
        );

        assert!(target.any_live_update_info().is_empty());
    }

    #[test]
    fn any_live_update_info_per_strategy() {
        let docker = ImageTarget::new(selector(), DockerBuild::default());
        assert!(docker.any_live_update_info().is_empty());

        let fast = ImageTarget::new(
            selector(),
            FastBuild {
                live_update: live_update(),
                ..fast_build()
            },
        );
        assert_eq!(*fast.any_live_update_info(), live_update());

        let fast_without = ImageTarget::new(selector(), fast_build());
        assert!(fast_without.any_live_update_info().is_empty());

        let custom = ImageTarget::new(
            selector(),
            CustomBuild {
                live_update: live_update(),
                ..custom_build("true")
            },
        );
        assert_eq!(*custom.any_live_update_info(), live_update());
    }

    #[test]
    fn custom_build_falls_back_to_embedded_fast_build_live_update() {
        let target = ImageTarget::new(
            selector(),
            CustomBuild {
                fast: FastBuild {
                    live_update: live_update(),
                    ..fast_build()
                },
                ..custom_build("true")
            },
        );

        assert_eq!(*target.any_live_update_info(), live_update());
    }

    #[test]
    fn custom_build_live_update_takes_precedence() {
        let own = LiveUpdate::new(vec![LiveUpdateStep::RestartContainer], "/own").unwrap();
        let target = ImageTarget::new(
            selector(),
            CustomBuild {
                live_update: own.clone(),
                fast: FastBuild {
                    live_update: live_update(),
                    ..fast_build()
                },
                ..custom_build("true")
            },
        );

        assert_eq!(*target.any_live_update_info(), own);
    }

    #[test]
    fn validate() {
        let target = ImageTarget::new(selector(), custom_build("true"));

        assert_eq!(target.validate(), Ok(()));
    }

    #[test]
    fn does_not_validate() {
        let target = ImageTarget::new(selector(), custom_build(""));

        assert_eq!(
            target.validate(),
            Err(ValidationError::MissingCommand(String::from(
                "gcr.io/foo/bar"
            )))
        );
        assert_eq!(
            target.validate().unwrap_err().to_string(),
            "Image gcr.io/foo/bar is missing a build command"
        );
    }

    #[test]
    fn whitespace_command_does_not_validate() {
        let target = ImageTarget::new(selector(), custom_build(" \t"));

        assert!(matches!(
            target.validate(),
            Err(ValidationError::MissingCommand(_))
        ));
    }

    #[test]
    fn custom_build_validation_ignores_deps() {
        let target = ImageTarget::new(
            selector(),
            CustomBuild {
                command: String::from("true"),
                ..CustomBuild::default()
            },
        );

        assert_eq!(target.validate(), Ok(()));
    }

    #[test]
    fn fast_build_validation() {
        let valid = ImageTarget::new(selector(), fast_build());
        let invalid = ImageTarget::new(
            selector(),
            FastBuild {
                base_dockerfile: String::new(),
                ..fast_build()
            },
        );

        assert_eq!(valid.validate(), Ok(()));
        assert!(matches!(
            invalid.validate(),
            Err(ValidationError::MissingBaseDockerfile(_))
        ));
    }

    #[test]
    fn docker_build_validation() {
        let missing = ImageTarget::new(selector(), DockerBuild::default());
        let inline = ImageTarget::new(
            selector(),
            DockerBuild {
                dockerfile_contents: String::from("FROM alpine"),
                ..DockerBuild::default()
            },
        );
        let path = ImageTarget::new(
            selector(),
            DockerBuild {
                dockerfile_path: Some(PathBuf::from("/does/not/exist/Dockerfile")),
                ..DockerBuild::default()
            },
        );

        assert!(matches!(
            missing.validate(),
            Err(ValidationError::MissingDockerfile(_))
        ));
        assert_eq!(inline.validate(), Ok(()));
        assert_eq!(path.validate(), Ok(()));
    }

    #[test]
    fn with_methods_return_new_values() {
        let base = ImageTarget::new(selector(), custom_build("true"));
        let dependency = TargetId::image(&"gcr.io/foo/base".parse().unwrap());

        let target = base
            .clone()
            .with_cache_paths(["/root/.cache"])
            .with_match_in_env_vars(true)
            .with_dependency_ids([dependency.clone()])
            .with_build_details(fast_build());

        assert_eq!(target.reference(), base.reference());
        assert_eq!(target.id(), base.id());
        assert_eq!(target.cache_paths(), ["/root/.cache"]);
        assert!(target.match_in_env_vars());
        assert_eq!(target.dependency_ids(), [dependency]);
        assert!(target.build_details().is_fast_build());
        assert!(base.build_details().is_custom_build());
    }

    #[test]
    fn local_paths() {
        let docker = ImageTarget::new(
            selector(),
            DockerBuild {
                context: PathBuf::from("/src/app"),
                ..DockerBuild::default()
            },
        );
        let fast = ImageTarget::new(
            selector(),
            FastBuild {
                syncs: vec![FileSync {
                    local_path: PathBuf::from("/src/app/web"),
                    container_path: String::from("/app"),
                }],
                ..fast_build()
            },
        );
        let custom = ImageTarget::new(selector(), custom_build("true"));

        assert_eq!(docker.local_paths(), vec![PathBuf::from("/src/app")]);
        assert_eq!(fast.local_paths(), vec![PathBuf::from("/src/app/web")]);
        assert_eq!(
            custom.local_paths(),
            vec![PathBuf::from("foo"), PathBuf::from("bar")]
        );
    }

    #[test]
    fn targets_can_be_shared_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}

        assert_send_sync::<ImageTarget>();
        assert_send_sync::<ValidationError>();
    }
}

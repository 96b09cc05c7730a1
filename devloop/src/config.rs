//! Loading of `devloop.toml`, the user-authored list of image targets.
//!
//! ```toml
//! [[image]]
//! ref = "gcr.io/foo/bar"
//! depends-on = ["gcr.io/foo/base"]
//!
//! [image.custom]
//! command = "./build.sh"
//! deps = ["src"]
//! live-update = [{ sync = { source = "src", dest = "/app/src" } }, "restart-container"]
//! ```
//!
//! Every `[[image]]` entry needs exactly one of `[image.docker]`, `[image.fast]` or
//! `[image.custom]`. Relative paths resolve against the directory of the config file.

use crate::toml_file::{read_toml_file, TomlFileError};
use devloop_model::build_details::{
    BuildDetails, CustomBuild, DockerBuild, FastBuild, FileSync, Run,
};
use devloop_model::cmd::Cmd;
use devloop_model::image_target::ImageTarget;
use devloop_model::live_update::{LiveUpdate, LiveUpdateError, LiveUpdateStep};
use devloop_model::reference::ImageSelector;
use devloop_model::target::TargetId;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Data structure for `devloop.toml`.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct DevloopConfig {
    #[serde(default, rename = "image")]
    pub images: Vec<ImageConfig>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ImageConfig {
    #[serde(rename = "ref")]
    pub reference: ImageSelector,
    /// Images that must be built first. Each selector resolves to the first declared image it
    /// matches, so `gcr.io/foo/base` also finds an image declared as `gcr.io/foo/base:dev`.
    #[serde(default)]
    pub depends_on: Vec<ImageSelector>,
    #[serde(default)]
    pub cache_paths: Vec<String>,
    #[serde(default)]
    pub match_in_env_vars: bool,
    pub docker: Option<DockerBuild>,
    pub fast: Option<FastBuildConfig>,
    pub custom: Option<CustomBuildConfig>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FastBuildConfig {
    #[serde(default)]
    pub base_dockerfile: String,
    #[serde(default)]
    pub syncs: Vec<FileSync>,
    #[serde(default)]
    pub runs: Vec<Run>,
    #[serde(default)]
    pub entrypoint: Cmd,
    #[serde(default)]
    pub hot_reload: bool,
    #[serde(default)]
    pub live_update: Vec<LiveUpdateStep>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct CustomBuildConfig {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub deps: Vec<PathBuf>,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub disable_push: bool,
    pub fast: Option<FastBuildConfig>,
    #[serde(default)]
    pub live_update: Vec<LiveUpdateStep>,
}

/// Reads the config file at `path` and turns its entries into image targets.
///
/// The targets are not validated here, see [`BuildPlan::admit`](crate::plan::BuildPlan::admit).
pub fn load_targets(path: impl AsRef<Path>) -> Result<Vec<ImageTarget>, ConfigError> {
    let path = path.as_ref();
    let config = read_toml_file::<DevloopConfig>(path).map_err(|source| {
        ConfigError::CannotReadConfig {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let base_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let targets = config.into_targets(base_dir)?;
    tracing::debug!(
        path = %path.display(),
        targets = targets.len(),
        "Loaded image targets"
    );

    Ok(targets)
}

impl DevloopConfig {
    /// Converts all entries, resolving relative paths against `base_dir`.
    pub fn into_targets(self, base_dir: &Path) -> Result<Vec<ImageTarget>, ConfigError> {
        let declared = self
            .images
            .iter()
            .map(|image| image.reference.clone())
            .collect::<Vec<_>>();

        self.images
            .into_iter()
            .map(|image| image.into_target(base_dir, &declared))
            .collect()
    }
}

impl ImageConfig {
    /// Converts this entry, resolving `depends_on` against the `declared` image selectors.
    ///
    /// A dependency that matches no declared image keeps its own ID, so it is reported as
    /// unknown when the targets are admitted.
    pub fn into_target(
        self,
        base_dir: &Path,
        declared: &[ImageSelector],
    ) -> Result<ImageTarget, ConfigError> {
        let image = self.reference.to_string();

        let build_details = match (self.docker, self.fast, self.custom) {
            (Some(docker), None, None) => BuildDetails::Docker(docker_build(docker, base_dir)),
            (None, Some(fast), None) => BuildDetails::Fast(fast_build(fast, base_dir, &image)?),
            (None, None, Some(custom)) => {
                BuildDetails::Custom(custom_build(custom, base_dir, &image)?)
            }
            (None, None, None) => return Err(ConfigError::MissingBuildStrategy(image)),
            _ => return Err(ConfigError::MultipleBuildStrategies(image)),
        };

        Ok(ImageTarget::new(self.reference, build_details)
            .with_dependency_ids(
                self.depends_on
                    .iter()
                    .map(|dependency| resolve_dependency(dependency, declared)),
            )
            .with_cache_paths(self.cache_paths)
            .with_match_in_env_vars(self.match_in_env_vars))
    }
}

fn resolve_dependency(dependency: &ImageSelector, declared: &[ImageSelector]) -> TargetId {
    let resolved = declared
        .iter()
        .find(|selector| dependency.matches(selector.reference()))
        .unwrap_or(dependency);

    TargetId::image(resolved)
}

fn docker_build(docker: DockerBuild, base_dir: &Path) -> DockerBuild {
    DockerBuild {
        dockerfile_path: docker.dockerfile_path.map(|path| base_dir.join(path)),
        context: base_dir.join(&docker.context),
        ..docker
    }
}

fn fast_build(
    fast: FastBuildConfig,
    base_dir: &Path,
    image: &str,
) -> Result<FastBuild, ConfigError> {
    Ok(FastBuild {
        base_dockerfile: fast.base_dockerfile,
        syncs: fast
            .syncs
            .into_iter()
            .map(|sync| FileSync {
                local_path: base_dir.join(sync.local_path),
                ..sync
            })
            .collect(),
        runs: fast.runs,
        entrypoint: fast.entrypoint,
        hot_reload: fast.hot_reload,
        live_update: live_update(fast.live_update, base_dir, image)?,
    })
}

fn custom_build(
    custom: CustomBuildConfig,
    base_dir: &Path,
    image: &str,
) -> Result<CustomBuild, ConfigError> {
    let fast = custom
        .fast
        .map(|fast| fast_build(fast, base_dir, image))
        .transpose()?
        .unwrap_or_default();

    Ok(CustomBuild {
        command: custom.command,
        deps: custom
            .deps
            .into_iter()
            .map(|dep| base_dir.join(dep))
            .collect(),
        tag: custom.tag,
        disable_push: custom.disable_push,
        fast,
        live_update: live_update(custom.live_update, base_dir, image)?,
    })
}

fn live_update(
    steps: Vec<LiveUpdateStep>,
    base_dir: &Path,
    image: &str,
) -> Result<LiveUpdate, ConfigError> {
    LiveUpdate::new(steps, base_dir).map_err(|source| ConfigError::InvalidLiveUpdate {
        image: String::from(image),
        source,
    })
}

/// An error from loading `devloop.toml`.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {}: {source}", .path.display())]
    CannotReadConfig {
        path: PathBuf,
        source: TomlFileError,
    },

    #[error("Image {0} has no build strategy, expected one of [image.docker], [image.fast] or [image.custom]")]
    MissingBuildStrategy(String),

    #[error("Image {0} has more than one build strategy")]
    MultipleBuildStrategies(String),

    #[error("Invalid live update for image {image}: {source}")]
    InvalidLiveUpdate {
        image: String,
        source: LiveUpdateError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use std::fs;
    use tempfile::tempdir;

    fn parse(toml_str: &str) -> DevloopConfig {
        toml::from_str(toml_str).unwrap()
    }

    fn single_target(toml_str: &str) -> Result<ImageTarget, ConfigError> {
        parse(toml_str)
            .into_targets(Path::new("/project"))
            .map(|mut targets| targets.remove(0))
    }

    #[test]
    fn docker_build_paths_resolve_against_base_dir() {
        let target = single_target(indoc! {r#"
            [[image]]
            ref = "gcr.io/foo/web"

            [image.docker]
            dockerfile-path = "Dockerfile"
            context = "web"
            build-args = { VERSION = "1" }
        "#})
        .unwrap();

        let BuildDetails::Docker(docker) = target.build_details() else {
            panic!("Expected a docker build, got {:?}", target.build_details());
        };
        assert_eq!(
            docker.dockerfile_path,
            Some(PathBuf::from("/project/Dockerfile"))
        );
        assert_eq!(docker.context, PathBuf::from("/project/web"));
        assert_eq!(docker.build_args.get("VERSION").map(String::as_str), Some("1"));
    }

    #[test]
    fn fast_build_with_live_update() {
        let target = single_target(indoc! {r#"
            [[image]]
            ref = "gcr.io/foo/api"

            [image.fast]
            base-dockerfile = "FROM golang"
            entrypoint = ["/app/api"]
            syncs = [{ local-path = "api", container-path = "/app" }]
            runs = [{ cmd = "go build -o /app/api ./...", triggers = ["**/*.go"] }]
            live-update = [
                { sync = { source = "api", dest = "/app" } },
                "restart-container",
            ]
        "#})
        .unwrap();

        let fast = target.any_fast_build_info();
        assert_eq!(fast.base_dockerfile, "FROM golang");
        assert_eq!(fast.entrypoint, Cmd::new(["/app/api"]));
        assert_eq!(fast.syncs[0].local_path, PathBuf::from("/project/api"));
        assert_eq!(fast.runs[0].cmd, Cmd::shell("go build -o /app/api ./..."));

        let live_update = target.any_live_update_info();
        assert!(live_update.should_restart());
        assert_eq!(live_update.base_dir(), Path::new("/project"));
        assert_eq!(
            live_update.sync_steps()[0].source,
            PathBuf::from("/project/api")
        );
    }

    #[test]
    fn custom_build_with_embedded_fast_build() {
        let target = single_target(indoc! {r#"
            [[image]]
            ref = "gcr.io/foo/bar"
            depends-on = ["gcr.io/foo/base"]
            cache-paths = ["/root/.cache"]
            match-in-env-vars = true

            [image.custom]
            command = "./build.sh"
            deps = ["src", "/abs/lib"]
            tag = "dev"

            [image.custom.fast]
            base-dockerfile = "FROM alpine"
        "#})
        .unwrap();

        let BuildDetails::Custom(custom) = target.build_details() else {
            panic!("Expected a custom build, got {:?}", target.build_details());
        };
        assert_eq!(custom.command, "./build.sh");
        assert_eq!(
            custom.deps,
            vec![PathBuf::from("/project/src"), PathBuf::from("/abs/lib")]
        );
        assert_eq!(custom.tag, "dev");
        assert_eq!(target.any_fast_build_info().base_dockerfile, "FROM alpine");
        assert!(target.any_live_update_info().is_empty());
        assert_eq!(
            target.dependency_ids(),
            [TargetId::image(&"gcr.io/foo/base".parse().unwrap())]
        );
        assert_eq!(target.cache_paths(), ["/root/.cache"]);
        assert!(target.match_in_env_vars());
    }

    #[test]
    fn dependencies_resolve_to_declared_images() {
        let targets = parse(indoc! {r#"
            [[image]]
            ref = "gcr.io/foo/app"
            depends-on = ["gcr.io/foo/base", "gcr.io/foo/tools:v2", "gcr.io/foo/missing"]

            [image.custom]
            command = "./build.sh"

            [[image]]
            ref = "gcr.io/foo/base:dev"

            [image.custom]
            command = "./build.sh"

            [[image]]
            ref = "gcr.io/foo/tools:v1"

            [image.custom]
            command = "./build.sh"
        "#})
        .into_targets(Path::new("/project"))
        .unwrap();

        assert_eq!(
            targets[0].dependency_ids(),
            [
                targets[1].id(),
                TargetId::image(&"gcr.io/foo/tools:v2".parse().unwrap()),
                TargetId::image(&"gcr.io/foo/missing".parse().unwrap()),
            ]
        );
    }

    #[test]
    fn missing_build_strategy() {
        let result = single_target(indoc! {r#"
            [[image]]
            ref = "redis"
        "#});

        assert!(matches!(
            result,
            Err(ConfigError::MissingBuildStrategy(image)) if image == "docker.io/library/redis"
        ));
    }

    #[test]
    fn multiple_build_strategies() {
        let result = single_target(indoc! {r#"
            [[image]]
            ref = "gcr.io/foo/bar"

            [image.docker]
            dockerfile-contents = "FROM alpine"

            [image.custom]
            command = "true"
        "#});

        assert!(matches!(
            result,
            Err(ConfigError::MultipleBuildStrategies(_))
        ));
    }

    #[test]
    fn invalid_live_update_is_reported() {
        let result = single_target(indoc! {r#"
            [[image]]
            ref = "gcr.io/foo/bar"

            [image.custom]
            command = "true"
            live-update = ["restart-container", { run = { command = "make" } }]
        "#});

        let error = result.unwrap_err();
        assert!(matches!(
            &error,
            ConfigError::InvalidLiveUpdate {
                source: LiveUpdateError::RestartContainerNotLast,
                ..
            }
        ));
        assert_eq!(
            error.to_string(),
            "Invalid live update for image gcr.io/foo/bar: restart_container is only valid as the last step"
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = toml::from_str::<DevloopConfig>(indoc! {r#"
            [[image]]
            ref = "gcr.io/foo/bar"
            unknown = true
        "#});

        assert!(result.is_err());
    }

    #[test]
    fn invalid_image_reference_is_rejected() {
        let result = toml::from_str::<DevloopConfig>(indoc! {r#"
            [[image]]
            ref = "Not A Reference"
        "#});

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Invalid image reference: `Not A Reference`"));
    }

    #[test]
    fn load_targets_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("devloop.toml");
        fs::write(
            &path,
            indoc! {r#"
                [[image]]
                ref = "gcr.io/foo/bar"

                [image.custom]
                command = "true"
                deps = ["src"]
            "#},
        )
        .unwrap();

        let targets = load_targets(&path).unwrap();

        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].local_paths(), vec![dir.path().join("src")]);
    }

    #[test]
    fn load_targets_from_missing_file() {
        let dir = tempdir().unwrap();

        assert!(matches!(
            load_targets(dir.path().join("devloop.toml")),
            Err(ConfigError::CannotReadConfig { .. })
        ));
    }

    #[test]
    fn empty_config() {
        assert!(parse("").into_targets(Path::new(".")).unwrap().is_empty());
    }
}

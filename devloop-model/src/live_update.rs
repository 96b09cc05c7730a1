use crate::cmd::Cmd;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// A single step of a [`LiveUpdate`].
///
/// Steps must appear in this order: `fall_back_on` steps first, then `sync` steps, then `run`
/// steps, then at most one `restart_container` step.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LiveUpdateStep {
    /// Changes to files matching any of these patterns require a full rebuild instead.
    FallBackOn { files: Vec<String> },
    /// Copy `source` (relative to the base directory) to the absolute container path `dest`.
    Sync { source: PathBuf, dest: String },
    /// Run `command` in the container, optionally only when files matching `triggers` changed.
    Run {
        command: Cmd,
        #[serde(default)]
        triggers: Vec<String>,
    },
    RestartContainer,
}

impl LiveUpdateStep {
    fn name(&self) -> &'static str {
        match self {
            LiveUpdateStep::FallBackOn { .. } => "fall_back_on",
            LiveUpdateStep::Sync { .. } => "sync",
            LiveUpdateStep::Run { .. } => "run",
            LiveUpdateStep::RestartContainer => "restart_container",
        }
    }
}

/// A `sync` step with its source resolved against the base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveUpdateSync {
    pub source: PathBuf,
    pub dest: String,
}

/// A `run` step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveUpdateRun {
    pub command: Cmd,
    pub triggers: Vec<String>,
}

/// Incremental update steps applied to a running container instead of a full image rebuild.
///
/// The default value has no steps and is the "no live update" sentinel: callers check
/// [`LiveUpdate::is_empty`] instead of dealing with an `Option`.
///
/// # Examples
/// ```
/// use devloop_model::cmd::Cmd;
/// use devloop_model::live_update::{LiveUpdate, LiveUpdateStep};
///
/// let empty = LiveUpdate::new(Vec::new(), "/base/dir").unwrap();
/// assert!(empty.is_empty());
///
/// let live_update = LiveUpdate::new(
///     vec![
///         LiveUpdateStep::Sync { source: "src".into(), dest: String::from("/app/src") },
///         LiveUpdateStep::Run { command: Cmd::shell("make"), triggers: Vec::new() },
///     ],
///     "/base/dir",
/// )
/// .unwrap();
/// assert_eq!(live_update.sync_steps()[0].source.to_str(), Some("/base/dir/src"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveUpdate {
    steps: Vec<LiveUpdateStep>,
    base_dir: PathBuf,
}

impl LiveUpdate {
    /// Creates a live update from its steps and the directory relative paths resolve against.
    ///
    /// An empty step list always succeeds. The base directory does not need to exist.
    pub fn new(
        steps: impl IntoIterator<Item = LiveUpdateStep>,
        base_dir: impl Into<PathBuf>,
    ) -> Result<Self, LiveUpdateError> {
        let steps = steps.into_iter().collect::<Vec<_>>();
        let base_dir = base_dir.into();

        if base_dir.as_os_str().as_encoded_bytes().contains(&0) {
            return Err(LiveUpdateError::InvalidBaseDir(base_dir));
        }

        validate_step_order(&steps)?;
        for step in &steps {
            validate_step(step)?;
        }

        Ok(Self { steps, base_dir })
    }

    /// Whether there are no steps, i.e. live update is not available.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[LiveUpdateStep] {
        &self.steps
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Patterns of all `fall_back_on` steps, resolved against the base directory.
    pub fn fall_back_on_files(&self) -> Vec<PathBuf> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                LiveUpdateStep::FallBackOn { files } => Some(files),
                _ => None,
            })
            .flatten()
            .map(|file| self.base_dir.join(file))
            .collect()
    }

    pub fn sync_steps(&self) -> Vec<LiveUpdateSync> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                LiveUpdateStep::Sync { source, dest } => Some(LiveUpdateSync {
                    source: self.base_dir.join(source),
                    dest: dest.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    pub fn run_steps(&self) -> Vec<LiveUpdateRun> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                LiveUpdateStep::Run { command, triggers } => Some(LiveUpdateRun {
                    command: command.clone(),
                    triggers: triggers.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    pub fn should_restart(&self) -> bool {
        matches!(self.steps.last(), Some(LiveUpdateStep::RestartContainer))
    }
}

fn validate_step_order(steps: &[LiveUpdateStep]) -> Result<(), LiveUpdateError> {
    let mut seen_other_than_fall_back_on = false;
    let mut seen_run = false;

    for (index, step) in steps.iter().enumerate() {
        match step {
            LiveUpdateStep::FallBackOn { .. } if seen_other_than_fall_back_on => {
                return Err(LiveUpdateError::FallBackOnNotFirst);
            }
            LiveUpdateStep::FallBackOn { .. } => {}
            LiveUpdateStep::Sync { .. } if seen_run => {
                return Err(LiveUpdateError::SyncAfterRun);
            }
            LiveUpdateStep::Run { .. } => seen_run = true,
            LiveUpdateStep::RestartContainer if index != steps.len() - 1 => {
                return Err(LiveUpdateError::RestartContainerNotLast);
            }
            LiveUpdateStep::Sync { .. } | LiveUpdateStep::RestartContainer => {}
        }

        if !matches!(step, LiveUpdateStep::FallBackOn { .. }) {
            seen_other_than_fall_back_on = true;
        }
    }

    Ok(())
}

fn validate_step(step: &LiveUpdateStep) -> Result<(), LiveUpdateError> {
    match step {
        LiveUpdateStep::FallBackOn { files } => {
            if files.is_empty() {
                return Err(LiveUpdateError::EmptyStep(step.name()));
            }
            files.iter().try_for_each(|file| validate_pattern(file))
        }
        LiveUpdateStep::Sync { dest, .. } => {
            if dest.starts_with('/') {
                Ok(())
            } else {
                Err(LiveUpdateError::RelativeSyncDest(dest.clone()))
            }
        }
        LiveUpdateStep::Run { command, triggers } => {
            if command.is_empty() {
                return Err(LiveUpdateError::EmptyStep(step.name()));
            }
            triggers.iter().try_for_each(|trigger| validate_pattern(trigger))
        }
        LiveUpdateStep::RestartContainer => Ok(()),
    }
}

fn validate_pattern(pattern: &str) -> Result<(), LiveUpdateError> {
    glob::Pattern::new(pattern)
        .map(|_| ())
        .map_err(|source| LiveUpdateError::InvalidPattern {
            pattern: String::from(pattern),
            source,
        })
}

/// An error from [`LiveUpdate::new`].
#[derive(thiserror::Error, Debug)]
pub enum LiveUpdateError {
    #[error("Live update base directory is not a valid path: {}", .0.display())]
    InvalidBaseDir(PathBuf),

    #[error("All fall_back_on steps must precede all other steps")]
    FallBackOnNotFirst,

    #[error("All sync steps must precede all run steps")]
    SyncAfterRun,

    #[error("restart_container is only valid as the last step")]
    RestartContainerNotLast,

    #[error("{0} step must not be empty")]
    EmptyStep(&'static str),

    #[error("Sync destination must be an absolute container path, got `{0}`")]
    RelativeSyncDest(String),

    #[error("Invalid path pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

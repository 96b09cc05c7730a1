use crate::target_graph::{dependency_cycles, into_build_order};
use devloop_model::image_target::{ImageTarget, ValidationError};
use devloop_model::target::TargetId;
use std::collections::HashSet;

/// The image targets that can be built, in the order they need to be built in.
///
/// Targets that cannot be built are kept aside with the reason they were rejected, so one broken
/// entry does not prevent the others from being built.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    targets: Vec<ImageTarget>,
    rejected: Vec<RejectedTarget>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RejectedTarget {
    pub id: TargetId,
    pub reason: RejectionReason,
}

#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum RejectionReason {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Another image target with the same ID was declared earlier")]
    Duplicate,

    #[error("Depends on unknown image target {0}")]
    UnknownDependency(TargetId),

    #[error("Depends on rejected image target {0}")]
    RejectedDependency(TargetId),

    #[error("Part of a dependency cycle")]
    DependencyCycle,
}

impl BuildPlan {
    /// Validates the given targets and orders the valid ones so dependencies come first.
    ///
    /// Targets that cannot be built are rejected and logged while the others are still
    /// admitted: invalid targets, later duplicates of an ID, members of a dependency cycle and
    /// targets depending on an unknown or rejected target.
    pub fn admit(targets: impl IntoIterator<Item = ImageTarget>) -> Self {
        let mut seen = HashSet::new();
        let mut rejected = Vec::new();
        let mut candidates = Vec::new();

        for target in targets {
            let id = target.id();

            let rejection = if seen.insert(id.clone()) {
                target.validate().err().map(RejectionReason::from)
            } else {
                Some(RejectionReason::Duplicate)
            };

            match rejection {
                Some(reason) => reject(&mut rejected, id, reason),
                None => candidates.push(target),
            }
        }

        loop {
            candidates = reject_unresolved(candidates, &seen, &mut rejected);

            let cyclic = dependency_cycles(&candidates);
            if cyclic.is_empty() {
                break;
            }

            let (in_cycle, rest): (Vec<_>, Vec<_>) = candidates
                .into_iter()
                .partition(|target| cyclic.contains(&target.id()));

            for target in in_cycle {
                reject(&mut rejected, target.id(), RejectionReason::DependencyCycle);
            }
            candidates = rest;
        }

        let targets = into_build_order(candidates);

        for target in &targets {
            tracing::debug!(
                id = %target.id(),
                strategy = target.build_details().strategy_name(),
                live_update = !target.any_live_update_info().is_empty(),
                "Admitted image target"
            );
        }

        tracing::info!(
            admitted = targets.len(),
            rejected = rejected.len(),
            "Admitted image targets"
        );

        Self { targets, rejected }
    }

    /// Admitted targets, dependencies first.
    pub fn targets(&self) -> &[ImageTarget] {
        &self.targets
    }

    pub fn rejected(&self) -> &[RejectedTarget] {
        &self.rejected
    }

    /// Admitted targets that support live update.
    pub fn live_update_targets(&self) -> impl Iterator<Item = &ImageTarget> {
        self.targets
            .iter()
            .filter(|target| !target.any_live_update_info().is_empty())
    }

    pub fn into_targets(self) -> Vec<ImageTarget> {
        self.targets
    }
}

// Rejecting a target can leave its dependents without a dependency, repeats until stable.
fn reject_unresolved(
    mut candidates: Vec<ImageTarget>,
    seen: &HashSet<TargetId>,
    rejected: &mut Vec<RejectedTarget>,
) -> Vec<ImageTarget> {
    loop {
        let admitted = candidates
            .iter()
            .map(ImageTarget::id)
            .collect::<HashSet<_>>();

        let (kept, dropped): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .map(|target| {
                let missing = target
                    .dependency_ids()
                    .iter()
                    .find(|dependency| !admitted.contains(*dependency))
                    .cloned();
                (target, missing)
            })
            .partition(|(_, missing)| missing.is_none());

        candidates = kept.into_iter().map(|(target, _)| target).collect();

        if dropped.is_empty() {
            return candidates;
        }

        for (target, missing) in dropped {
            if let Some(dependency) = missing {
                let reason = if seen.contains(&dependency) {
                    RejectionReason::RejectedDependency(dependency)
                } else {
                    RejectionReason::UnknownDependency(dependency)
                };
                reject(rejected, target.id(), reason);
            }
        }
    }
}

fn reject(rejected: &mut Vec<RejectedTarget>, id: TargetId, reason: RejectionReason) {
    tracing::warn!(id = %id, reason = %reason, "Rejected image target");
    rejected.push(RejectedTarget { id, reason });
}

//! Deterministic derivation of missing components.

use crate::core::mission::{Mission, MissionKind};
use crate::core::snapshot::{
    AbPlanPolicy, MissingComponent, PersonaInventory, Policy, RepoState,
};

/// Derive the gap list from observed state.
///
/// - `personas_for_<org>` for each onboarding target not covered (per `policy.coverage`).
///   Organizations absent from the catalog have no coverage and are always flagged.
/// - `persona_data_directory` when the directory does not exist.
/// - `attribution_page` when no attribution UI artifact exists.
/// - `ab_testing_plan` when the plan is absent and `policy.ab_plan` asks for it.
///
/// Order is stable: persona gaps in mission order, then the fixed components.
pub fn derive_missing_components(
    objectives: Option<&Mission>,
    persona_data: &PersonaInventory,
    repo_state: &RepoState,
    policy: Policy,
) -> Vec<MissingComponent> {
    let mut missing = Vec::new();

    if let Some(targets) = objectives.and_then(Mission::onboarding_targets) {
        for org in targets {
            let covered = persona_data
                .coverage
                .get(org)
                .is_some_and(|coverage| coverage.is_covered(policy.coverage));
            let gap = MissingComponent::PersonasFor(org.clone());
            if !covered && !missing.contains(&gap) {
                missing.push(gap);
            }
        }
    }

    if !persona_data.directory_exists {
        missing.push(MissingComponent::PersonaDataDirectory);
    }

    if !repo_state.attribution_page {
        missing.push(MissingComponent::AttributionPage);
    }

    if !repo_state.ab_plan && ab_plan_expected(objectives, policy.ab_plan) {
        missing.push(MissingComponent::AbTestingPlan);
    }

    missing
}

fn ab_plan_expected(objectives: Option<&Mission>, policy: AbPlanPolicy) -> bool {
    match policy {
        AbPlanPolicy::Always => true,
        AbPlanPolicy::Never => false,
        AbPlanPolicy::NonOnboardingMission => objectives
            .is_some_and(|mission| mission.kind() != MissionKind::UniversityOnboarding),
    }
}

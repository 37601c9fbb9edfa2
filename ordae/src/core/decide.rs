//! Decision engine: pick exactly one task from the snapshot.

use crate::core::snapshot::{MissingComponent, Snapshot};
use crate::core::types::{Decision, Lane, Task};

/// Select the task for this iteration. Total: every snapshot yields a decision.
///
/// Rules, first match wins:
/// 1. Onboarding mission with an uncovered target: first such organization in
///    mission order gets `create_university_personas`.
/// 2. Onboarding mission, every target covered: `optimize_university_campaigns`.
/// 3. Attribution UI artifact absent: `build_attribution_page`.
/// 4. Otherwise: `plan_ab_for_first_persona`.
pub fn decide(snapshot: &Snapshot) -> Decision {
    if let Some(targets) = snapshot
        .objectives
        .as_ref()
        .and_then(|mission| mission.onboarding_targets())
    {
        let uncovered = targets.iter().find(|org| {
            snapshot.is_missing(&MissingComponent::PersonasFor(org.to_string()))
        });
        return match uncovered {
            Some(org) => Decision {
                lane: Lane::UniversityOnboarding,
                task: Task::CreateUniversityPersonas {
                    organization: org.clone(),
                },
                reasoning: format!(
                    "Strategic objective: create personas for {org} programs"
                ),
            },
            None => Decision {
                lane: Lane::Marketing,
                task: Task::OptimizeUniversityCampaigns,
                reasoning: format!(
                    "All {} onboarding targets have personas; optimizing campaigns",
                    targets.len()
                ),
            },
        };
    }

    if !snapshot.repo_state.attribution_page {
        return Decision {
            lane: Lane::Product,
            task: Task::BuildAttributionPage,
            reasoning: "Attribution page missing; prioritizing product development".to_string(),
        };
    }

    Decision {
        lane: Lane::Marketing,
        task: Task::PlanAbForFirstPersona,
        reasoning: "Attribution page exists; focusing on marketing optimization".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::snapshot::{OrgCoverage, PersonaInventory, RepoState};
    use crate::test_support::{onboarding_mission, snapshot_with};

    fn covered() -> OrgCoverage {
        OrgCoverage {
            personas_created: true,
            programs_covered: vec!["mba".to_string()],
            missing_personas: Vec::new(),
        }
    }

    #[test]
    fn no_mission_without_attribution_page_builds_it() {
        let snapshot = snapshot_with(None, PersonaInventory::default(), RepoState::default());
        let decision = decide(&snapshot);
        assert_eq!(decision.lane, Lane::Product);
        assert_eq!(decision.task, Task::BuildAttributionPage);
    }

    #[test]
    fn no_mission_with_attribution_page_plans_ab_test() {
        let repo = RepoState {
            attribution_page: true,
            ..RepoState::default()
        };
        let decision = decide(&snapshot_with(None, PersonaInventory::default(), repo));
        assert_eq!(decision.lane, Lane::Marketing);
        assert_eq!(decision.task, Task::PlanAbForFirstPersona);
    }

    #[test]
    fn onboarding_targets_first_uncovered_org_in_mission_order() {
        let mut inventory = PersonaInventory::default();
        inventory.coverage.insert("orgA".to_string(), covered());
        let snapshot = snapshot_with(
            Some(onboarding_mission(&["orgA", "orgC", "orgB"])),
            inventory,
            RepoState::default(),
        );
        let decision = decide(&snapshot);
        assert_eq!(decision.lane, Lane::UniversityOnboarding);
        assert_eq!(decision.task.target(), Some("orgC"));
    }

    #[test]
    fn onboarding_with_all_targets_covered_optimizes_campaigns() {
        let mut inventory = PersonaInventory::default();
        inventory.coverage.insert("orgA".to_string(), covered());
        inventory.coverage.insert("orgB".to_string(), covered());
        let snapshot = snapshot_with(
            Some(onboarding_mission(&["orgA", "orgB"])),
            inventory,
            RepoState::default(),
        );
        let decision = decide(&snapshot);
        assert_eq!(decision.lane, Lane::Marketing);
        assert_eq!(decision.task, Task::OptimizeUniversityCampaigns);
    }

    #[test]
    fn onboarding_mission_outranks_missing_attribution_page() {
        let snapshot = snapshot_with(
            Some(onboarding_mission(&[])),
            PersonaInventory::default(),
            RepoState::default(),
        );
        assert_eq!(decide(&snapshot).task, Task::OptimizeUniversityCampaigns);
    }

    #[test]
    fn decision_is_total_over_flag_combinations() {
        let missions = [
            None,
            Some(onboarding_mission(&["x"])),
            Some(onboarding_mission(&[])),
            Some(
                serde_json::from_value(serde_json::json!({"mission": "persona_enhancement"}))
                    .expect("mission"),
            ),
        ];
        for mission in missions {
            for bits in 0..16u8 {
                let repo = RepoState {
                    app_exists: bits & 1 != 0,
                    attribution_page: bits & 2 != 0,
                    ab_plan: bits & 4 != 0,
                    campaign_strategy: bits & 8 != 0,
                };
                let inventory = PersonaInventory {
                    directory_exists: bits & 1 != 0,
                    ..PersonaInventory::default()
                };
                let snapshot = snapshot_with(mission.clone(), inventory, repo);
                let decision = decide(&snapshot);
                assert_eq!(decision.task.lane(), Some(decision.lane));
                assert!(!decision.reasoning.is_empty());
            }
        }
    }
}

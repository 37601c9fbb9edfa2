//! Observation record produced by the Observe phase.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::catalog::Catalog;
use crate::core::gaps::derive_missing_components;
use crate::core::mission::Mission;

/// When a missing A/B test plan counts as a gap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbPlanPolicy {
    /// Only while a mission other than onboarding is active.
    #[default]
    NonOnboardingMission,
    Always,
    Never,
}

/// What it takes for an organization to count as covered by personas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageRule {
    /// At least one persona record exists for the organization.
    #[default]
    AnyPersona,
    /// Every configured (program, category) pair has a persona record.
    AllPersonas,
}

/// Gap-detection policy, copied into each snapshot so derivation stays local.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub ab_plan: AbPlanPolicy,
    pub coverage: CoverageRule,
}

/// Persona coverage of one organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgCoverage {
    /// At least one persona record exists.
    pub personas_created: bool,
    /// Program ids with at least one persona record.
    pub programs_covered: Vec<String>,
    /// `<program>_<category>` pairs without a persona record.
    pub missing_personas: Vec<String>,
}

impl OrgCoverage {
    pub fn is_covered(&self, rule: CoverageRule) -> bool {
        match rule {
            CoverageRule::AnyPersona => self.personas_created,
            CoverageRule::AllPersonas => self.personas_created && self.missing_personas.is_empty(),
        }
    }
}

/// Inventory of the persona data directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaInventory {
    pub directory_exists: bool,
    /// Names of `.json`/`.yaml` files in the directory, sorted.
    pub files: Vec<String>,
    /// Coverage per catalog organization id.
    pub coverage: BTreeMap<String, OrgCoverage>,
}

/// Feature flags observed in the repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoState {
    pub app_exists: bool,
    pub attribution_page: bool,
    pub ab_plan: bool,
    pub campaign_strategy: bool,
}

/// A named gap between desired and observed state.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum MissingComponent {
    PersonasFor(String),
    PersonaDataDirectory,
    AttributionPage,
    AbTestingPlan,
    /// A component name this build does not recognize (read back from old state).
    Other(String),
}

const PERSONAS_FOR_PREFIX: &str = "personas_for_";

impl fmt::Display for MissingComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingComponent::PersonasFor(org) => write!(f, "{PERSONAS_FOR_PREFIX}{org}"),
            MissingComponent::PersonaDataDirectory => f.write_str("persona_data_directory"),
            MissingComponent::AttributionPage => f.write_str("attribution_page"),
            MissingComponent::AbTestingPlan => f.write_str("ab_testing_plan"),
            MissingComponent::Other(raw) => f.write_str(raw),
        }
    }
}

impl From<MissingComponent> for String {
    fn from(value: MissingComponent) -> Self {
        value.to_string()
    }
}

impl From<String> for MissingComponent {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "persona_data_directory" => MissingComponent::PersonaDataDirectory,
            "attribution_page" => MissingComponent::AttributionPage,
            "ab_testing_plan" => MissingComponent::AbTestingPlan,
            _ => match raw.strip_prefix(PERSONAS_FOR_PREFIX) {
                Some(org) if !org.is_empty() => MissingComponent::PersonasFor(org.to_string()),
                _ => MissingComponent::Other(raw),
            },
        }
    }
}

/// Read-only observation bundle for one iteration.
///
/// Construct with [`Snapshot::new`]; `missing_components` is derived from the
/// other fields and cannot be set independently. Deserialization recomputes it
/// and ignores the stored list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SnapshotFields")]
pub struct Snapshot {
    pub observed_at: DateTime<Utc>,
    /// Active mission, if any. Inactive missions are dropped by the builder.
    pub objectives: Option<Mission>,
    pub catalog: Option<Catalog>,
    pub persona_data: PersonaInventory,
    pub repo_state: RepoState,
    pub policy: Policy,
    missing_components: Vec<MissingComponent>,
}

/// Stored form of a [`Snapshot`], minus the derived gap list.
#[derive(Deserialize)]
struct SnapshotFields {
    observed_at: DateTime<Utc>,
    objectives: Option<Mission>,
    catalog: Option<Catalog>,
    persona_data: PersonaInventory,
    repo_state: RepoState,
    #[serde(default)]
    policy: Policy,
}

impl From<SnapshotFields> for Snapshot {
    fn from(fields: SnapshotFields) -> Self {
        Snapshot::new(
            fields.observed_at,
            fields.objectives,
            fields.catalog,
            fields.persona_data,
            fields.repo_state,
            fields.policy,
        )
    }
}

impl Snapshot {
    pub fn new(
        observed_at: DateTime<Utc>,
        objectives: Option<Mission>,
        catalog: Option<Catalog>,
        persona_data: PersonaInventory,
        repo_state: RepoState,
        policy: Policy,
    ) -> Self {
        let mut snapshot = Self {
            observed_at,
            objectives,
            catalog,
            persona_data,
            repo_state,
            policy,
            missing_components: Vec::new(),
        };
        snapshot.missing_components = snapshot.derive_missing_components();
        snapshot
    }

    /// Recompute the gap list from the other fields.
    pub fn derive_missing_components(&self) -> Vec<MissingComponent> {
        derive_missing_components(
            self.objectives.as_ref(),
            &self.persona_data,
            &self.repo_state,
            self.policy,
        )
    }

    pub fn missing_components(&self) -> &[MissingComponent] {
        &self.missing_components
    }

    pub fn is_missing(&self, component: &MissingComponent) -> bool {
        self.missing_components.contains(component)
    }

    /// Remaining `personas_for_<org>` gaps.
    pub fn persona_gaps(&self) -> impl Iterator<Item = &str> {
        self.missing_components
            .iter()
            .filter_map(|component| match component {
                MissingComponent::PersonasFor(org) => Some(org.as_str()),
                _ => None,
            })
    }

    pub fn mission_name(&self) -> Option<&str> {
        self.objectives
            .as_ref()
            .map(|mission| mission.mission.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_component_string_form_round_trips() {
        for raw in [
            "personas_for_msu",
            "persona_data_directory",
            "attribution_page",
            "ab_testing_plan",
            "future_gap",
        ] {
            let component = MissingComponent::from(raw.to_string());
            assert_eq!(component.to_string(), raw);
        }
        assert_eq!(
            MissingComponent::from("personas_for_asu".to_string()),
            MissingComponent::PersonasFor("asu".to_string())
        );
    }

    #[test]
    fn stored_gap_list_is_recomputed_on_load() {
        let snapshot = Snapshot::new(
            DateTime::<Utc>::default(),
            None,
            None,
            PersonaInventory::default(),
            RepoState::default(),
            Policy::default(),
        );
        let mut stored = serde_json::to_value(&snapshot).expect("serialize");
        assert_eq!(
            stored["missing_components"],
            serde_json::json!(["persona_data_directory", "attribution_page"])
        );
        stored["missing_components"] = serde_json::json!(["ab_testing_plan"]);
        let loaded: Snapshot = serde_json::from_value(stored).expect("deserialize");
        assert_eq!(loaded, snapshot);
        assert!(!loaded.is_missing(&MissingComponent::AbTestingPlan));
    }

    #[test]
    fn all_personas_rule_requires_no_missing_pairs() {
        let coverage = OrgCoverage {
            personas_created: true,
            programs_covered: vec!["mba".to_string()],
            missing_personas: vec!["mba_recent_graduate".to_string()],
        };
        assert!(coverage.is_covered(CoverageRule::AnyPersona));
        assert!(!coverage.is_covered(CoverageRule::AllPersonas));
    }
}

//! Shared deterministic types for the decision, action and evaluation phases.
//!
//! These types define stable contracts between phases and are persisted
//! verbatim in the memory ledger, so their serialized form must stay stable.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level workstream a decision is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    Product,
    Marketing,
    UniversityOnboarding,
}

impl Lane {
    pub fn as_str(self) -> &'static str {
        match self {
            Lane::Product => "product",
            Lane::Marketing => "marketing",
            Lane::UniversityOnboarding => "university_onboarding",
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed catalog of tasks the loop knows how to execute.
///
/// `Unrecognized` only appears when reading state written by a newer build;
/// the decision engine never produces it and the executor treats it as a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Task {
    CreateUniversityPersonas { organization: String },
    OptimizeUniversityCampaigns,
    BuildAttributionPage,
    PlanAbForFirstPersona,
    #[serde(other)]
    Unrecognized,
}

impl Task {
    pub fn name(&self) -> &'static str {
        match self {
            Task::CreateUniversityPersonas { .. } => "create_university_personas",
            Task::OptimizeUniversityCampaigns => "optimize_university_campaigns",
            Task::BuildAttributionPage => "build_attribution_page",
            Task::PlanAbForFirstPersona => "plan_ab_for_first_persona",
            Task::Unrecognized => "unrecognized",
        }
    }

    /// Lane the task belongs to. `None` for tasks this build does not know.
    pub fn lane(&self) -> Option<Lane> {
        match self {
            Task::CreateUniversityPersonas { .. } => Some(Lane::UniversityOnboarding),
            Task::OptimizeUniversityCampaigns | Task::PlanAbForFirstPersona => {
                Some(Lane::Marketing)
            }
            Task::BuildAttributionPage => Some(Lane::Product),
            Task::Unrecognized => None,
        }
    }

    /// Target organization, for tasks scoped to one.
    pub fn target(&self) -> Option<&str> {
        match self {
            Task::CreateUniversityPersonas { organization } => Some(organization.as_str()),
            _ => None,
        }
    }
}

/// The single (lane, task) pair selected for an iteration.
///
/// `reasoning` is for humans and the ledger only; nothing downstream parses it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub lane: Lane,
    pub task: Task,
    pub reasoning: String,
}

impl Decision {
    /// Build a decision whose lane is derived from the task.
    ///
    /// Returns `None` for `Task::Unrecognized`, which has no lane.
    pub fn new(task: Task, reasoning: impl Into<String>) -> Option<Self> {
        let lane = task.lane()?;
        Some(Self {
            lane,
            task,
            reasoning: reasoning.into(),
        })
    }
}

/// Overall outcome of the Act phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Completed,
    NoActionNeeded,
}

impl ActionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionStatus::Completed => "completed",
            ActionStatus::NoActionNeeded => "no_action_needed",
        }
    }
}

/// What kind of thing an action produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Persona record inserted into the storage collaborator.
    PersonaRecord,
    /// Persona written locally because no storage collaborator is connected.
    PersonaFile,
    /// Persona written locally after the storage collaborator failed for it.
    PersonaFileFallback,
    AttributionPage,
    AbTestPlan,
    CampaignStrategy,
}

/// A single artifact produced during the Act phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    /// Stable identifier (persona key, or artifact file name).
    pub id: String,
    /// Where the artifact lives: a path, or a store-assigned record id.
    pub location: String,
}

impl Artifact {
    pub fn is_fallback(&self) -> bool {
        self.kind == ArtifactKind::PersonaFileFallback
    }
}

/// Outcome of executing a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub status: ActionStatus,
    pub artifacts: Vec<Artifact>,
    /// Shell-equivalent follow-up commands for an operator.
    pub commands: Vec<String>,
}

impl ActionResult {
    /// Derive status from the produced artifacts.
    pub fn from_artifacts(artifacts: Vec<Artifact>, commands: Vec<String>) -> Self {
        let status = if artifacts.is_empty() {
            ActionStatus::NoActionNeeded
        } else {
            ActionStatus::Completed
        };
        Self {
            status,
            artifacts,
            commands,
        }
    }

    pub fn no_action() -> Self {
        Self::from_artifacts(Vec::new(), Vec::new())
    }

    /// Ids of records that fell back to local storage.
    pub fn fallbacks(&self) -> Vec<&str> {
        self.artifacts
            .iter()
            .filter(|artifact| artifact.is_fallback())
            .map(|artifact| artifact.id.as_str())
            .collect()
    }
}

/// Pass/fail verdict of the Evaluate phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Pass => "pass",
            Verdict::Fail => "fail",
        }
    }
}

/// Judgement of an iteration plus advisory input for the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub verdict: Verdict,
    pub validation_results: Vec<String>,
    pub recommendations: Vec<String>,
    /// Free-form hint for the next iteration. Advisory only.
    pub next_iteration_focus: Option<String>,
}

impl Evaluation {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }
}

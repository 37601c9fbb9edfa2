//! Strategic objectives ("mission") consumed by the decision engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ONBOARDING_MISSION: &str = "autonomous_university_onboarding";
pub const PERSONA_ENHANCEMENT_MISSION: &str = "persona_enhancement";

const DEFAULT_TARGET_PROGRAMS: [&str; 3] = ["mba", "online_mba", "mscs"];

/// Interpretation of the free-form `mission` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionKind {
    UniversityOnboarding,
    PersonaEnhancement,
    Other,
}

impl MissionKind {
    pub fn parse(raw: &str) -> Self {
        match raw {
            ONBOARDING_MISSION => MissionKind::UniversityOnboarding,
            PERSONA_ENHANCEMENT_MISSION => MissionKind::PersonaEnhancement,
            _ => MissionKind::Other,
        }
    }
}

/// The singleton strategic objectives document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub mission: String,
    #[serde(default, alias = "organizations")]
    pub universities: Vec<String>,
    #[serde(default)]
    pub target_programs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_personas: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhancement_level: Option<EnhancementLevel>,
    #[serde(default)]
    pub success_metrics: BTreeMap<String, Value>,
    #[serde(default)]
    pub constraints: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Mission {
    pub fn kind(&self) -> MissionKind {
        MissionKind::parse(&self.mission)
    }

    /// A mission without a status is active; anything other than `active` is not.
    pub fn is_active(&self) -> bool {
        self.status.as_deref().is_none_or(|status| status == "active")
    }

    /// Target organizations when this is an onboarding mission.
    pub fn onboarding_targets(&self) -> Option<&[String]> {
        (self.kind() == MissionKind::UniversityOnboarding).then_some(self.universities.as_slice())
    }

    /// Onboarding mission for the given organizations.
    pub fn onboarding(
        organizations: Vec<String>,
        programs: Option<Vec<String>>,
        created_at: String,
    ) -> Self {
        let target_programs = programs.unwrap_or_else(|| {
            DEFAULT_TARGET_PROGRAMS
                .iter()
                .map(|program| program.to_string())
                .collect()
        });
        let success_metrics = BTreeMap::from([
            ("personas_per_program".to_string(), Value::from(3)),
            ("data_completeness_threshold".to_string(), Value::from(0.8)),
            ("campaign_readiness_score".to_string(), Value::from(0.75)),
        ]);
        let constraints = BTreeMap::from([
            ("max_iterations".to_string(), Value::from(10)),
            ("budget_limit".to_string(), Value::Null),
            ("timeline_days".to_string(), Value::from(30)),
        ]);
        Self {
            mission: ONBOARDING_MISSION.to_string(),
            universities: organizations,
            target_programs,
            target_personas: Vec::new(),
            enhancement_level: None,
            success_metrics,
            constraints,
            status: Some("active".to_string()),
            created_at: Some(created_at),
        }
    }

    /// Persona enhancement mission for the given persona categories.
    pub fn persona_enhancement(
        personas: Vec<String>,
        level: EnhancementLevel,
        created_at: String,
    ) -> Self {
        let profile = level.profile();
        let success_metrics = BTreeMap::from([(
            "validation_threshold".to_string(),
            Value::from(profile.validation_threshold),
        )]);
        let constraints = BTreeMap::from([
            (
                "required_fields".to_string(),
                Value::from(profile.required_fields.to_vec()),
            ),
            (
                "data_sources".to_string(),
                Value::from(profile.data_sources.to_vec()),
            ),
        ]);
        Self {
            mission: PERSONA_ENHANCEMENT_MISSION.to_string(),
            universities: Vec::new(),
            target_programs: Vec::new(),
            target_personas: personas,
            enhancement_level: Some(level),
            success_metrics,
            constraints,
            status: Some("active".to_string()),
            created_at: Some(created_at),
        }
    }
}

/// Depth of a persona enhancement mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EnhancementLevel {
    Basic,
    Comprehensive,
    Advanced,
}

/// Requirements attached to an enhancement level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnhancementProfile {
    pub required_fields: &'static [&'static str],
    pub data_sources: &'static [&'static str],
    pub validation_threshold: f64,
}

impl EnhancementLevel {
    pub fn profile(self) -> EnhancementProfile {
        match self {
            EnhancementLevel::Basic => EnhancementProfile {
                required_fields: &["demographics", "motivations", "pain_points"],
                data_sources: &["template", "synthetic"],
                validation_threshold: 0.6,
            },
            EnhancementLevel::Comprehensive => EnhancementProfile {
                required_fields: &[
                    "demographics",
                    "motivations",
                    "pain_points",
                    "channels",
                    "behavior_patterns",
                    "conversion_triggers",
                ],
                data_sources: &["template", "synthetic", "market_research"],
                validation_threshold: 0.8,
            },
            EnhancementLevel::Advanced => EnhancementProfile {
                required_fields: &[
                    "demographics",
                    "motivations",
                    "pain_points",
                    "channels",
                    "behavior_patterns",
                    "conversion_triggers",
                    "journey_mapping",
                    "attribution_data",
                ],
                data_sources: &["template", "synthetic", "market_research", "campaign_data"],
                validation_threshold: 0.9,
            },
        }
    }
}

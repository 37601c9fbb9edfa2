//! Organization/program catalog and persona templates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_ENROLLMENT_GOAL: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(alias = "universities")]
    pub organizations: Vec<Organization>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub persona_templates: BTreeMap<String, PersonaTemplate>,
}

impl Catalog {
    pub fn organization(&self, id: &str) -> Option<&Organization> {
        self.organizations.iter().find(|org| org.id == id)
    }

    /// First persona category in catalog order, if any program declares one.
    pub fn first_persona_category(&self) -> Option<&str> {
        self.organizations
            .iter()
            .flat_map(|org| org.programs.iter())
            .flat_map(|program| program.target_personas.iter())
            .map(String::as_str)
            .next()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub programs: Vec<Program>,
}

impl Organization {
    /// Every configured (program, category) pair, in catalog order.
    pub fn persona_slots(&self) -> impl Iterator<Item = (&Program, &str)> {
        self.programs.iter().flat_map(|program| {
            program
                .target_personas
                .iter()
                .map(move |category| (program, category.as_str()))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub target_personas: Vec<String>,
    #[serde(default = "default_enrollment_goal")]
    pub enrollment_goals: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

impl Program {
    pub fn priority(&self) -> &str {
        self.priority.as_deref().unwrap_or("medium")
    }
}

fn default_enrollment_goal() -> u32 {
    DEFAULT_ENROLLMENT_GOAL
}

/// Seed data for synthesizing a persona of one category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaTemplate {
    pub demographics: BTreeMap<String, Value>,
    pub motivations: Vec<String>,
    pub pain_points: Vec<String>,
    pub channels: Vec<String>,
}

/// Composite identifier of a persona: `<org>_<program>_<category>`.
///
/// This is the duplicate-detection key everywhere personas are stored, and the
/// local file stem. Catalog validation keeps organization ids free of `_`, so
/// keys of different organizations never collide. Within one organization the
/// split between program and category is still ambiguous: program `a_b` with
/// category `c` and program `a` with category `b_c` share a key.
pub fn persona_key(organization: &str, program: &str, category: &str) -> String {
    format!("{organization}_{program}_{category}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        serde_json::from_value(serde_json::json!({
            "universities": [{
                "id": "msu",
                "name": "Michigan State",
                "programs": [
                    {"id": "mba", "name": "MBA", "target_personas": ["career_changer", "working_professional"]},
                    {"id": "mscs", "name": "MSCS", "target_personas": ["tech_professional"], "enrollment_goals": 40, "priority": "high"}
                ]
            }]
        }))
        .expect("catalog")
    }

    #[test]
    fn persona_slots_follow_catalog_order() {
        let catalog = catalog();
        let org = catalog.organization("msu").expect("org");
        let slots: Vec<(String, &str)> = org
            .persona_slots()
            .map(|(program, category)| (program.id.clone(), category))
            .collect();
        assert_eq!(
            slots,
            vec![
                ("mba".to_string(), "career_changer"),
                ("mba".to_string(), "working_professional"),
                ("mscs".to_string(), "tech_professional"),
            ]
        );
    }

    #[test]
    fn program_defaults_apply() {
        let catalog = catalog();
        let programs = &catalog.organizations[0].programs;
        assert_eq!(programs[0].enrollment_goals, 100);
        assert_eq!(programs[0].priority(), "medium");
        assert_eq!(programs[1].priority(), "high");
        assert_eq!(catalog.first_persona_category(), Some("career_changer"));
    }

    #[test]
    fn persona_key_is_composite() {
        assert_eq!(persona_key("msu", "mba", "career_changer"), "msu_mba_career_changer");
    }
}

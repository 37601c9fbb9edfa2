//! Persona synthesis from catalog templates and knowledge-base enrichment.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::core::catalog::{Organization, PersonaTemplate, Program, persona_key};

const DATA_COMPLETENESS: f64 = 0.85;
const SYSTEM_USER_ID: &str = "00000000-0000-0000-0000-000000000001";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramRef {
    pub id: String,
    pub name: String,
    pub enrollment_goal: u32,
}

/// Synthesized audience profile for one (organization, program, category).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaRecord {
    /// Composite key, see [`persona_key`].
    pub id: String,
    pub university: OrganizationRef,
    pub program: ProgramRef,
    pub persona_type: String,
    pub demographics: BTreeMap<String, Value>,
    pub motivations: Vec<String>,
    pub pain_points: Vec<String>,
    pub preferred_channels: Vec<String>,
    pub behavior_patterns: Value,
    pub conversion_triggers: Value,
    pub attribution_data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_alignment: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub communication_style: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_propositions: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_details: Option<Value>,
    pub created_by: String,
    pub created_at: String,
    pub data_completeness: f64,
}

/// Opaque knowledge-base documents for one organization.
///
/// A field is `null` or an empty object when the source has nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrichment {
    pub brand_guidelines: Value,
    pub voice_tone: Value,
    pub messaging: Value,
    pub program_catalog: Value,
}

/// Build the base persona record from the catalog template for `category`.
pub fn synthesize(
    org: &Organization,
    program: &Program,
    category: &str,
    template: Option<&PersonaTemplate>,
    created_by: &str,
    created_at: &str,
) -> PersonaRecord {
    let template = template.cloned().unwrap_or_default();
    let high_value_channels: Vec<String> = template.channels.iter().take(2).cloned().collect();
    PersonaRecord {
        id: persona_key(&org.id, &program.id, category),
        university: OrganizationRef {
            id: org.id.clone(),
            name: org.name.clone(),
        },
        program: ProgramRef {
            id: program.id.clone(),
            name: program.name.clone(),
            enrollment_goal: program.enrollment_goals,
        },
        persona_type: category.to_string(),
        demographics: template.demographics,
        motivations: template.motivations,
        pain_points: template.pain_points,
        preferred_channels: template.channels,
        behavior_patterns: json!({
            "research_phase_duration": "2-4 weeks",
            "decision_factors": ["program_reputation", "flexibility", "cost", "career_outcomes"],
            "content_preferences": ["case_studies", "alumni_testimonials", "program_details"],
        }),
        conversion_triggers: json!({
            "primary": "application_deadline_approaching",
            "secondary": [
                "scholarship_availability",
                "peer_recommendations",
                "career_advancement_urgency",
            ],
        }),
        attribution_data: json!({
            "typical_touchpoints": 7,
            "conversion_timeline": "30-60 days",
            "high_value_channels": high_value_channels,
        }),
        brand_alignment: None,
        communication_style: None,
        value_propositions: None,
        program_details: None,
        created_by: created_by.to_string(),
        created_at: created_at.to_string(),
        data_completeness: DATA_COMPLETENESS,
    }
}

/// Layer knowledge-base data onto a persona. Missing data leaves fields unset.
pub fn enrich(mut record: PersonaRecord, enrichment: &Enrichment) -> PersonaRecord {
    let brand = &enrichment.brand_guidelines;
    if let Some(values) = non_empty_array(brand.get("core_values")) {
        record.brand_alignment = Some(json!({
            "core_values": values,
            "brand_voice": brand.get("brand_voice").cloned().unwrap_or_else(empty_object),
        }));
    }

    let voice = &enrichment.voice_tone;
    if has_content(voice) {
        record.communication_style = Some(json!({
            "tone_attributes": voice.get("core_voice_attributes").cloned().unwrap_or_else(empty_object),
            "preferred_language": voice
                .pointer("/messaging_hierarchy/power_words")
                .cloned()
                .unwrap_or_else(|| Value::Array(Vec::new())),
        }));
    }

    if let Some(props) = non_empty_array(
        enrichment
            .messaging
            .pointer("/core_positioning/value_propositions"),
    ) {
        record.value_propositions = Some(props.clone());
    }

    let program_id = record.program.id.clone();
    let matching = ["programs", "certificates"]
        .iter()
        .filter_map(|section| enrichment.program_catalog.get(*section))
        .filter_map(Value::as_array)
        .flatten()
        .find(|program| program.get("id").and_then(Value::as_str) == Some(program_id.as_str()));
    if let Some(program) = matching {
        record.program_details = Some(json!({
            "format": program.get("format").cloned().unwrap_or_else(|| json!("Online")),
            "duration": program.get("duration").cloned().unwrap_or_else(|| json!("Varies")),
            "key_features": program.get("key_features").cloned().unwrap_or_else(|| json!([])),
            "career_outcomes": program.get("career_outcomes").cloned().unwrap_or_else(|| json!([])),
        }));
    }

    record
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

fn non_empty_array(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| v.as_array().is_some_and(|items| !items.is_empty()))
}

/// Row shape for the remote `personas` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonaRow {
    pub persona_key: String,
    pub name: String,
    pub age_range: Option<Value>,
    pub occupation: String,
    pub industry: Option<&'static str>,
    pub education_level: Option<Value>,
    pub income_range: Option<Value>,
    pub personality_traits: Vec<&'static str>,
    pub values: Vec<String>,
    pub goals: Vec<String>,
    pub pain_points: Vec<String>,
    pub preferred_channels: Vec<String>,
    pub description: String,
    pub program_category: Option<&'static str>,
    pub status: &'static str,
    pub user_id: &'static str,
    pub owner_tag: String,
    pub organization_id: String,
}

impl PersonaRow {
    pub fn from_record(record: &PersonaRecord, owner_tag: &str, organization_id: &str) -> Self {
        let demographics = &record.demographics;
        Self {
            persona_key: record.id.clone(),
            name: display_name(&record.persona_type, &record.program.name),
            age_range: demographics.get("age_range").cloned(),
            occupation: record.persona_type.clone(),
            industry: industry_for(&record.program.id),
            education_level: demographics.get("education").cloned(),
            income_range: demographics.get("income_range").cloned(),
            personality_traits: personality_traits(&record.behavior_patterns),
            values: record.motivations.clone(),
            goals: record.motivations.clone(),
            pain_points: record.pain_points.clone(),
            preferred_channels: record.preferred_channels.clone(),
            description: describe(record),
            program_category: program_category_for(&record.program.id),
            status: "active",
            user_id: SYSTEM_USER_ID,
            owner_tag: owner_tag.to_string(),
            organization_id: organization_id.to_string(),
        }
    }
}

/// `career_changer` + `MBA` → `Career Changer - MBA`.
pub fn display_name(persona_type: &str, program_name: &str) -> String {
    let title = persona_type
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!("{title} - {program_name}")
}

fn industry_for(program_id: &str) -> Option<&'static str> {
    match program_id {
        "mba" | "online_mba" => Some("Business & Management"),
        "mscs" | "ms_computer_science" => Some("Technology"),
        _ => None,
    }
}

fn program_category_for(program_id: &str) -> Option<&'static str> {
    match program_id {
        "mba" | "online_mba" => Some("Business"),
        "mscs" | "ms_computer_science" => Some("Technology"),
        _ => None,
    }
}

fn personality_traits(behavior_patterns: &Value) -> Vec<&'static str> {
    let factors: Vec<&str> = behavior_patterns
        .get("decision_factors")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let traits: Vec<&'static str> = [
        ("program_reputation", "Quality-focused"),
        ("flexibility", "Flexibility-seeking"),
        ("cost", "Cost-conscious"),
        ("career_outcomes", "Results-oriented"),
    ]
    .into_iter()
    .filter(|(factor, _)| factors.contains(factor))
    .map(|(_, label)| label)
    .collect();
    if traits.is_empty() {
        vec!["Goal-oriented", "Analytical"]
    } else {
        traits
    }
}

fn describe(record: &PersonaRecord) -> String {
    let field = |key: &str| {
        record
            .demographics
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or("N/A")
            .to_string()
    };
    let motivation = if record.motivations.is_empty() {
        "career growth".to_string()
    } else {
        record
            .motivations
            .iter()
            .take(2)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "{} years old, {} income range, {}. Motivated by {}.",
        field("age_range"),
        field("income_range"),
        field("education"),
        motivation
    )
}

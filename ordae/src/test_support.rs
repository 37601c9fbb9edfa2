//! Test-only fixtures: missions, catalogs, snapshots, workspaces and
//! in-memory collaborators.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;

use anyhow::{Result, anyhow};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};
use tempfile::TempDir;

use crate::core::catalog::{Catalog, Organization, PersonaTemplate, Program};
use crate::core::mission::Mission;
use crate::core::persona::{Enrichment, PersonaRecord};
use crate::core::snapshot::{PersonaInventory, Policy, RepoState, Snapshot};
use crate::io::knowledge::KnowledgeBase;
use crate::io::paths::WorkspacePaths;
use crate::io::store::PersonaStore;

/// Fixed observation time so snapshots compare equal across runs.
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 9, 30, 0)
        .single()
        .unwrap_or_default()
}

/// Active onboarding mission targeting `orgs` in order.
pub fn onboarding_mission(orgs: &[&str]) -> Mission {
    serde_json::from_value(json!({
        "mission": "autonomous_university_onboarding",
        "universities": orgs,
    }))
    .expect("onboarding mission fixture")
}

/// Snapshot with no catalog and the default policy.
pub fn snapshot_with(
    objectives: Option<Mission>,
    persona_data: PersonaInventory,
    repo_state: RepoState,
) -> Snapshot {
    Snapshot::new(
        fixed_time(),
        objectives,
        None,
        persona_data,
        repo_state,
        Policy::default(),
    )
}

/// Organization with `(program id, persona categories)` pairs.
pub fn organization(id: &str, programs: &[(&str, &[&str])]) -> Organization {
    Organization {
        id: id.to_string(),
        name: format!("{} University", id.to_uppercase()),
        programs: programs
            .iter()
            .map(|(program, categories)| Program {
                id: program.to_string(),
                name: program.to_uppercase(),
                target_personas: categories.iter().map(|c| c.to_string()).collect(),
                enrollment_goals: 100,
                priority: None,
            })
            .collect(),
    }
}

/// Catalog over `organizations` with a `career_changer` template.
pub fn catalog(organizations: Vec<Organization>) -> Catalog {
    let template = PersonaTemplate {
        demographics: BTreeMap::from([
            ("age_range".to_string(), json!("28-40")),
            ("education".to_string(), json!("Bachelor's degree")),
        ]),
        motivations: vec!["career_growth".to_string()],
        pain_points: vec!["time_constraints".to_string()],
        channels: vec![
            "linkedin".to_string(),
            "google_search".to_string(),
            "email".to_string(),
        ],
    };
    Catalog {
        organizations,
        persona_templates: BTreeMap::from([("career_changer".to_string(), template)]),
    }
}

/// Temporary workspace with the persona data directory created.
pub fn workspace() -> (TempDir, WorkspacePaths) {
    let temp = tempfile::tempdir().expect("tempdir");
    let paths = WorkspacePaths::new(temp.path());
    fs::create_dir_all(&paths.persona_dir).expect("create persona dir");
    (temp, paths)
}

pub fn write_catalog(paths: &WorkspacePaths, catalog: &Catalog) {
    write_json(&paths.catalog_path, &serde_json::to_value(catalog).expect("catalog json"));
}

pub fn write_mission(paths: &WorkspacePaths, mission: &Mission) {
    write_json(&paths.objectives_path, &serde_json::to_value(mission).expect("mission json"));
}

/// Materialize a local persona file for `key`.
pub fn write_local_persona(paths: &WorkspacePaths, key: &str) {
    write_json(&paths.persona_file(key), &json!({ "id": key }));
}

pub fn write_attribution_page(paths: &WorkspacePaths) {
    fs::create_dir_all(&paths.pages_dir).expect("create pages dir");
    fs::write(&paths.attribution_page_path, "export default function Attribution() {}\n")
        .expect("write attribution page");
}

fn write_json(path: &std::path::Path, value: &Value) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    let buf = serde_json::to_string_pretty(value).expect("serialize");
    fs::write(path, buf).expect("write json");
}

/// In-memory persona store with per-key failure injection.
#[derive(Debug, Default)]
pub struct MemoryPersonaStore {
    disconnected: bool,
    unreachable: bool,
    failing_keys: BTreeSet<String>,
    next_id: Cell<u32>,
    organizations: RefCell<BTreeMap<String, String>>,
    personas: RefCell<BTreeMap<String, PersonaRecord>>,
    persona_owners: RefCell<BTreeMap<String, (String, String)>>,
}

impl MemoryPersonaStore {
    /// Store that reports itself as not connected.
    pub fn disconnected() -> Self {
        Self {
            disconnected: true,
            ..Self::default()
        }
    }

    /// Store that claims a connection but fails every call.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// Fail `create_persona` for this composite key.
    pub fn failing_on(mut self, key: &str) -> Self {
        self.failing_keys.insert(key.to_string());
        self
    }

    /// Pre-seed a stored persona key.
    pub fn with_persona(self, record: PersonaRecord) -> Self {
        self.personas.borrow_mut().insert(record.id.clone(), record);
        self
    }

    pub fn persona_count(&self) -> usize {
        self.personas.borrow().len()
    }

    pub fn organization_count(&self) -> usize {
        self.organizations.borrow().len()
    }

    pub fn has_persona(&self, key: &str) -> bool {
        self.personas.borrow().contains_key(key)
    }

    /// `(owner_tag, organization store id)` recorded for `key`.
    pub fn persona_owner(&self, key: &str) -> Option<(String, String)> {
        self.persona_owners.borrow().get(key).cloned()
    }

    fn reachable(&self) -> Result<()> {
        if self.unreachable {
            return Err(anyhow!("persona store unreachable"));
        }
        Ok(())
    }

    fn allocate(&self, prefix: &str) -> String {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        format!("{prefix}-{id}")
    }
}

impl PersonaStore for MemoryPersonaStore {
    fn is_connected(&self) -> bool {
        !self.disconnected
    }

    fn find_organization(&self, id: &str) -> Result<Option<String>> {
        self.reachable()?;
        Ok(self.organizations.borrow().get(id).cloned())
    }

    fn create_organization(&self, org: &Organization) -> Result<String> {
        self.reachable()?;
        let id = self.allocate("org");
        self.organizations
            .borrow_mut()
            .insert(org.id.clone(), id.clone());
        Ok(id)
    }

    fn persona_exists(&self, key: &str) -> Result<bool> {
        self.reachable()?;
        Ok(self.has_persona(key))
    }

    fn create_persona(
        &self,
        record: &PersonaRecord,
        owner_tag: &str,
        organization_id: &str,
    ) -> Result<String> {
        self.reachable()?;
        if self.failing_keys.contains(&record.id) {
            return Err(anyhow!("injected store failure for {}", record.id));
        }
        if self.has_persona(&record.id) {
            return Err(anyhow!("duplicate persona_key {}", record.id));
        }
        self.personas
            .borrow_mut()
            .insert(record.id.clone(), record.clone());
        self.persona_owners.borrow_mut().insert(
            record.id.clone(),
            (owner_tag.to_string(), organization_id.to_string()),
        );
        Ok(self.allocate("persona"))
    }
}

/// Knowledge base answering every organization with the same documents.
#[derive(Debug, Clone, Default)]
pub struct FixedKnowledgeBase {
    pub enrichment: Enrichment,
}

impl KnowledgeBase for FixedKnowledgeBase {
    fn load_brand_guidelines(&self, _org: &str) -> Value {
        self.enrichment.brand_guidelines.clone()
    }

    fn load_voice_tone(&self, _org: &str) -> Value {
        self.enrichment.voice_tone.clone()
    }

    fn load_messaging(&self, _org: &str) -> Value {
        self.enrichment.messaging.clone()
    }

    fn load_program_catalog(&self, _org: &str) -> Value {
        self.enrichment.program_catalog.clone()
    }
}

//! Snapshot builder: read-only inspection of the workspace.
//!
//! Absent sources degrade to empty values. A mission or catalog file that
//! exists but cannot be trusted is a [`ConfigError`].

use std::fs;
use std::path::Path;

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use jsonschema::validator_for;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::core::catalog::{Catalog, persona_key};
use crate::core::mission::Mission;
use crate::core::snapshot::{OrgCoverage, PersonaInventory, Policy, RepoState, Snapshot};
use crate::io::error::ConfigError;
use crate::io::paths::WorkspacePaths;
use crate::io::store::PersonaStore;

const MISSION_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../schemas/mission.schema.json"
));
const CATALOG_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../schemas/catalog.schema.json"
));

/// Build a fresh snapshot of the workspace.
///
/// The store is consulted for persona coverage only when connected; its
/// failures count as "not stored" and are logged.
#[instrument(skip_all, fields(root = %paths.root.display()))]
pub fn build_snapshot<S: PersonaStore + ?Sized>(
    paths: &WorkspacePaths,
    policy: Policy,
    store: &S,
    observed_at: DateTime<Utc>,
) -> Result<Snapshot> {
    let objectives = load_mission(&paths.objectives_path)?;
    let catalog = load_catalog(&paths.catalog_path)?;
    let persona_data = inventory_personas(paths, catalog.as_ref(), store)?;
    let repo_state = observe_repo(paths);
    let snapshot = Snapshot::new(
        observed_at,
        objectives,
        catalog,
        persona_data,
        repo_state,
        policy,
    );
    debug!(missing = snapshot.missing_components().len(), "snapshot built");
    Ok(snapshot)
}

/// Active mission, if any. Inactive missions are treated as absent.
pub fn load_mission(path: &Path) -> Result<Option<Mission>> {
    let Some(mission) = load_validated::<Mission>(path, MISSION_SCHEMA)? else {
        return Ok(None);
    };
    if !mission.is_active() {
        debug!(status = ?mission.status, "mission not active");
        return Ok(None);
    }
    Ok(Some(mission))
}

pub fn load_catalog(path: &Path) -> Result<Option<Catalog>> {
    load_validated(path, CATALOG_SCHEMA)
}

fn load_validated<T: DeserializeOwned>(path: &Path, schema: &str) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&contents).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    validate_schema(path, schema, &value)?;
    let typed = serde_json::from_value(value).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    Ok(Some(typed))
}

fn validate_schema(path: &Path, schema: &str, instance: &Value) -> Result<()> {
    let schema_value: Value = serde_json::from_str(schema)?;
    let compiled =
        validator_for(&schema_value).map_err(|err| anyhow!("invalid schema: {}", err))?;
    if compiled.is_valid(instance) {
        return Ok(());
    }
    let messages = compiled
        .iter_errors(instance)
        .map(|err| err.to_string())
        .collect::<Vec<_>>();
    Err(ConfigError::Schema {
        path: path.to_path_buf(),
        messages,
    }
    .into())
}

fn inventory_personas<S: PersonaStore + ?Sized>(
    paths: &WorkspacePaths,
    catalog: Option<&Catalog>,
    store: &S,
) -> Result<PersonaInventory> {
    let directory_exists = paths.persona_dir.is_dir();
    let files = if directory_exists {
        list_persona_files(&paths.persona_dir)?
    } else {
        Vec::new()
    };

    let mut inventory = PersonaInventory {
        directory_exists,
        files,
        coverage: Default::default(),
    };
    let Some(catalog) = catalog else {
        return Ok(inventory);
    };

    for org in &catalog.organizations {
        let mut coverage = OrgCoverage::default();
        for (program, category) in org.persona_slots() {
            let key = persona_key(&org.id, &program.id, category);
            if persona_materialized(paths, store, &key) {
                coverage.personas_created = true;
                if !coverage.programs_covered.contains(&program.id) {
                    coverage.programs_covered.push(program.id.clone());
                }
            } else {
                coverage
                    .missing_personas
                    .push(format!("{}_{}", program.id, category));
            }
        }
        inventory.coverage.insert(org.id.clone(), coverage);
    }
    Ok(inventory)
}

/// Whether a persona with this key exists locally or in the store.
pub fn persona_materialized<S: PersonaStore + ?Sized>(
    paths: &WorkspacePaths,
    store: &S,
    key: &str,
) -> bool {
    if paths.persona_file(key).exists() {
        return true;
    }
    if !store.is_connected() {
        return false;
    }
    match store.persona_exists(key) {
        Ok(exists) => exists,
        Err(err) => {
            warn!(key, error = %format!("{err:#}"), "persona store lookup failed");
            false
        }
    }
}

fn list_persona_files(dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|source| ConfigError::Read {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let is_record = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| matches!(ext, "json" | "yaml" | "yml"));
        if path.is_file() && is_record {
            files.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    files.sort();
    Ok(files)
}

fn observe_repo(paths: &WorkspacePaths) -> RepoState {
    RepoState {
        app_exists: paths.app_dir.is_dir(),
        attribution_page: attribution_page_present(&paths.pages_dir),
        ab_plan: paths.ab_plan_path.is_file(),
        campaign_strategy: paths.campaign_strategy_path.is_file(),
    }
}

/// Any file in the pages directory whose name mentions "attribution".
fn attribution_page_present(pages_dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(pages_dir) else {
        return false;
    };
    entries.flatten().any(|entry| {
        entry.path().is_file()
            && entry
                .file_name()
                .to_string_lossy()
                .to_lowercase()
                .contains("attribution")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mission::MissionKind;
    use crate::core::snapshot::MissingComponent;
    use crate::io::store::OfflineStore;
    use crate::test_support::{
        MemoryPersonaStore, catalog, fixed_time, onboarding_mission, organization, workspace,
        write_catalog, write_local_persona, write_mission,
    };

    fn build(paths: &WorkspacePaths) -> Result<Snapshot> {
        build_snapshot(paths, Policy::default(), &OfflineStore, fixed_time())
    }

    #[test]
    fn empty_environment_degrades_to_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = WorkspacePaths::new(temp.path());
        let snapshot = build(&paths).expect("snapshot");
        assert!(snapshot.objectives.is_none());
        assert!(snapshot.catalog.is_none());
        assert!(!snapshot.persona_data.directory_exists);
        assert_eq!(
            snapshot.missing_components(),
            &[
                MissingComponent::PersonaDataDirectory,
                MissingComponent::AttributionPage
            ]
        );
    }

    #[test]
    fn malformed_mission_is_a_config_error() {
        let (_temp, paths) = workspace();
        fs::write(&paths.objectives_path, "{ not json").expect("write");
        let err = build(&paths).expect_err("malformed");
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn schema_violation_is_a_config_error() {
        let (_temp, paths) = workspace();
        fs::write(&paths.catalog_path, r#"{"organizations": [{"name": "no id"}]}"#)
            .expect("write");
        let err = build(&paths).expect_err("schema");
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Schema { .. })
        ));
    }

    fn assert_schema_error(paths: &WorkspacePaths) {
        let err = build(paths).expect_err("schema");
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Schema { .. })
        ));
    }

    #[test]
    fn path_like_catalog_ids_are_rejected() {
        for (org, program, category) in [
            ("../../escaped", "mba", "career_changer"),
            ("msu", "../mba", "career_changer"),
            ("msu", "mba", "career/changer"),
            ("msu_main", "mba", "career_changer"),
        ] {
            let (_temp, paths) = workspace();
            write_catalog(&paths, &catalog(vec![organization(org, &[(program, &[category])])]));
            assert_schema_error(&paths);
        }
    }

    #[test]
    fn path_like_mission_ids_are_rejected() {
        let (_temp, paths) = workspace();
        write_mission(&paths, &onboarding_mission(&["../escaped"]));
        assert_schema_error(&paths);
    }

    #[test]
    fn inactive_mission_is_absent() {
        let (_temp, paths) = workspace();
        let mut mission = onboarding_mission(&["msu"]);
        mission.status = Some("completed".to_string());
        write_mission(&paths, &mission);
        let snapshot = build(&paths).expect("snapshot");
        assert!(snapshot.objectives.is_none());
    }

    #[test]
    fn organizations_alias_is_accepted() {
        let (_temp, paths) = workspace();
        fs::write(
            &paths.objectives_path,
            r#"{"mission": "autonomous_university_onboarding", "organizations": ["msu"]}"#,
        )
        .expect("write");
        let snapshot = build(&paths).expect("snapshot");
        let mission = snapshot.objectives.expect("mission");
        assert_eq!(mission.kind(), MissionKind::UniversityOnboarding);
        assert_eq!(mission.universities, vec!["msu".to_string()]);
    }

    #[test]
    fn coverage_combines_local_files_and_store() {
        let (_temp, paths) = workspace();
        write_catalog(
            &paths,
            &catalog(vec![
                organization("msu", &[("mba", &["career_changer", "recent_graduate"])]),
                organization("asu", &[("mscs", &["career_changer"])]),
            ]),
        );
        write_mission(&paths, &onboarding_mission(&["msu", "asu"]));
        write_local_persona(&paths, "msu_mba_career_changer");

        let offline = build(&paths).expect("snapshot");
        let msu = &offline.persona_data.coverage["msu"];
        assert!(msu.personas_created);
        assert_eq!(msu.missing_personas, vec!["mba_recent_graduate".to_string()]);
        assert_eq!(
            offline.persona_gaps().collect::<Vec<_>>(),
            vec!["asu"]
        );

        let store = MemoryPersonaStore::default().with_persona(stored("asu_mscs_career_changer"));
        let online =
            build_snapshot(&paths, Policy::default(), &store, fixed_time()).expect("snapshot");
        assert_eq!(online.persona_gaps().count(), 0);
    }

    #[test]
    fn unreachable_store_counts_as_not_stored() {
        let (_temp, paths) = workspace();
        write_catalog(
            &paths,
            &catalog(vec![organization("msu", &[("mba", &["career_changer", "recent_graduate"])])]),
        );
        write_mission(&paths, &onboarding_mission(&["msu"]));
        write_local_persona(&paths, "msu_mba_career_changer");

        let store = MemoryPersonaStore::unreachable();
        let snapshot =
            build_snapshot(&paths, Policy::default(), &store, fixed_time()).expect("snapshot");
        let msu = &snapshot.persona_data.coverage["msu"];
        assert!(msu.personas_created);
        assert_eq!(msu.missing_personas, vec!["mba_recent_graduate".to_string()]);
        assert!(!persona_materialized(&paths, &store, "msu_mba_recent_graduate"));
    }

    #[test]
    fn attribution_detection_is_case_insensitive() {
        let (_temp, paths) = workspace();
        fs::create_dir_all(&paths.pages_dir).expect("mkdir");
        fs::write(paths.pages_dir.join("campaign-attribution.jsx"), "").expect("write");
        let snapshot = build(&paths).expect("snapshot");
        assert!(snapshot.repo_state.attribution_page);
        assert!(snapshot.repo_state.app_exists);
    }

    #[test]
    fn inventory_lists_record_files_sorted() {
        let (_temp, paths) = workspace();
        write_local_persona(&paths, "b_key");
        write_local_persona(&paths, "a_key");
        fs::write(paths.persona_dir.join("AB_PLAN.md"), "# plan").expect("write");
        let snapshot = build(&paths).expect("snapshot");
        assert_eq!(
            snapshot.persona_data.files,
            vec!["a_key.json".to_string(), "b_key.json".to_string()]
        );
        assert!(snapshot.repo_state.ab_plan);
    }

    fn stored(key: &str) -> crate::core::persona::PersonaRecord {
        let org = organization("asu", &[("mscs", &["career_changer"])]);
        let program = &org.programs[0];
        let mut record = crate::core::persona::synthesize(
            &org,
            program,
            "career_changer",
            None,
            "tests",
            "2025-01-15T09:30:00Z",
        );
        record.id = key.to_string();
        record
    }
}

//! Action Executor: perform the side effect of one decision.
//!
//! Never fails. Storage failures fall back to local persona files per record,
//! and filesystem failures are logged and leave the artifact absent, which the
//! evaluator then reports.

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::core::catalog::{Catalog, Organization, persona_key};
use crate::core::persona::{PersonaRecord, enrich, synthesize};
use crate::core::snapshot::Snapshot;
use crate::core::types::{ActionResult, Artifact, ArtifactKind, Decision, Task};
use crate::io::artifacts::{ArtifactRenderer, overwrite, write_if_absent};
use crate::io::knowledge::{KnowledgeBase, load_enrichment};
use crate::io::observe::persona_materialized;
use crate::io::paths::{AB_PLAN_FILE, CAMPAIGN_STRATEGY_FILE, WorkspacePaths};
use crate::io::store::{PersonaStore, ensure_organization};

/// Handles the executor needs for one iteration.
pub struct ActContext<'a, S: PersonaStore + ?Sized, K: KnowledgeBase + ?Sized> {
    pub paths: &'a WorkspacePaths,
    pub store: &'a S,
    pub knowledge: &'a K,
    pub renderer: &'a ArtifactRenderer,
    pub owner_tag: &'a str,
    pub now: DateTime<Utc>,
}

/// Execute `decision` against the workspace observed in `snapshot`.
#[instrument(skip_all, fields(task = decision.task.name()))]
pub fn act<S: PersonaStore + ?Sized, K: KnowledgeBase + ?Sized>(
    ctx: &ActContext<'_, S, K>,
    decision: &Decision,
    snapshot: &Snapshot,
) -> ActionResult {
    let result = match &decision.task {
        Task::CreateUniversityPersonas { organization } => {
            create_personas(ctx, organization, snapshot.catalog.as_ref())
        }
        Task::OptimizeUniversityCampaigns => optimize_campaigns(ctx, snapshot.catalog.as_ref()),
        Task::BuildAttributionPage => build_attribution_page(ctx, snapshot.catalog.as_ref()),
        Task::PlanAbForFirstPersona => plan_ab_test(ctx, snapshot.catalog.as_ref()),
        Task::Unrecognized => {
            warn!(lane = %decision.lane, "unrecognized task; nothing to execute");
            ActionResult::no_action()
        }
    };
    info!(
        status = result.status.as_str(),
        artifacts = result.artifacts.len(),
        "act complete"
    );
    result
}

/// Where new personas go for this invocation.
enum StoreTarget {
    /// No store configured; personas are local files.
    Offline,
    /// Store connected; the organization's store id.
    Organization(String),
    /// Store connected but the organization could not be resolved.
    Unavailable,
}

fn create_personas<S: PersonaStore + ?Sized, K: KnowledgeBase + ?Sized>(
    ctx: &ActContext<'_, S, K>,
    org_id: &str,
    catalog: Option<&Catalog>,
) -> ActionResult {
    let Some((catalog, org)) = catalog.and_then(|c| c.organization(org_id).map(|org| (c, org)))
    else {
        warn!(org = org_id, "organization not found in catalog; no personas created");
        return ActionResult::from_artifacts(
            Vec::new(),
            vec![format!("# university_onboarding_{org_id}")],
        );
    };

    let enrichment = load_enrichment(ctx.knowledge, org_id);
    let target = resolve_organization(ctx.store, org);
    let created_at = ctx.now.to_rfc3339();

    let mut artifacts = Vec::new();
    for (program, category) in org.persona_slots() {
        let key = persona_key(&org.id, &program.id, category);
        if persona_materialized(ctx.paths, ctx.store, &key) {
            debug!(key = %key, "persona already materialized");
            continue;
        }
        let template = catalog.persona_templates.get(category);
        let record = enrich(
            synthesize(org, program, category, template, ctx.owner_tag, &created_at),
            &enrichment,
        );
        if let Some(artifact) = place_persona(ctx, &record, &target) {
            artifacts.push(artifact);
        }
    }

    let commands = vec![
        format!("# university_onboarding_{org_id}"),
        format!("echo 'Created {} personas for {org_id}'", artifacts.len()),
    ];
    ActionResult::from_artifacts(artifacts, commands)
}

fn resolve_organization<S: PersonaStore + ?Sized>(store: &S, org: &Organization) -> StoreTarget {
    if !store.is_connected() {
        return StoreTarget::Offline;
    }
    match ensure_organization(store, org) {
        Ok(id) => StoreTarget::Organization(id),
        Err(err) => {
            warn!(org = %org.id, error = %format!("{err:#}"), "organization unavailable in persona store");
            StoreTarget::Unavailable
        }
    }
}

fn place_persona<S: PersonaStore + ?Sized, K: KnowledgeBase + ?Sized>(
    ctx: &ActContext<'_, S, K>,
    record: &PersonaRecord,
    target: &StoreTarget,
) -> Option<Artifact> {
    let kind = match target {
        StoreTarget::Offline => ArtifactKind::PersonaFile,
        StoreTarget::Unavailable => ArtifactKind::PersonaFileFallback,
        StoreTarget::Organization(org_id) => {
            match ctx.store.create_persona(record, ctx.owner_tag, org_id) {
                Ok(id) => {
                    info!(key = %record.id, store_id = %id, "persona stored");
                    return Some(Artifact {
                        kind: ArtifactKind::PersonaRecord,
                        id: record.id.clone(),
                        location: id,
                    });
                }
                Err(err) => {
                    warn!(key = %record.id, error = %format!("{err:#}"), "persona store insert failed; writing local fallback");
                    ArtifactKind::PersonaFileFallback
                }
            }
        }
    };

    let path = ctx.paths.persona_file(&record.id);
    let contents = match serde_json::to_string_pretty(record) {
        Ok(mut buf) => {
            buf.push('\n');
            buf
        }
        Err(err) => {
            warn!(key = %record.id, error = %err, "failed to serialize persona");
            return None;
        }
    };
    match write_if_absent(&path, &contents) {
        Ok(true) => {
            info!(key = %record.id, path = %path.display(), "persona written locally");
            Some(Artifact {
                kind,
                id: record.id.clone(),
                location: ctx.paths.display_relative(&path),
            })
        }
        Ok(false) => {
            debug!(key = %record.id, "persona file appeared concurrently; skipping");
            None
        }
        Err(err) => {
            warn!(key = %record.id, error = %format!("{err:#}"), "failed to write persona file");
            None
        }
    }
}

fn optimize_campaigns<S: PersonaStore + ?Sized, K: KnowledgeBase + ?Sized>(
    ctx: &ActContext<'_, S, K>,
    catalog: Option<&Catalog>,
) -> ActionResult {
    let mut artifacts = Vec::new();
    match catalog {
        None => warn!("no organization catalog; campaign strategy not written"),
        Some(catalog) => {
            let path = &ctx.paths.campaign_strategy_path;
            let written = ctx
                .renderer
                .campaign_strategy(catalog, ctx.now)
                .and_then(|contents| overwrite(path, &contents));
            match written {
                Ok(()) => artifacts.push(Artifact {
                    kind: ArtifactKind::CampaignStrategy,
                    id: CAMPAIGN_STRATEGY_FILE.to_string(),
                    location: ctx.paths.display_relative(path),
                }),
                Err(err) => {
                    warn!(error = %format!("{err:#}"), "failed to write campaign strategy");
                }
            }
        }
    }
    let programs: usize = catalog
        .map(|c| c.organizations.iter().map(|org| org.programs.len()).sum())
        .unwrap_or(0);
    let commands = vec![
        "# optimize_campaigns".to_string(),
        format!("echo 'Created campaign optimization for {programs} programs'"),
    ];
    ActionResult::from_artifacts(artifacts, commands)
}

fn build_attribution_page<S: PersonaStore + ?Sized, K: KnowledgeBase + ?Sized>(
    ctx: &ActContext<'_, S, K>,
    catalog: Option<&Catalog>,
) -> ActionResult {
    let path = &ctx.paths.attribution_page_path;
    let artifacts = ctx
        .renderer
        .attribution_page(catalog)
        .and_then(|contents| write_if_absent(path, &contents))
        .map_or_else(
            |err| {
                warn!(error = %format!("{err:#}"), "failed to write attribution page");
                Vec::new()
            },
            |created| {
                created
                    .then(|| Artifact {
                        kind: ArtifactKind::AttributionPage,
                        id: "attribution_page".to_string(),
                        location: ctx.paths.display_relative(path),
                    })
                    .into_iter()
                    .collect()
            },
        );
    let commands = ["# build_app", "npm run build", "npm run preview"]
        .iter()
        .map(|cmd| cmd.to_string())
        .collect();
    ActionResult::from_artifacts(artifacts, commands)
}

fn plan_ab_test<S: PersonaStore + ?Sized, K: KnowledgeBase + ?Sized>(
    ctx: &ActContext<'_, S, K>,
    catalog: Option<&Catalog>,
) -> ActionResult {
    let path = &ctx.paths.ab_plan_path;
    let artifacts = match ctx
        .renderer
        .ab_plan(catalog, ctx.now)
        .and_then(|contents| write_if_absent(path, &contents))
    {
        Ok(true) => vec![Artifact {
            kind: ArtifactKind::AbTestPlan,
            id: AB_PLAN_FILE.to_string(),
            location: ctx.paths.display_relative(path),
        }],
        Ok(false) => Vec::new(),
        Err(err) => {
            warn!(error = %format!("{err:#}"), "failed to write A/B testing plan");
            Vec::new()
        }
    };
    let commands = vec![
        "# plan_marketing".to_string(),
        "echo 'A/B testing plan ready for execution'".to_string(),
    ];
    ActionResult::from_artifacts(artifacts, commands)
}

//! Artifact rendering (embedded minijinja templates) and file placement.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use minijinja::{Environment, context};
use serde::Serialize;
use tracing::{debug, warn};

use crate::core::catalog::Catalog;
use crate::core::persona::display_name;
use crate::io::config::write_atomic;

const ATTRIBUTION_PAGE_TEMPLATE: &str = include_str!("templates/attribution_page.tsx");
const AB_PLAN_TEMPLATE: &str = include_str!("templates/ab_plan.md");
const CAMPAIGN_STRATEGY_TEMPLATE: &str = include_str!("templates/campaign_strategy.md");

/// Persona category the A/B plan falls back to when the catalog names none.
pub const DEFAULT_AB_PERSONA: &str = "career_changer";

const DEFAULT_ATTRIBUTION_PERSONAS: [&str; 3] =
    ["career_changer", "recent_graduate", "working_professional"];

#[derive(Debug, Serialize)]
struct OrganizationContext {
    id: String,
    name: String,
    programs: Vec<ProgramContext>,
}

#[derive(Debug, Serialize)]
struct ProgramContext {
    name: String,
    enrollment_goal: u32,
    personas: Vec<String>,
    priority: String,
}

/// Template engine wrapper around minijinja.
pub struct ArtifactRenderer {
    env: Environment<'static>,
}

impl Default for ArtifactRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("attribution_page", ATTRIBUTION_PAGE_TEMPLATE)
            .expect("attribution page template should be valid");
        env.add_template("ab_plan", AB_PLAN_TEMPLATE)
            .expect("ab plan template should be valid");
        env.add_template("campaign_strategy", CAMPAIGN_STRATEGY_TEMPLATE)
            .expect("campaign strategy template should be valid");
        Self { env }
    }

    /// Attribution dashboard listing the catalog's persona categories
    /// (first three, in catalog order).
    pub fn attribution_page(&self, catalog: Option<&Catalog>) -> Result<String> {
        let mut personas: Vec<String> = Vec::new();
        if let Some(catalog) = catalog {
            for category in catalog
                .organizations
                .iter()
                .flat_map(|org| org.persona_slots())
                .map(|(_, category)| category)
            {
                if !personas.iter().any(|known| known == category) {
                    personas.push(category.to_string());
                }
            }
        }
        if personas.is_empty() {
            personas = DEFAULT_ATTRIBUTION_PERSONAS
                .iter()
                .map(|category| category.to_string())
                .collect();
        }
        let labels: Vec<String> = personas
            .iter()
            .take(3)
            .map(|category| title_case(category))
            .collect();
        let template = self.env.get_template("attribution_page")?;
        Ok(template.render(context! { personas => labels })?)
    }

    /// A/B plan for the catalog's first persona category.
    pub fn ab_plan(&self, catalog: Option<&Catalog>, now: DateTime<Utc>) -> Result<String> {
        let category = catalog
            .and_then(Catalog::first_persona_category)
            .unwrap_or(DEFAULT_AB_PERSONA);
        let template = self.env.get_template("ab_plan")?;
        Ok(template.render(context! {
            persona => title_case(category),
            generated_on => now.format("%Y-%m-%d").to_string(),
        })?)
    }

    /// Aggregated strategy over every organization and program.
    pub fn campaign_strategy(&self, catalog: &Catalog, now: DateTime<Utc>) -> Result<String> {
        let organizations: Vec<OrganizationContext> = catalog
            .organizations
            .iter()
            .map(|org| OrganizationContext {
                id: org.id.clone(),
                name: org.name.clone(),
                programs: org
                    .programs
                    .iter()
                    .map(|program| ProgramContext {
                        name: program.name.clone(),
                        enrollment_goal: program.enrollment_goals,
                        personas: program.target_personas.clone(),
                        priority: program.priority().to_string(),
                    })
                    .collect(),
            })
            .collect();
        let template = self.env.get_template("campaign_strategy")?;
        Ok(template.render(context! {
            organizations => organizations,
            generated_on => now.format("%Y-%m-%d").to_string(),
        })?)
    }
}

/// `career_changer` → `Career Changer`.
fn title_case(category: &str) -> String {
    display_name(category, "")
        .trim_end_matches(" - ")
        .to_string()
}

/// Create `path` with `contents` unless it already exists.
///
/// Returns `false` when the file was already present.
pub fn write_if_absent(path: &Path, contents: &str) -> Result<bool> {
    create_new_with(path, |file| file.write_all(contents.as_bytes()))
}

/// Create `path` exclusively and fill it with `fill`.
///
/// A failed fill removes the file, so a later call can retry.
fn create_new_with<F>(path: &Path, fill: F) -> Result<bool>
where
    F: FnOnce(&mut File) -> std::io::Result<()>,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            debug!(path = %path.display(), "artifact already present");
            return Ok(false);
        }
        Err(err) => return Err(err).with_context(|| format!("create {}", path.display())),
    };
    if let Err(err) = fill(&mut file) {
        drop(file);
        if let Err(remove_err) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %remove_err, "failed to remove partial artifact");
        }
        return Err(err).with_context(|| format!("write {}", path.display()));
    }
    Ok(true)
}

/// Replace `path` with `contents`.
pub fn overwrite(path: &Path, contents: &str) -> Result<()> {
    write_atomic(path, contents)
}

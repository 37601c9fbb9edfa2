//! Canonical paths within a workspace.

use std::path::{Path, PathBuf};

use crate::io::config::OrdaeConfig;

pub const ATTRIBUTION_PAGE_FILE: &str = "Attribution.tsx";
pub const AB_PLAN_FILE: &str = "AB_PLAN.md";
pub const CAMPAIGN_STRATEGY_FILE: &str = "UNIVERSITY_CAMPAIGN_STRATEGY.md";

/// All paths the loop observes or writes, resolved against the workspace root.
#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    pub root: PathBuf,
    pub ordae_dir: PathBuf,
    pub config_path: PathBuf,
    pub persona_dir: PathBuf,
    pub objectives_path: PathBuf,
    pub catalog_path: PathBuf,
    pub ab_plan_path: PathBuf,
    pub campaign_strategy_path: PathBuf,
    pub app_dir: PathBuf,
    pub pages_dir: PathBuf,
    pub attribution_page_path: PathBuf,
    pub memory_dir: PathBuf,
    pub ledger_path: PathBuf,
    pub knowledge_dir: PathBuf,
}

impl WorkspacePaths {
    /// Paths with default directories (used before the config is loaded).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_config(root, &OrdaeConfig::default())
    }

    pub fn with_config(root: impl Into<PathBuf>, cfg: &OrdaeConfig) -> Self {
        let root = root.into();
        let ordae_dir = root.join(".ordae");
        let persona_dir = root.join(&cfg.persona_dir);
        let app_dir = root.join(&cfg.app_dir);
        let pages_dir = app_dir.join("pages");
        let memory_dir = root.join(&cfg.memory_dir);
        Self {
            root: root.clone(),
            config_path: config_path(&root),
            ordae_dir,
            objectives_path: persona_dir.join("strategic_objectives.json"),
            catalog_path: persona_dir.join("university_config.json"),
            ab_plan_path: persona_dir.join(AB_PLAN_FILE),
            campaign_strategy_path: persona_dir.join(CAMPAIGN_STRATEGY_FILE),
            persona_dir,
            attribution_page_path: pages_dir.join(ATTRIBUTION_PAGE_FILE),
            pages_dir,
            app_dir,
            ledger_path: memory_dir.join("ledger.json"),
            memory_dir,
            knowledge_dir: root.join(&cfg.knowledge_dir),
        }
    }

    /// Local persona record for a composite key.
    pub fn persona_file(&self, key: &str) -> PathBuf {
        self.persona_dir.join(format!("{key}.json"))
    }

    /// Path relative to the workspace root, for reporting.
    pub fn display_relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

/// Location of `config.toml` for a workspace root.
pub fn config_path(root: &Path) -> PathBuf {
    root.join(".ordae").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_are_stable() {
        let paths = WorkspacePaths::new("/ws");
        assert_eq!(paths.config_path, Path::new("/ws/.ordae/config.toml"));
        assert_eq!(
            paths.objectives_path,
            Path::new("/ws/persona_data/strategic_objectives.json")
        );
        assert_eq!(
            paths.catalog_path,
            Path::new("/ws/persona_data/university_config.json")
        );
        assert_eq!(
            paths.attribution_page_path,
            Path::new("/ws/src/pages/Attribution.tsx")
        );
        assert_eq!(paths.ledger_path, Path::new("/ws/.ordae/memory/ledger.json"));
        assert_eq!(
            paths.persona_file("msu_mba_x"),
            Path::new("/ws/persona_data/msu_mba_x.json")
        );
    }

    #[test]
    fn config_overrides_directories() {
        let cfg = OrdaeConfig {
            persona_dir: "data/personas".into(),
            app_dir: "web".into(),
            ..OrdaeConfig::default()
        };
        let paths = WorkspacePaths::with_config("/ws", &cfg);
        assert_eq!(paths.ab_plan_path, Path::new("/ws/data/personas/AB_PLAN.md"));
        assert_eq!(paths.pages_dir, Path::new("/ws/web/pages"));
        assert_eq!(
            paths.display_relative(&paths.ab_plan_path),
            "data/personas/AB_PLAN.md"
        );
    }
}

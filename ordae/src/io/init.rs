//! Initialization helpers for `.ordae/` scaffolding.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};

use crate::io::config::{OrdaeConfig, write_config};
use crate::io::ledger::Ledger;
use crate::io::paths::WorkspacePaths;

const ORDAE_GITIGNORE: &str = "memory/\n";

/// Options for `init_workspace`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite an existing config with the defaults.
    pub force: bool,
}

/// Create `.ordae/` scaffolding, the persona data directory and an empty ledger.
///
/// Fails if `.ordae/config.toml` already exists unless `options.force` is set.
/// Existing persona data is never touched.
pub fn init_workspace(root: &Path, options: &InitOptions) -> Result<WorkspacePaths> {
    let cfg = OrdaeConfig::default();
    let paths = WorkspacePaths::with_config(root, &cfg);
    if paths.config_path.exists() && !options.force {
        return Err(anyhow!(
            "ordae init: {} already exists (use --force to overwrite)",
            paths.display_relative(&paths.config_path)
        ));
    }
    if paths.ordae_dir.exists() && !paths.ordae_dir.is_dir() {
        return Err(anyhow!("ordae init: .ordae exists but is not a directory"));
    }

    create_dir(&paths.ordae_dir)?;
    create_dir(&paths.persona_dir)?;
    create_dir(&paths.memory_dir)?;
    write_config(&paths.config_path, &cfg)?;
    let gitignore = paths.ordae_dir.join(".gitignore");
    if !gitignore.exists() {
        fs::write(&gitignore, ORDAE_GITIGNORE)
            .with_context(|| format!("write {}", gitignore.display()))?;
    }
    Ledger::new(&paths.ledger_path).ensure_exists()?;

    Ok(paths)
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("create directory {}", path.display()))
}

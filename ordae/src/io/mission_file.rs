//! Strategic objectives file management for `ordae mission`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::mission::Mission;
use crate::io::config::write_atomic;

/// Atomically replace the objectives file with `mission`.
pub fn write_mission(path: &Path, mission: &Mission) -> Result<()> {
    debug!(path = %path.display(), mission = %mission.mission, "writing objectives");
    let mut buf = serde_json::to_string_pretty(mission).context("serialize objectives")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

/// Remove the objectives file. Returns `false` when there was none.
pub fn clear_mission(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(path).with_context(|| format!("remove objectives {}", path.display()))?;
    Ok(true)
}

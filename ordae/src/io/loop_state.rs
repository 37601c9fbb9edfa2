//! Loop state documents for `ordae run --state`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::state::LoopState;

/// Load an initial loop state. A blank file is an empty state.
pub fn load_loop_state(path: &Path) -> Result<LoopState> {
    debug!(path = %path.display(), "loading loop state");
    let contents =
        fs::read_to_string(path).with_context(|| format!("read loop state {}", path.display()))?;
    if contents.trim().is_empty() {
        return Ok(LoopState::default());
    }
    serde_json::from_str(&contents).with_context(|| format!("parse loop state {}", path.display()))
}

/// Pretty JSON rendering used for `--json` output.
pub fn render_loop_state(state: &LoopState) -> Result<String> {
    serde_json::to_string_pretty(state).context("serialize loop state")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_file_is_empty_state() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("state.json");
        fs::write(&path, "\n").expect("write");
        assert_eq!(load_loop_state(&path).expect("load"), LoopState::default());
    }

    #[test]
    fn missing_file_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = load_loop_state(&temp.path().join("missing.json")).expect_err("missing");
        assert!(err.to_string().contains("read loop state"));
    }

    #[test]
    fn rendered_state_loads_back() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("state.json");
        let state = LoopState {
            iteration: 7,
            ..LoopState::default()
        };
        fs::write(&path, render_loop_state(&state).expect("render")).expect("write");
        assert_eq!(load_loop_state(&path).expect("load"), state);
    }
}

//! CLI tests for `ordae run` and friends.
//!
//! Spawns the ordae binary in a temporary workspace and verifies exit codes
//! and the files each command leaves behind.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use ordae::exit_codes;
use ordae::io::init::{InitOptions, init_workspace};
use ordae::io::ledger::Ledger;
use ordae::io::paths::WorkspacePaths;

fn ordae(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ordae"))
        .current_dir(root)
        .args(args)
        .output()
        .expect("spawn ordae")
}

#[test]
fn run_on_empty_workspace_builds_attribution_page() {
    let temp = tempfile::tempdir().expect("tempdir");
    init_workspace(temp.path(), &InitOptions { force: false }).expect("init");

    let output = ordae(temp.path(), &["run"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let phases: Vec<&str> = stdout
        .lines()
        .filter_map(|line| line.split(':').next())
        .collect();
    assert_eq!(phases, vec!["observe", "remember", "decide", "act", "evaluate"]);
    assert!(stdout.contains("task=build_attribution_page"));

    let paths = WorkspacePaths::new(temp.path());
    assert!(paths.attribution_page_path.is_file());
    assert_eq!(Ledger::new(&paths.ledger_path).entries().len(), 1);
}

#[test]
fn run_with_json_prints_final_state() {
    let temp = tempfile::tempdir().expect("tempdir");
    let state_path = temp.path().join("state.json");
    fs::write(&state_path, "{}").expect("write state");

    let output = ordae(
        temp.path(),
        &["run", "--iteration", "4", "--state", "state.json", "--json"],
    );

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json_start = stdout.find('{').expect("json output");
    let state: serde_json::Value =
        serde_json::from_str(&stdout[json_start..]).expect("parse state");
    assert_eq!(state["iteration"], 4);
    assert_eq!(state["decision"]["lane"], "product");
    assert_eq!(state["evaluation"]["verdict"], "pass");
}

#[test]
fn malformed_mission_exits_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");
    let paths = init_workspace(temp.path(), &InitOptions { force: false }).expect("init");
    fs::write(&paths.objectives_path, "{ not json").expect("write mission");

    let output = ordae(temp.path(), &["run"]);

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(Ledger::new(&paths.ledger_path).entries().is_empty());
    assert!(!paths.attribution_page_path.exists());
}

#[test]
fn onboarding_unknown_organization_exits_failed() {
    let temp = tempfile::tempdir().expect("tempdir");
    init_workspace(temp.path(), &InitOptions { force: false }).expect("init");

    let mission = ordae(temp.path(), &["mission", "onboard", "--org", "ghost"]);
    assert_eq!(mission.status.code(), Some(exit_codes::OK));

    let output = ordae(temp.path(), &["run"]);
    assert_eq!(output.status.code(), Some(exit_codes::FAILED));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("target=ghost"));
    assert!(stdout.contains("verdict=fail"));

    let progress = ordae(temp.path(), &["progress"]);
    assert_eq!(progress.status.code(), Some(exit_codes::OK));
    let summary = String::from_utf8_lossy(&progress.stdout);
    assert!(summary.contains("mission=autonomous_university_onboarding"));
    assert!(summary.contains("iterations_completed=1"));
    assert!(summary.contains("successful=0"));
}

#[test]
fn decide_has_no_side_effects() {
    let temp = tempfile::tempdir().expect("tempdir");
    let paths = init_workspace(temp.path(), &InitOptions { force: false }).expect("init");

    let output = ordae(temp.path(), &["decide"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let decision: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("decision json");
    assert_eq!(decision["task"]["kind"], "build_attribution_page");
    assert!(!paths.attribution_page_path.exists());
    assert!(Ledger::new(&paths.ledger_path).entries().is_empty());
}

#[test]
fn mission_clear_removes_objectives() {
    let temp = tempfile::tempdir().expect("tempdir");
    let paths = init_workspace(temp.path(), &InitOptions { force: false }).expect("init");

    let enhance = ordae(
        temp.path(),
        &["mission", "enhance", "--persona", "career_changer", "--level", "basic"],
    );
    assert_eq!(enhance.status.code(), Some(exit_codes::OK));
    assert!(paths.objectives_path.is_file());

    let clear = ordae(temp.path(), &["mission", "clear"]);
    assert_eq!(clear.status.code(), Some(exit_codes::OK));
    assert!(!paths.objectives_path.exists());
}

#[test]
fn init_twice_requires_force() {
    let temp = tempfile::tempdir().expect("tempdir");
    assert_eq!(ordae(temp.path(), &["init"]).status.code(), Some(exit_codes::OK));
    assert_eq!(
        ordae(temp.path(), &["init"]).status.code(),
        Some(exit_codes::INVALID)
    );
    assert_eq!(
        ordae(temp.path(), &["init", "--force"]).status.code(),
        Some(exit_codes::OK)
    );
}

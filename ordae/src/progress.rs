//! Read-only progress monitor over the objectives file and the ledger.

use std::fmt;

use anyhow::Result;
use serde::Serialize;

use crate::io::ledger::Ledger;
use crate::io::observe::load_mission;
use crate::io::paths::WorkspacePaths;

pub const NO_ACTIVE_OBJECTIVES: &str = "no_active_objectives";

/// Progress of the active mission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressReport {
    /// Active mission name, or `no_active_objectives`.
    pub mission: String,
    /// Onboarding targets or enhancement personas of the active mission.
    pub targets: Vec<String>,
    pub iterations_completed: usize,
    pub successful_iterations: usize,
    pub success_rate: f64,
    pub last_iteration: Option<u32>,
    pub last_focus: Option<String>,
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "progress: mission={} iterations_completed={} successful={} success_rate={:.2}",
            self.mission, self.iterations_completed, self.successful_iterations, self.success_rate
        )?;
        if let Some(iteration) = self.last_iteration {
            write!(f, " last_iteration={iteration}")?;
        }
        write!(f, " last_focus={}", self.last_focus.as_deref().unwrap_or("none"))
    }
}

/// Summarize the ledger against the active mission.
///
/// A malformed objectives file is a configuration error; the ledger is only
/// read, and a corrupt one counts as empty.
pub fn summarize(paths: &WorkspacePaths) -> Result<ProgressReport> {
    let mission = load_mission(&paths.objectives_path)?;
    let entries = Ledger::new(&paths.ledger_path).entries();

    let iterations_completed = entries.len();
    let successful_iterations = entries
        .iter()
        .filter(|entry| entry.evaluation.passed())
        .count();
    let success_rate = if iterations_completed == 0 {
        0.0
    } else {
        successful_iterations as f64 / iterations_completed as f64
    };
    let last = entries.last();

    let (name, targets) = match mission {
        Some(mission) => {
            let targets = if mission.universities.is_empty() {
                mission.target_personas
            } else {
                mission.universities
            };
            (mission.mission, targets)
        }
        None => (NO_ACTIVE_OBJECTIVES.to_string(), Vec::new()),
    };

    Ok(ProgressReport {
        mission: name,
        targets,
        iterations_completed,
        successful_iterations,
        success_rate,
        last_iteration: last.map(|entry| entry.iteration),
        last_focus: last.and_then(|entry| entry.evaluation.next_iteration_focus.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::snapshot::{PersonaInventory, RepoState};
    use crate::core::types::{ActionResult, Decision, Evaluation, Task, Verdict};
    use crate::io::ledger::LedgerEntry;
    use crate::test_support::{fixed_time, onboarding_mission, snapshot_with, workspace, write_mission};

    fn entry(iteration: u32, verdict: Verdict, focus: Option<&str>) -> LedgerEntry {
        LedgerEntry {
            timestamp: fixed_time(),
            iteration,
            snapshot: snapshot_with(None, PersonaInventory::default(), RepoState::default()),
            decision: Decision::new(Task::PlanAbForFirstPersona, "test").expect("decision"),
            actions: ActionResult::no_action(),
            evaluation: Evaluation {
                verdict,
                validation_results: Vec::new(),
                recommendations: Vec::new(),
                next_iteration_focus: focus.map(str::to_string),
            },
        }
    }

    #[test]
    fn no_objectives_and_no_ledger() {
        let (_temp, paths) = workspace();
        let report = summarize(&paths).expect("summary");
        assert_eq!(report.mission, NO_ACTIVE_OBJECTIVES);
        assert_eq!(report.iterations_completed, 0);
        assert_eq!(report.success_rate, 0.0);
        assert_eq!(report.last_focus, None);
    }

    #[test]
    fn counts_successful_iterations() {
        let (_temp, paths) = workspace();
        write_mission(&paths, &onboarding_mission(&["msu", "asu"]));
        let ledger = Ledger::new(&paths.ledger_path);
        ledger.append(entry(1, Verdict::Pass, Some("university_onboarding"))).expect("append");
        ledger.append(entry(2, Verdict::Fail, None)).expect("append");
        ledger.append(entry(3, Verdict::Pass, Some("campaign_optimization"))).expect("append");
        ledger.append(entry(4, Verdict::Pass, Some("campaign_execution"))).expect("append");

        let report = summarize(&paths).expect("summary");
        assert_eq!(report.mission, "autonomous_university_onboarding");
        assert_eq!(report.targets, vec!["msu", "asu"]);
        assert_eq!(report.iterations_completed, 4);
        assert_eq!(report.successful_iterations, 3);
        assert!((report.success_rate - 0.75).abs() < f64::EPSILON);
        assert_eq!(report.last_iteration, Some(4));
        assert_eq!(report.last_focus.as_deref(), Some("campaign_execution"));
        assert!(report.to_string().contains("success_rate=0.75"));
    }
}

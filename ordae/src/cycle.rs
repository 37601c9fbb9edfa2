//! Orchestration for a single ORDAE iteration (`ordae run`).
//!
//! Observe → Remember → Decide → Act → Evaluate, strictly in order. Every
//! phase reports a [`PhaseReport`] to the caller before the next one starts.

use std::fmt;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, instrument};

use crate::act::{ActContext, act};
use crate::core::decide::decide;
use crate::core::evaluate::evaluate;
use crate::core::snapshot::Snapshot;
use crate::core::state::LoopState;
use crate::core::types::{ActionStatus, Decision, Lane, Verdict};
use crate::io::artifacts::ArtifactRenderer;
use crate::io::config::OrdaeConfig;
use crate::io::knowledge::KnowledgeBase;
use crate::io::ledger::{Ledger, LedgerEntry};
use crate::io::observe::build_snapshot;
use crate::io::paths::WorkspacePaths;
use crate::io::store::PersonaStore;

/// Status of one completed phase.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseReport {
    Observe {
        mission: Option<String>,
        missing: Vec<String>,
    },
    Remember {
        iteration: u32,
        prior_entries: usize,
        last_focus: Option<String>,
        last_verdict: Option<Verdict>,
    },
    Decide {
        lane: Lane,
        task: &'static str,
        target: Option<String>,
        reasoning: String,
    },
    Act {
        status: ActionStatus,
        artifacts: usize,
        fallbacks: Vec<String>,
    },
    Evaluate {
        verdict: Verdict,
        focus: Option<String>,
    },
}

impl fmt::Display for PhaseReport {
    /// One `key=value` status line per phase.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseReport::Observe { mission, missing } => write!(
                f,
                "observe: mission={} missing={}",
                mission.as_deref().unwrap_or("none"),
                list(missing)
            ),
            PhaseReport::Remember {
                iteration,
                prior_entries,
                last_focus,
                last_verdict,
            } => write!(
                f,
                "remember: iteration={iteration} prior_entries={prior_entries} last_focus={} last_verdict={}",
                last_focus.as_deref().unwrap_or("none"),
                last_verdict.map_or("none", Verdict::as_str)
            ),
            PhaseReport::Decide {
                lane,
                task,
                target,
                reasoning,
            } => {
                write!(f, "decide: lane={lane} task={task}")?;
                if let Some(target) = target {
                    write!(f, " target={target}")?;
                }
                write!(f, " reasoning={reasoning:?}")
            }
            PhaseReport::Act {
                status,
                artifacts,
                fallbacks,
            } => write!(
                f,
                "act: status={} artifacts={artifacts} fallbacks={}",
                status.as_str(),
                list(fallbacks)
            ),
            PhaseReport::Evaluate { verdict, focus } => write!(
                f,
                "evaluate: verdict={} focus={}",
                verdict.as_str(),
                focus.as_deref().unwrap_or("none")
            ),
        }
    }
}

fn list(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(",")
    }
}

fn observe_report(snapshot: &Snapshot) -> PhaseReport {
    PhaseReport::Observe {
        mission: snapshot.mission_name().map(str::to_string),
        missing: snapshot
            .missing_components()
            .iter()
            .map(ToString::to_string)
            .collect(),
    }
}

fn decide_report(decision: &Decision) -> PhaseReport {
    PhaseReport::Decide {
        lane: decision.lane,
        task: decision.task.name(),
        target: decision.task.target().map(str::to_string),
        reasoning: decision.reasoning.clone(),
    }
}

/// Observe and decide without side effects (`ordae decide`).
pub fn preview<S: PersonaStore + ?Sized>(
    paths: &WorkspacePaths,
    cfg: &OrdaeConfig,
    store: &S,
) -> Result<(Snapshot, Decision)> {
    let snapshot = build_snapshot(paths, cfg.policy, store, Utc::now())?;
    let decision = decide(&snapshot);
    Ok((snapshot, decision))
}

/// Execute one iteration and return the final state.
///
/// `iteration` is recorded as given. Configuration errors abort before the
/// ledger is written; the ledger entry is appended once, after Evaluate.
#[instrument(skip_all, fields(iteration = iteration))]
pub fn run_iteration<S, K, F>(
    paths: &WorkspacePaths,
    cfg: &OrdaeConfig,
    store: &S,
    knowledge: &K,
    iteration: u32,
    initial: LoopState,
    mut on_phase: F,
) -> Result<LoopState>
where
    S: PersonaStore + ?Sized,
    K: KnowledgeBase + ?Sized,
    F: FnMut(&PhaseReport),
{
    let mut state = initial;
    state.iteration = iteration;

    // Observe
    let snapshot = build_snapshot(paths, cfg.policy, store, Utc::now())?;
    on_phase(&observe_report(&snapshot));

    // Remember
    let ledger = Ledger::new(&paths.ledger_path);
    ledger.ensure_exists()?;
    let remembered_at = Utc::now();
    let prior = ledger.entries();
    let last = prior.last();
    on_phase(&PhaseReport::Remember {
        iteration,
        prior_entries: prior.len(),
        last_focus: last.and_then(|entry| entry.evaluation.next_iteration_focus.clone()),
        last_verdict: last.map(|entry| entry.evaluation.verdict),
    });

    // Decide
    let decision = decide(&snapshot);
    info!(lane = %decision.lane, task = decision.task.name(), "decided");
    on_phase(&decide_report(&decision));

    // Act
    let renderer = ArtifactRenderer::new();
    let ctx = ActContext {
        paths,
        store,
        knowledge,
        renderer: &renderer,
        owner_tag: &cfg.owner_tag,
        now: Utc::now(),
    };
    let actions = act(&ctx, &decision, &snapshot);
    on_phase(&PhaseReport::Act {
        status: actions.status,
        artifacts: actions.artifacts.len(),
        fallbacks: actions.fallbacks().into_iter().map(str::to_string).collect(),
    });

    // Evaluate
    let observed = build_snapshot(paths, cfg.policy, store, Utc::now())?;
    let evaluation = evaluate(&decision, &actions, &observed);
    on_phase(&PhaseReport::Evaluate {
        verdict: evaluation.verdict,
        focus: evaluation.next_iteration_focus.clone(),
    });

    ledger.append(LedgerEntry {
        timestamp: remembered_at,
        iteration,
        snapshot: snapshot.clone(),
        decision: decision.clone(),
        actions: actions.clone(),
        evaluation: evaluation.clone(),
    })?;

    state.snapshot = Some(snapshot);
    state.decision = Some(decision);
    state.actions = Some(actions);
    state.evaluation = Some(evaluation);
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Task;

    #[test]
    fn status_lines_are_key_value() {
        let observe = PhaseReport::Observe {
            mission: None,
            missing: vec!["attribution_page".to_string()],
        };
        assert_eq!(
            observe.to_string(),
            "observe: mission=none missing=attribution_page"
        );

        let decision = Decision::new(
            Task::CreateUniversityPersonas {
                organization: "msu".to_string(),
            },
            "why",
        )
        .expect("decision");
        assert_eq!(
            decide_report(&decision).to_string(),
            "decide: lane=university_onboarding task=create_university_personas target=msu reasoning=\"why\""
        );

        let act = PhaseReport::Act {
            status: ActionStatus::Completed,
            artifacts: 2,
            fallbacks: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(act.to_string(), "act: status=completed artifacts=2 fallbacks=a,b");

        let remember = PhaseReport::Remember {
            iteration: 3,
            prior_entries: 0,
            last_focus: None,
            last_verdict: None,
        };
        assert_eq!(
            remember.to_string(),
            "remember: iteration=3 prior_entries=0 last_focus=none last_verdict=none"
        );
    }
}

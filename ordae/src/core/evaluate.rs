//! Evaluator: judge the iteration against the post-action observation.

use crate::core::snapshot::Snapshot;
use crate::core::types::{ActionResult, Decision, Evaluation, Task, Verdict};

pub const FOCUS_MARKETING_OPTIMIZATION: &str = "marketing_optimization";
pub const FOCUS_CAMPAIGN_EXECUTION: &str = "campaign_execution";
pub const FOCUS_CAMPAIGN_OPTIMIZATION: &str = "campaign_optimization";
pub const FOCUS_UNIVERSITY_ONBOARDING: &str = "university_onboarding";

/// Judge an iteration.
///
/// `observed` is a snapshot taken after the Act phase, so artifact presence
/// reflects what the executor left behind. Never retries; a failed verdict
/// only carries a remediation for the next invocation.
pub fn evaluate(decision: &Decision, actions: &ActionResult, observed: &Snapshot) -> Evaluation {
    let mut eval = Judgement::default();

    match &decision.task {
        Task::BuildAttributionPage => {
            if observed.repo_state.attribution_page {
                eval.pass(
                    "Attribution page present",
                    FOCUS_MARKETING_OPTIMIZATION,
                    "Ready to focus on A/B testing and marketing campaigns",
                );
            } else {
                eval.fail(
                    "Attribution page creation failed",
                    "Retry attribution page creation after checking the app pages directory",
                );
            }
        }
        Task::PlanAbForFirstPersona => {
            if observed.repo_state.ab_plan {
                eval.pass(
                    "A/B testing plan present",
                    FOCUS_CAMPAIGN_EXECUTION,
                    "Execute A/B test campaigns and monitor results",
                );
            } else {
                eval.fail(
                    "A/B testing plan creation failed",
                    "Retry A/B plan creation after checking the persona data directory",
                );
            }
        }
        Task::OptimizeUniversityCampaigns => {
            if observed.repo_state.campaign_strategy {
                eval.pass(
                    "Campaign strategy present",
                    FOCUS_CAMPAIGN_EXECUTION,
                    "Launch pilot campaigns for the highest-priority programs",
                );
            } else {
                eval.fail(
                    "Campaign strategy creation failed",
                    "Retry campaign optimization once the organization catalog is available",
                );
            }
        }
        Task::CreateUniversityPersonas { organization } => {
            if actions.artifacts.is_empty() {
                eval.fail(
                    &format!("No personas produced for {organization}"),
                    &format!(
                        "Check that {organization} is in the catalog with programs and target personas"
                    ),
                );
            } else {
                let focus = if observed.persona_gaps().next().is_some() {
                    FOCUS_UNIVERSITY_ONBOARDING
                } else {
                    FOCUS_CAMPAIGN_OPTIMIZATION
                };
                eval.pass(
                    &format!(
                        "Produced {} persona artifacts for {organization}",
                        actions.artifacts.len()
                    ),
                    focus,
                    "Review generated personas before campaign planning",
                );
            }
        }
        Task::Unrecognized => {
            eval.fail(
                "Decision task not recognized by this build; nothing was executed",
                "Upgrade the loop or clear the stored decision",
            );
        }
    }

    if !actions.artifacts.is_empty() {
        eval.results
            .push(format!("Produced {} artifacts", actions.artifacts.len()));
    }

    let fallbacks = actions.fallbacks();
    if !fallbacks.is_empty() {
        eval.results.push(format!(
            "Degraded completion: {} records stored locally after storage failures ({})",
            fallbacks.len(),
            fallbacks.join(", ")
        ));
        eval.recommendations
            .push("Re-sync fallback persona files to the persona store".to_string());
    }

    if !observed.missing_components().is_empty() {
        let names: Vec<String> = observed
            .missing_components()
            .iter()
            .map(ToString::to_string)
            .collect();
        eval.recommendations.push(format!(
            "Address remaining missing components: {}",
            names.join(", ")
        ));
    }

    eval.finish()
}

#[derive(Default)]
struct Judgement {
    verdict: Option<Verdict>,
    results: Vec<String>,
    recommendations: Vec<String>,
    focus: Option<String>,
}

impl Judgement {
    fn pass(&mut self, result: &str, focus: &str, recommendation: &str) {
        self.verdict = Some(Verdict::Pass);
        self.results.push(result.to_string());
        self.focus = Some(focus.to_string());
        self.recommendations.push(recommendation.to_string());
    }

    fn fail(&mut self, result: &str, remediation: &str) {
        self.verdict = Some(Verdict::Fail);
        self.results.push(result.to_string());
        self.recommendations.push(remediation.to_string());
    }

    fn finish(self) -> Evaluation {
        Evaluation {
            verdict: self.verdict.unwrap_or(Verdict::Fail),
            validation_results: self.results,
            recommendations: self.recommendations,
            next_iteration_focus: self.focus,
        }
    }
}

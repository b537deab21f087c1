//! Tailoring pipeline: summary → selection → length adjustment → emphasis → assembly.
//!
//! Steps run strictly in sequence; each depends on the previous step's output.
//! The only failure surfaced from the core is a `SelectionError`. Rewrite and emphasis
//! failures are absorbed locally and the caller always receives a complete draft.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::layout::budget::LengthVerdict;
use crate::layout::estimator::{estimate_in_background, LengthEstimator};
use crate::profile::models::{CandidateProfile, Entry};
use crate::tailoring::assembler::assemble_document;
use crate::tailoring::controller::{AdjustmentOutcome, AdjustmentStep, LengthController, TerminalState};
use crate::tailoring::emphasis::{emphasize, Emphasizer};
use crate::tailoring::selection::SelectionState;
use crate::tailoring::selector::{select_and_order, RelevanceRanker};
use crate::tailoring::summary::{tailored_summary, SummaryWriter};

/// Every capability the pipeline needs. Cloned into each request.
#[derive(Clone)]
pub struct TailoringServices {
    pub ranker: Arc<dyn RelevanceRanker>,
    pub summarizer: Arc<dyn SummaryWriter>,
    pub emphasizer: Arc<dyn Emphasizer>,
    pub estimator: Arc<dyn LengthEstimator>,
    pub controller: LengthController,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmphasisReport {
    pub rejected: Vec<String>,
    pub failed: Vec<String>,
    pub duplicates_removed: usize,
}

/// The draft returned to the caller, whether or not it fits the budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TailoredResume {
    pub summary: String,
    /// Final entries in rank order, with emphasis markers.
    pub entries: Vec<Entry>,
    pub document: String,
    pub estimated_lines: u32,
    pub max_lines: u32,
    pub verdict: LengthVerdict,
    pub terminal: TerminalState,
    pub within_budget: bool,
    pub iterations: u32,
    pub trace: Vec<AdjustmentStep>,
    pub emphasis: EmphasisReport,
}

/// Output of one pipeline run: the draft plus the pre-emphasis selection to persist.
#[derive(Debug, Clone)]
pub struct TailoringRun {
    pub resume: TailoredResume,
    pub selection: SelectionState,
}

fn validate_inputs(profile: &CandidateProfile, target: &str) -> Result<(), AppError> {
    if target.trim().is_empty() {
        return Err(AppError::Validation(
            "target_description cannot be empty".to_string(),
        ));
    }
    if profile.entries.is_empty() {
        return Err(AppError::UnprocessableEntity(
            "profile has no projects to select from".to_string(),
        ));
    }
    Ok(())
}

/// Full run: generates the summary, selects projects and fits them to the budget.
pub async fn tailor_resume(
    services: &TailoringServices,
    profile: &CandidateProfile,
    target: &str,
) -> Result<(String, TailoringRun), AppError> {
    validate_inputs(profile, target)?;

    let summary = tailored_summary(services.summarizer.as_ref(), profile, target).await;
    let k = services.controller.limits().ceiling;
    let ranked = select_and_order(services.ranker.as_ref(), &profile.entries, target, k).await?;

    let outcome = services
        .controller
        .adjust_for_length(&summary, &ranked, profile, target)
        .await?;
    let run = finish(services, profile, &summary, outcome, target).await?;
    Ok((summary, run))
}

/// Re-runs the controller on a user-chosen, ordered title list. Titles keep their
/// current working text when they were already selected, otherwise the profile text.
/// There is no reserve, so no top-up happens.
pub async fn reselect(
    services: &TailoringServices,
    profile: &CandidateProfile,
    summary: &str,
    previous: &SelectionState,
    titles: &[String],
    target: &str,
) -> Result<TailoringRun, AppError> {
    validate_inputs(profile, target)?;
    if titles.is_empty() {
        return Err(AppError::Validation("titles cannot be empty".to_string()));
    }

    let mut seen = HashSet::new();
    let mut state = SelectionState::new();
    for title in titles {
        if !seen.insert(title.as_str()) {
            return Err(AppError::Validation(format!("duplicate title: {title}")));
        }
        let entry = profile
            .entry(title)
            .ok_or_else(|| AppError::Validation(format!("unknown project title: {title}")))?;
        let text = previous.text(title).unwrap_or(&entry.description);
        state.push(title.clone(), text);
    }

    let outcome = services
        .controller
        .run(summary, state, Vec::new(), target)
        .await?;
    finish(services, profile, summary, outcome, target).await
}

async fn finish(
    services: &TailoringServices,
    profile: &CandidateProfile,
    summary: &str,
    outcome: AdjustmentOutcome,
    target: &str,
) -> Result<TailoringRun, AppError> {
    let emphasized = emphasize(services.emphasizer.as_ref(), &outcome.state.entries(), target).await;
    let document = assemble_document(profile, summary, &emphasized.entries);

    let estimate = estimate_in_background(
        services.estimator.clone(),
        summary.to_string(),
        emphasized.entries.clone(),
    )
    .await?;
    let budget = services.controller.budget();
    let estimated_lines = estimate.estimated_lines;

    info!(
        estimated_lines,
        entries = emphasized.entries.len(),
        terminal = ?outcome.terminal,
        "Tailored resume assembled"
    );

    let resume = TailoredResume {
        summary: summary.to_string(),
        entries: emphasized.entries,
        document,
        estimated_lines,
        max_lines: budget.max_lines,
        verdict: budget.classify(estimated_lines),
        terminal: outcome.terminal,
        within_budget: outcome.within_budget,
        iterations: outcome.iterations,
        trace: outcome.trace,
        emphasis: EmphasisReport {
            rejected: emphasized.rejected,
            failed: emphasized.failed,
            duplicates_removed: emphasized.duplicates_removed,
        },
    };
    Ok(TailoringRun {
        resume,
        selection: outcome.state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::budget::LengthBudget;
    use crate::tailoring::controller::AdjustmentLimits;
    use crate::tailoring::selector::{KeywordRanker, SelectionError};
    use crate::tailoring::shortener::{RewriteError, Shortener};
    use async_trait::async_trait;

    struct LineCount;

    impl LengthEstimator for LineCount {
        fn estimate_lines(&self, summary: &str, entries: &[Entry]) -> u32 {
            let count = |t: &str| t.lines().filter(|l| !l.trim().is_empty()).count() as u32;
            count(summary) + entries.iter().map(|e| count(&e.description)).sum::<u32>()
        }
    }

    struct Unavailable;

    #[async_trait]
    impl Shortener for Unavailable {
        async fn shorten(&self, _: &str, _: &str, _: i64) -> Result<String, RewriteError> {
            Err(RewriteError::Capability("offline".into()))
        }
    }

    #[async_trait]
    impl SummaryWriter for Unavailable {
        async fn write_summary(&self, _: &CandidateProfile, _: &str) -> Result<String, RewriteError> {
            Err(RewriteError::Capability("offline".into()))
        }
    }

    #[async_trait]
    impl Emphasizer for Unavailable {
        async fn emphasize_entry(&self, _: &str, _: &str, _: &[String]) -> Result<String, RewriteError> {
            Err(RewriteError::Capability("offline".into()))
        }
    }

    struct NoMatches;

    #[async_trait]
    impl RelevanceRanker for NoMatches {
        async fn rank(&self, _: &str, _: &[Entry], _: usize) -> Result<Vec<String>, SelectionError> {
            Ok(vec!["Ghost".to_string()])
        }
        fn backend(&self) -> &'static str {
            "none"
        }
    }

    fn services(ranker: Arc<dyn RelevanceRanker>) -> TailoringServices {
        let estimator: Arc<dyn LengthEstimator> = Arc::new(LineCount);
        TailoringServices {
            ranker,
            summarizer: Arc::new(Unavailable),
            emphasizer: Arc::new(Unavailable),
            estimator: estimator.clone(),
            controller: LengthController::new(
                estimator,
                Arc::new(Unavailable),
                LengthBudget::default(),
                AdjustmentLimits::default(),
            ),
        }
    }

    fn profile() -> CandidateProfile {
        let entry = |title: &str, topic: &str| {
            Entry::new(
                title,
                format!(
                    "Built a {topic} system.\nScaled the {topic} system.\nTested the {topic} system.\n\
                     Documented the {topic} system.\nTechnologies used: {topic}"
                ),
            )
        };
        CandidateProfile {
            contact: "Jane Doe".into(),
            summary: "Engineer who builds things.".into(),
            entries: vec![
                entry("Search", "search"),
                entry("Rust Service", "rust"),
                entry("Billing", "billing"),
                entry("Kafka Pipeline", "kafka"),
                entry("Mobile", "mobile"),
                entry("Infra", "terraform"),
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_pipeline_completes_with_all_capabilities_down() {
        let svc = services(Arc::new(KeywordRanker));
        let (summary, run) = tailor_resume(&svc, &profile(), "rust kafka engineer")
            .await
            .unwrap();

        assert_eq!(summary, "Engineer who builds things.");
        let resume = run.resume;
        // 1 + 4 × 5 = 21: within budget without adjustment.
        assert_eq!(resume.estimated_lines, 21);
        assert_eq!(resume.terminal, TerminalState::Converged);
        assert_eq!(resume.entries[0].title, "Rust Service");
        assert_eq!(resume.entries[1].title, "Kafka Pipeline");
        assert_eq!(resume.entries.len(), 4);
        assert_eq!(resume.emphasis.failed.len(), 4);
        assert!(resume.document.starts_with("CONTACT\nJane Doe"));
        assert_eq!(run.selection.len(), 4);
    }

    #[tokio::test]
    async fn test_pipeline_surfaces_selection_error() {
        let svc = services(Arc::new(NoMatches));
        let err = tailor_resume(&svc, &profile(), "anything").await.unwrap_err();
        assert!(matches!(err, AppError::Selection(SelectionError::NoValidTitles)));
    }

    #[tokio::test]
    async fn test_empty_target_is_validation_error() {
        let svc = services(Arc::new(KeywordRanker));
        let err = tailor_resume(&svc, &profile(), "  ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_reselect_uses_explicit_order_and_working_text() {
        let svc = services(Arc::new(KeywordRanker));
        let mut previous = SelectionState::new();
        previous.push("Billing", "Short billing text.");
        let titles = vec!["Billing".to_string(), "Search".to_string(), "Mobile".to_string()];
        let run = reselect(&svc, &profile(), "Summary.", &previous, &titles, "job")
            .await
            .unwrap();
        assert_eq!(run.selection.titles(), &titles[..]);
        assert_eq!(run.selection.text("Billing"), Some("Short billing text."));
        // 1 + 1 + 5 + 5
        assert_eq!(run.resume.estimated_lines, 12);
    }

    #[tokio::test]
    async fn test_reselect_rejects_unknown_and_duplicate_titles() {
        let svc = services(Arc::new(KeywordRanker));
        let previous = SelectionState::new();
        let unknown = vec!["Nope".to_string()];
        let err = reselect(&svc, &profile(), "S.", &previous, &unknown, "job")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let dup = vec!["Search".to_string(), "Search".to_string()];
        let err = reselect(&svc, &profile(), "S.", &previous, &dup, "job")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}

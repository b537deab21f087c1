//! Length-Adjustment Controller: fits the selected projects to the line budget.
//!
//! # Loop
//! 1. Estimate lines for summary + selection.
//! 2. Too short and a reserve entry exists → append it once (never repeated).
//! 3. Way over and above the entry floor → drop the lowest-ranked entry, repeat.
//! 4. Still over → shorten the entry with the longest text, re-estimate, repeat up to
//!    `max_iterations` times. A failed or empty rewrite drops one non-terminal line
//!    from that entry instead; the capability is called at most once per iteration.
//! 5. End `Converged` when within budget, otherwise `StoppedAtCap` with the best effort.
//!
//! Every estimate runs on the blocking pool via `estimate_in_background`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::layout::budget::LengthBudget;
use crate::layout::estimator::{estimate_in_background, LengthEstimator};
use crate::profile::models::{CandidateProfile, Entry};
use crate::tailoring::selection::SelectionState;
use crate::tailoring::shortener::{drop_non_terminal_line, shorten_entry, Shortener};

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// Entry-count bounds and the shortening cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentLimits {
    /// Bulk removal never goes below this many entries.
    pub floor: usize,
    /// Entries taken from the ranking for the initial fit.
    pub target: usize,
    /// Hard maximum, including the one-shot top-up.
    pub ceiling: usize,
    pub max_iterations: u32,
}

impl Default for AdjustmentLimits {
    fn default() -> Self {
        Self {
            floor: 3,
            target: 4,
            ceiling: 5,
            max_iterations: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalState {
    Converged,
    StoppedAtCap,
}

/// One state transition, recorded for the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum AdjustmentStep {
    Expanded {
        title: String,
        lines: u32,
    },
    Removed {
        title: String,
        lines: u32,
    },
    Shortened {
        title: String,
        lines: u32,
        technologies_restored: bool,
    },
    FellBack {
        title: String,
        reason: String,
        line_dropped: bool,
        lines: u32,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentOutcome {
    pub state: SelectionState,
    pub initial_lines: u32,
    pub final_lines: u32,
    pub terminal: TerminalState,
    pub within_budget: bool,
    /// Shortening iterations used (fallbacks included).
    pub iterations: u32,
    pub trace: Vec<AdjustmentStep>,
}

// ────────────────────────────────────────────────────────────────────────────
// Controller
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct LengthController {
    estimator: Arc<dyn LengthEstimator>,
    shortener: Arc<dyn Shortener>,
    budget: LengthBudget,
    limits: AdjustmentLimits,
}

impl LengthController {
    pub fn new(
        estimator: Arc<dyn LengthEstimator>,
        shortener: Arc<dyn Shortener>,
        budget: LengthBudget,
        limits: AdjustmentLimits,
    ) -> Self {
        Self {
            estimator,
            shortener,
            budget,
            limits,
        }
    }

    pub fn budget(&self) -> &LengthBudget {
        &self.budget
    }

    pub fn limits(&self) -> &AdjustmentLimits {
        &self.limits
    }

    async fn estimate(&self, summary: &str, state: &SelectionState) -> Result<u32, AppError> {
        let result =
            estimate_in_background(self.estimator.clone(), summary.to_string(), state.entries())
                .await?;
        Ok(result.estimated_lines)
    }

    /// Splits ranked titles into the initial selection (first `target`, with the
    /// profile's original descriptions) and the reserve. Titles missing from the
    /// profile are skipped.
    pub fn initial_fit(
        &self,
        ranked_titles: &[String],
        profile: &CandidateProfile,
    ) -> (SelectionState, Vec<Entry>) {
        let mut state = SelectionState::new();
        let mut reserve = Vec::new();
        for title in ranked_titles {
            let Some(entry) = profile.entry(title) else {
                warn!(title = %title, "Ranked title not in profile; skipping");
                continue;
            };
            if state.contains(&entry.title) || reserve.iter().any(|e: &Entry| e.title == entry.title) {
                continue;
            }
            if state.len() < self.limits.target {
                state.push(entry.title.clone(), entry.description.clone());
            } else {
                reserve.push(entry.clone());
            }
        }
        (state, reserve)
    }

    /// Initial fit from a ranking, then the adjustment loop.
    pub async fn adjust_for_length(
        &self,
        summary: &str,
        ranked_titles: &[String],
        profile: &CandidateProfile,
        target_context: &str,
    ) -> Result<AdjustmentOutcome, AppError> {
        let (state, reserve) = self.initial_fit(ranked_titles, profile);
        self.run(summary, state, reserve, target_context).await
    }

    /// The adjustment loop on an explicit selection. `reserve` holds lower-ranked
    /// entries available to the one-shot top-up, most relevant first.
    pub async fn run(
        &self,
        summary: &str,
        mut state: SelectionState,
        reserve: Vec<Entry>,
        target_context: &str,
    ) -> Result<AdjustmentOutcome, AppError> {
        let mut trace = Vec::new();
        let mut lines = self.estimate(summary, &state).await?;
        let initial_lines = lines;
        info!(
            lines,
            entries = state.len(),
            max_lines = self.budget.max_lines,
            "Length adjustment started"
        );

        // One-shot top-up.
        if self.budget.is_too_short(lines) && state.len() < self.limits.ceiling {
            if let Some(next) = reserve.into_iter().find(|e| !state.contains(&e.title)) {
                state.push(next.title.clone(), next.description);
                lines = self.estimate(summary, &state).await?;
                info!(title = %next.title, lines, "Added project");
                trace.push(AdjustmentStep::Expanded {
                    title: next.title,
                    lines,
                });
            }
        }

        // Bulk removal.
        while self.budget.is_way_over(lines) && state.len() > self.limits.floor {
            let Some(removed) = state.pop_last() else {
                break;
            };
            lines = self.estimate(summary, &state).await?;
            info!(title = %removed.title, lines, "Removed project");
            trace.push(AdjustmentStep::Removed {
                title: removed.title,
                lines,
            });
        }

        // Iterative shortening.
        let mut iterations = 0u32;
        while self.budget.is_over(lines) && iterations < self.limits.max_iterations {
            let Some(title) = state.longest_title().map(str::to_string) else {
                break;
            };
            iterations += 1;
            let current = state.text(&title).unwrap_or_default().to_string();
            let overage = self.budget.overage(lines);

            let step = match shorten_entry(self.shortener.as_ref(), &current, target_context, overage)
                .await
            {
                Ok(shortened) => {
                    state.replace(&title, shortened.text);
                    lines = self.estimate(summary, &state).await?;
                    AdjustmentStep::Shortened {
                        title,
                        lines,
                        technologies_restored: shortened.technologies_restored,
                    }
                }
                Err(e) => {
                    warn!(title = %title, error = %e, "Shortening failed; dropping one line locally");
                    let line_dropped = match drop_non_terminal_line(&current) {
                        Some(text) => state.replace(&title, text),
                        None => false,
                    };
                    lines = self.estimate(summary, &state).await?;
                    AdjustmentStep::FellBack {
                        title,
                        reason: e.to_string(),
                        line_dropped,
                        lines,
                    }
                }
            };
            info!(iteration = iterations, lines, "Shortening iteration complete");
            trace.push(step);
        }

        let within_budget = !self.budget.is_over(lines);
        let terminal = if within_budget {
            TerminalState::Converged
        } else {
            TerminalState::StoppedAtCap
        };
        if within_budget {
            info!(lines, iterations, "Length adjustment converged");
        } else {
            warn!(lines, iterations, "Length adjustment stopped over budget");
        }

        Ok(AdjustmentOutcome {
            state,
            initial_lines,
            final_lines: lines,
            terminal,
            within_budget,
            iterations,
            trace,
        })
    }
}

//! Content Selector: chooses and orders a bounded subset of projects by relevance.
//!
//! Ranking is pluggable: `AppState` carries an `Arc<dyn RelevanceRanker>`.
//! - `LlmRanker` asks the generation service for the top-k titles.
//! - `KeywordRanker` scores term overlap with the target description (no LLM call).
//!
//! Whatever the ranker returns, `select_and_order` only trusts titles that exist in the
//! profile: unknown and duplicate titles are dropped and the list is backfilled in
//! profile order.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{info, warn};

use crate::llm_client::prompts::json_system;
use crate::llm_client::{GenerationKind, GenerationRequest, GenerationResponse, LlmClient};
use crate::profile::models::Entry;
use crate::tailoring::prompts::{RANK_PROMPT_TEMPLATE, RANK_SYSTEM_ROLE};

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("ranking returned no titles that match the candidate's projects")]
    NoValidTitles,

    #[error("relevance ranking failed: {0}")]
    Ranking(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Given a target description and the full candidate set, returns up to `k` titles,
/// most relevant first. Output is treated as untrusted by `select_and_order`.
#[async_trait]
pub trait RelevanceRanker: Send + Sync {
    async fn rank(
        &self,
        target: &str,
        candidates: &[Entry],
        k: usize,
    ) -> Result<Vec<String>, SelectionError>;

    /// Backend name, reported in responses.
    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// LlmRanker
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmRanker(pub LlmClient);

#[async_trait]
impl RelevanceRanker for LlmRanker {
    async fn rank(
        &self,
        target: &str,
        candidates: &[Entry],
        k: usize,
    ) -> Result<Vec<String>, SelectionError> {
        let listing = candidates
            .iter()
            .map(|e| format!("Title: {}\nDescription:\n{}", e.title, e.description))
            .collect::<Vec<_>>()
            .join("\n\n");
        let prompt = RANK_PROMPT_TEMPLATE
            .replace("{k}", &k.to_string())
            .replace("{target}", target)
            .replace("{candidates}", &listing);
        let system = json_system(RANK_SYSTEM_ROLE);

        let response = self
            .0
            .generate(GenerationRequest {
                kind: GenerationKind::RankedTitles,
                system: &system,
                prompt: &prompt,
                temperature: None,
            })
            .await
            .map_err(|e| SelectionError::Ranking(e.to_string()))?;

        match response {
            GenerationResponse::RankedTitles(titles) => Ok(titles),
            other => Err(SelectionError::Ranking(format!(
                "unexpected {:?} response",
                other.kind()
            ))),
        }
    }

    fn backend(&self) -> &'static str {
        "llm"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// KeywordRanker
// ────────────────────────────────────────────────────────────────────────────

static TERM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z][A-Za-z0-9+#.]*[A-Za-z0-9+#]|[A-Za-z]").expect("valid regex")
});

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "in", "is", "it", "of",
    "on", "or", "our", "that", "the", "this", "to", "we", "will", "with", "you", "your",
];

/// Lowercased, stopword-free terms of at least two characters.
pub(crate) fn terms(text: &str) -> HashSet<String> {
    TERM_RE
        .find_iter(text)
        .map(|m| m.as_str().to_ascii_lowercase())
        .filter(|t| t.len() >= 2 && !STOPWORDS.contains(&t.as_str()))
        .collect()
}

/// Deterministic ranker: score = number of distinct target terms found in the
/// entry's title and description. Ties keep profile order.
pub struct KeywordRanker;

impl KeywordRanker {
    pub fn rank_sync(target: &str, candidates: &[Entry], k: usize) -> Vec<String> {
        let target_terms = terms(target);
        let mut scored: Vec<(usize, usize, &Entry)> = candidates
            .iter()
            .enumerate()
            .map(|(position, entry)| {
                let entry_terms = terms(&format!("{} {}", entry.title, entry.description));
                let score = target_terms.intersection(&entry_terms).count();
                (score, position, entry)
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        scored
            .into_iter()
            .take(k)
            .map(|(_, _, e)| e.title.clone())
            .collect()
    }
}

#[async_trait]
impl RelevanceRanker for KeywordRanker {
    async fn rank(
        &self,
        target: &str,
        candidates: &[Entry],
        k: usize,
    ) -> Result<Vec<String>, SelectionError> {
        Ok(Self::rank_sync(target, candidates, k))
    }

    fn backend(&self) -> &'static str {
        "keyword"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Selection
// ────────────────────────────────────────────────────────────────────────────

fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Filters ranked titles against the candidates and backfills to `min(k, |candidates|)`.
///
/// Fails with `NoValidTitles` when none of the ranked titles match a candidate.
pub fn reconcile_ranking(
    ranked: Vec<String>,
    candidates: &[Entry],
    k: usize,
) -> Result<Vec<String>, SelectionError> {
    let exact: HashSet<&str> = candidates.iter().map(|e| e.title.as_str()).collect();
    let loose: HashMap<String, &str> = candidates
        .iter()
        .map(|e| (normalize_title(&e.title), e.title.as_str()))
        .collect();

    let limit = k.min(candidates.len());
    let mut selected: Vec<String> = Vec::with_capacity(limit);
    let mut dropped = 0usize;

    for title in ranked {
        let resolved = if exact.contains(title.as_str()) {
            Some(title.as_str())
        } else {
            loose.get(&normalize_title(&title)).copied()
        };
        match resolved {
            Some(t) if !selected.iter().any(|s| s == t) => {
                if selected.len() < limit {
                    selected.push(t.to_string());
                }
            }
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        warn!(dropped, "Ranking returned unknown or duplicate titles");
    }
    if selected.is_empty() {
        return Err(SelectionError::NoValidTitles);
    }

    for entry in candidates {
        if selected.len() >= limit {
            break;
        }
        if !selected.iter().any(|s| s == &entry.title) {
            selected.push(entry.title.clone());
        }
    }
    Ok(selected)
}

/// Ranks candidates against the target and returns up to `k` unique, valid titles,
/// most relevant first.
pub async fn select_and_order(
    ranker: &dyn RelevanceRanker,
    candidates: &[Entry],
    target: &str,
    k: usize,
) -> Result<Vec<String>, SelectionError> {
    if candidates.is_empty() || k == 0 {
        return Err(SelectionError::NoValidTitles);
    }
    let ranked = ranker.rank(target, candidates, k).await?;
    let selected = reconcile_ranking(ranked, candidates, k)?;
    info!(
        backend = ranker.backend(),
        selected = selected.len(),
        "Projects selected"
    );
    Ok(selected)
}

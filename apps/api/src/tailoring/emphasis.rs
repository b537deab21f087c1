//! Keyword Emphasis Pass: marks relevant terms in finalized entries with `**`.
//!
//! The capability's output is verified before it is accepted:
//! - markers must be balanced and never span a line break
//! - with markers stripped, the text must equal the input exactly
//!
//! Rejected or failed entries keep their plain text. After all entries are marked,
//! repeated emphasis of the same keyword is removed so each keyword is bold once,
//! at its first occurrence in document order.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::llm_client::prompts::json_system;
use crate::llm_client::{GenerationKind, GenerationRequest, GenerationResponse, LlmClient};
use crate::markup::{is_balanced, join_spans, split_emphasis, strip_emphasis};
use crate::profile::models::Entry;
use crate::tailoring::prompts::{EMPHASIZE_PROMPT_TEMPLATE, EMPHASIZE_SYSTEM_ROLE};
use crate::tailoring::shortener::RewriteError;

#[async_trait]
pub trait Emphasizer: Send + Sync {
    /// Returns `entry_text` with emphasis markers added. `already_emphasized` lists
    /// keywords bolded earlier in the document.
    async fn emphasize_entry(
        &self,
        entry_text: &str,
        target_context: &str,
        already_emphasized: &[String],
    ) -> Result<String, RewriteError>;
}

pub struct LlmEmphasizer(pub LlmClient);

#[async_trait]
impl Emphasizer for LlmEmphasizer {
    async fn emphasize_entry(
        &self,
        entry_text: &str,
        target_context: &str,
        already_emphasized: &[String],
    ) -> Result<String, RewriteError> {
        let already = if already_emphasized.is_empty() {
            "(none)".to_string()
        } else {
            already_emphasized.join(", ")
        };
        let prompt = EMPHASIZE_PROMPT_TEMPLATE
            .replace("{already_emphasized}", &already)
            .replace("{target}", target_context)
            .replace("{entry}", entry_text);
        let system = json_system(EMPHASIZE_SYSTEM_ROLE);

        let response = self
            .0
            .generate(GenerationRequest {
                kind: GenerationKind::EmphasizedText,
                system: &system,
                prompt: &prompt,
                temperature: None,
            })
            .await
            .map_err(|e| RewriteError::Capability(e.to_string()))?;

        match response {
            GenerationResponse::EmphasizedText(text) if !text.trim().is_empty() => Ok(text),
            GenerationResponse::EmphasizedText(_) => Err(RewriteError::Empty),
            other => Err(RewriteError::Capability(format!(
                "unexpected {:?} response",
                other.kind()
            ))),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pass
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
pub struct EmphasisOutcome {
    pub entries: Vec<Entry>,
    /// Titles whose marked-up text altered the content and was discarded.
    pub rejected: Vec<String>,
    /// Titles where the capability call itself failed.
    pub failed: Vec<String>,
    /// Repeated keyword emphases removed across the document.
    pub duplicates_removed: usize,
}

/// True if `marked` is `original` plus well-formed emphasis markers only.
pub fn is_valid_emphasis(original: &str, marked: &str) -> bool {
    if !is_balanced(marked) {
        return false;
    }
    if strip_emphasis(marked) != strip_emphasis(original) {
        return false;
    }
    split_emphasis(marked)
        .iter()
        .filter(|s| s.emphasized)
        .all(|s| !s.text.contains('\n') && !s.text.trim().is_empty())
}

fn keyword_key(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Unwraps every emphasized keyword already emphasized earlier in document order.
/// Returns the number of emphases removed.
pub fn dedupe_emphasis(entries: &mut [Entry]) -> usize {
    let mut seen: HashSet<String> = HashSet::new();
    let mut removed = 0;
    for entry in entries.iter_mut() {
        let mut spans = split_emphasis(&entry.description);
        let mut changed = false;
        for span in spans.iter_mut().filter(|s| s.emphasized) {
            if !seen.insert(keyword_key(&span.text)) {
                span.emphasized = false;
                changed = true;
                removed += 1;
            }
        }
        if changed {
            entry.description = join_spans(&spans);
        }
    }
    removed
}

fn emphasized_keywords(text: &str) -> Vec<String> {
    split_emphasis(text)
        .into_iter()
        .filter(|s| s.emphasized)
        .map(|s| s.text.trim().to_string())
        .collect()
}

/// Marks up each entry in order, validating every response, then dedupes keywords
/// across the document.
pub async fn emphasize(
    emphasizer: &dyn Emphasizer,
    entries: &[Entry],
    target_context: &str,
) -> EmphasisOutcome {
    let mut outcome = EmphasisOutcome::default();
    let mut already: Vec<String> = Vec::new();

    for entry in entries {
        let description = match emphasizer
            .emphasize_entry(&entry.description, target_context, &already)
            .await
        {
            Ok(marked) if is_valid_emphasis(&entry.description, &marked) => marked,
            Ok(_) => {
                warn!(title = %entry.title, "Emphasis altered entry text; keeping plain text");
                outcome.rejected.push(entry.title.clone());
                entry.description.clone()
            }
            Err(e) => {
                warn!(title = %entry.title, error = %e, "Emphasis failed; keeping plain text");
                outcome.failed.push(entry.title.clone());
                entry.description.clone()
            }
        };
        for keyword in emphasized_keywords(&description) {
            if !already.iter().any(|k| keyword_key(k) == keyword_key(&keyword)) {
                already.push(keyword);
            }
        }
        outcome.entries.push(Entry {
            title: entry.title.clone(),
            description,
        });
    }

    outcome.duplicates_removed = dedupe_emphasis(&mut outcome.entries);
    info!(
        entries = outcome.entries.len(),
        rejected = outcome.rejected.len(),
        failed = outcome.failed.len(),
        duplicates_removed = outcome.duplicates_removed,
        "Keyword emphasis applied"
    );
    outcome
}

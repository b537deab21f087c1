//! Content Shortener: rewrites one entry's description to take fewer lines.
//!
//! The rewriting capability is untrusted. Its output always goes through:
//! 1. `normalize_sentences`: one sentence per line, each terminal-punctuated
//! 2. `restore_technologies_line`: the fixed-format `Technologies used:` line survives,
//!    as the last line
//!
//! When the capability fails or returns nothing usable, the controller applies
//! `drop_non_terminal_line` to the current text instead of calling again.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm_client::prompts::{json_system, NO_INVENTION, ONE_SENTENCE_PER_LINE};
use crate::llm_client::{GenerationKind, GenerationRequest, GenerationResponse, LlmClient};
use crate::markup::strip_emphasis;
use crate::tailoring::prompts::{SHORTEN_PROMPT_TEMPLATE, SHORTEN_SYSTEM_ROLE};

/// Low temperature keeps rewrites close to the source wording.
pub const SHORTEN_TEMPERATURE: f32 = 0.1;

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("rewrite produced no usable text")]
    Empty,

    #[error("rewrite capability failed: {0}")]
    Capability(String),
}

static TECHNOLOGIES_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:\*\*)?technolog(?:y|ies)(?:\s+used)?(?:\*\*)?\s*:").expect("valid regex")
});

const BULLET_PREFIXES: &[char] = &['\u{2022}', '\u{25CF}', '\u{25AA}', '\u{2013}', '-'];

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait Shortener: Send + Sync {
    /// `overage_hint` is how many lines the whole document is currently over budget.
    async fn shorten(
        &self,
        entry_text: &str,
        target_context: &str,
        overage_hint: i64,
    ) -> Result<String, RewriteError>;
}

pub struct LlmShortener(pub LlmClient);

#[async_trait]
impl Shortener for LlmShortener {
    async fn shorten(
        &self,
        entry_text: &str,
        target_context: &str,
        overage_hint: i64,
    ) -> Result<String, RewriteError> {
        let prompt = SHORTEN_PROMPT_TEMPLATE
            .replace("{overage}", &overage_hint.to_string())
            .replace("{one_per_line}", ONE_SENTENCE_PER_LINE)
            .replace("{no_invention}", NO_INVENTION)
            .replace("{entry}", entry_text)
            .replace("{target}", target_context);
        let system = json_system(SHORTEN_SYSTEM_ROLE);

        let response = self
            .0
            .generate(GenerationRequest {
                kind: GenerationKind::RewrittenText,
                system: &system,
                prompt: &prompt,
                temperature: Some(SHORTEN_TEMPERATURE),
            })
            .await
            .map_err(|e| RewriteError::Capability(e.to_string()))?;

        match response {
            GenerationResponse::RewrittenText(text) => Ok(text),
            other => Err(RewriteError::Capability(format!(
                "unexpected {:?} response",
                other.kind()
            ))),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Shorten + post-process
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ShortenedText {
    pub text: String,
    pub technologies_restored: bool,
}

/// Calls the capability once and post-processes its output.
pub async fn shorten_entry(
    shortener: &dyn Shortener,
    entry_text: &str,
    target_context: &str,
    overage_hint: i64,
) -> Result<ShortenedText, RewriteError> {
    let raw = shortener
        .shorten(entry_text, target_context, overage_hint)
        .await?;
    if raw.trim().is_empty() {
        return Err(RewriteError::Empty);
    }

    let normalized = normalize_sentences(&raw);
    if normalized.is_empty() {
        return Err(RewriteError::Empty);
    }

    let (text, technologies_restored) = restore_technologies_line(entry_text, &normalized);
    if technologies_restored {
        warn!("Rewrite dropped or altered the technologies line; restored original");
    }
    debug!(
        before_chars = entry_text.chars().count(),
        after_chars = text.chars().count(),
        "Entry shortened"
    );
    Ok(ShortenedText {
        text,
        technologies_restored,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Normalization
// ────────────────────────────────────────────────────────────────────────────

pub fn is_technologies_line(line: &str) -> bool {
    TECHNOLOGIES_LINE_RE.is_match(line)
}

fn strip_bullet(line: &str) -> &str {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix(BULLET_PREFIXES) {
        return rest.trim_start();
    }
    // "* item" is a bullet, "**item**" is emphasis.
    if let Some(rest) = line.strip_prefix("* ") {
        return rest.trim_start();
    }
    line
}

/// Splits after a period followed by whitespace and an uppercase letter
/// (optionally behind an emphasis marker).
fn split_sentences(line: &str) -> Vec<&str> {
    let bytes = line.as_bytes();
    let mut units = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'.' {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            let mut k = j;
            if line[k..].starts_with("**") {
                k += 2;
            }
            let next_upper = line[k..].chars().next().is_some_and(char::is_uppercase);
            if j > i + 1 && next_upper {
                units.push(&line[start..=i]);
                start = j;
                i = j;
                continue;
            }
        }
        i += 1;
    }
    units.push(&line[start..]);
    units
}

fn ensure_terminal(unit: &str) -> String {
    let plain = strip_emphasis(unit);
    if plain.ends_with(['.', ':', '!', '?']) {
        unit.to_string()
    } else {
        format!("{unit}.")
    }
}

/// One sentence per line, bullets stripped, empty lines dropped, every line ending in
/// terminal punctuation. The technologies line is kept whole and untouched.
pub fn normalize_sentences(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    for raw_line in text.lines() {
        let line = strip_bullet(raw_line);
        if line.is_empty() {
            continue;
        }
        if is_technologies_line(line) {
            out.push(line.to_string());
            continue;
        }
        for unit in split_sentences(line) {
            let unit = unit.trim();
            if !unit.is_empty() {
                out.push(ensure_terminal(unit));
            }
        }
    }
    out.join("\n")
}

// ────────────────────────────────────────────────────────────────────────────
// Technologies line repair
// ────────────────────────────────────────────────────────────────────────────

fn technologies_line(text: &str) -> Option<&str> {
    text.lines()
        .map(str::trim)
        .filter(|l| is_technologies_line(l))
        .last()
}

fn technology_items(line: &str) -> Vec<String> {
    let plain = strip_emphasis(line);
    let list = plain.split_once(':').map(|(_, rest)| rest).unwrap_or("");
    list.split([',', ';', '|'])
        .map(|item| {
            item.trim()
                .trim_end_matches('.')
                .trim()
                .to_lowercase()
        })
        .filter(|item| !item.is_empty())
        .collect()
}

/// Ensures the rewritten text still carries the original's technologies line with at
/// least the original's items, as its last line. A verified line is moved to the end;
/// a missing or truncated one is replaced by the original. Returns the repaired text and
/// whether any repair happened.
pub fn restore_technologies_line(original: &str, rewritten: &str) -> (String, bool) {
    let Some(original_line) = technologies_line(original) else {
        return (rewritten.to_string(), false);
    };
    let required = technology_items(original_line);

    let kept = technologies_line(rewritten).filter(|line| {
        let present = technology_items(line);
        required.iter().all(|item| present.contains(item))
    });

    let mut lines: Vec<&str> = rewritten
        .lines()
        .filter(|l| !l.trim().is_empty() && !is_technologies_line(l))
        .collect();
    lines.push(kept.unwrap_or(original_line));
    let repaired = lines.join("\n");
    let changed = repaired != rewritten.trim();
    (repaired, changed)
}

// ────────────────────────────────────────────────────────────────────────────
// Local fallback
// ────────────────────────────────────────────────────────────────────────────

/// Entries at or below this many lines keep the overview, detail and technologies shape.
const MIN_LINES_AFTER_FALLBACK: usize = 3;

/// Removes the last line that is neither the first (overview) line, the final line,
/// nor a technologies line. Returns `None` for entries of three lines or fewer.
pub fn drop_non_terminal_line(text: &str) -> Option<String> {
    let mut lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() <= MIN_LINES_AFTER_FALLBACK {
        return None;
    }
    let last = lines.len() - 1;
    let index = (1..last).rev().find(|&i| !is_technologies_line(lines[i]))?;
    lines.remove(index);
    Some(lines.join("\n"))
}

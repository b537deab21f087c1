//! The `**emphasis**` delimiter convention shared with the document renderer.
//!
//! Text between a pair of `**` markers is rendered bold; everything else is plain.
//! The markers never count toward layout width.

use serde::{Deserialize, Serialize};

pub const EMPHASIS_MARKER: &str = "**";

/// One run of text, either emphasized or plain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmphasisSpan {
    pub text: String,
    pub emphasized: bool,
}

/// Splits text into plain/emphasized runs. Parts at odd positions between markers
/// are emphasized. Empty runs are skipped.
pub fn split_emphasis(text: &str) -> Vec<EmphasisSpan> {
    text.split(EMPHASIS_MARKER)
        .enumerate()
        .filter(|(_, part)| !part.is_empty())
        .map(|(i, part)| EmphasisSpan {
            text: part.to_string(),
            emphasized: i % 2 == 1,
        })
        .collect()
}

/// Removes every emphasis marker, leaving the underlying text.
pub fn strip_emphasis(text: &str) -> String {
    text.replace(EMPHASIS_MARKER, "")
}

/// True if every opening marker has a closing partner.
pub fn is_balanced(text: &str) -> bool {
    text.matches(EMPHASIS_MARKER).count() % 2 == 0
}

/// Rebuilds marked-up text from spans.
pub fn join_spans(spans: &[EmphasisSpan]) -> String {
    spans
        .iter()
        .map(|s| {
            if s.emphasized {
                format!("{EMPHASIS_MARKER}{}{EMPHASIS_MARKER}", s.text)
            } else {
                s.text.clone()
            }
        })
        .collect()
}

//! Cover letter drafting.
//!
//! A letter is three sections. The introduction and conclusion come from one
//! generation call, then the body bridges them using the tailored projects. The
//! letter's length is checked once against `LETTER_MIN_LINES..=LETTER_MAX_LINES` and
//! the body rewritten a single time if it falls outside.

pub mod handlers;
pub mod prompts;
pub mod writer;

use serde::{Deserialize, Serialize};

use crate::layout::estimator::{MetricMeasurer, TextFrame};
use crate::layout::font_metrics::FontFamily;

pub use writer::{draft_cover_letter, regenerate_cover_letter, CoverLetterWriter, LetterContext, LlmCoverLetterWriter};

pub const LETTER_MIN_LINES: u32 = 25;
pub const LETTER_MAX_LINES: u32 = 40;

const LETTER_FONT_SIZE_PT: f32 = 11.0;
/// US letter with 1" margins.
const LETTER_WIDTH_PT: f32 = 612.0 - 72.0 * 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverLetter {
    pub introduction: String,
    pub body: String,
    pub conclusion: String,
    pub estimated_lines: u32,
}

impl CoverLetter {
    pub fn new(introduction: String, body: String, conclusion: String) -> Self {
        let mut letter = Self {
            introduction: introduction.trim().to_string(),
            body: body.trim().to_string(),
            conclusion: conclusion.trim().to_string(),
            estimated_lines: 0,
        };
        letter.estimated_lines = estimate_letter_lines(&render_letter(&letter));
        letter
    }

    pub fn text(&self) -> String {
        render_letter(self)
    }
}

/// Joins the sections with blank lines.
pub fn render_letter(letter: &CoverLetter) -> String {
    [&letter.introduction, &letter.body, &letter.conclusion]
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Wrapped line count of a letter in Times-Roman 11 pt; a blank separator counts as a line.
pub fn estimate_letter_lines(text: &str) -> u32 {
    let measurer = MetricMeasurer::new(FontFamily::TimesRoman, LETTER_FONT_SIZE_PT);
    let frame = TextFrame {
        first_line_width_pt: LETTER_WIDTH_PT,
        line_width_pt: LETTER_WIDTH_PT,
        leading_pt: LETTER_FONT_SIZE_PT * 1.2,
    };
    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                1
            } else {
                measurer.wrapped_lines(line, &frame)
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_letter_skips_empty_sections() {
        let letter = CoverLetter::new("Hello.".into(), "  ".into(), "Thanks.".into());
        assert_eq!(render_letter(&letter), "Hello.\n\nThanks.");
        assert_eq!(letter.estimated_lines, 3);
    }

    #[test]
    fn test_estimate_letter_lines_wraps_long_paragraphs() {
        let paragraph = "I build reliable distributed systems. ".repeat(20);
        assert!(estimate_letter_lines(&paragraph) > 1);
    }
}

//! Rendered-length estimation without a layout pass.
//!
//! The page is modelled as a flow of paragraphs: the `SUMMARY` header and summary
//! lines, the `PROJECTS` header, then each entry title followed by its description
//! lines as hanging-indent bullets. Each paragraph is word-wrapped against its frame
//! width using real glyph widths; heights are summed and divided by the body leading.
//!
//! The measurement primitive sits behind `TextMeasurer` so the controller never
//! depends on which rendering backend's metrics are in use.
//!
//! Estimation is pure and CPU-bound. Async callers go through `estimate_in_background`,
//! which runs it inside `tokio::task::spawn_blocking`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::layout::font_metrics::{get_metrics, FontFamily, PageGeometry};
use crate::markup::strip_emphasis;
use crate::profile::models::Entry;

pub const SUMMARY_HEADER: &str = "SUMMARY";
pub const PROJECTS_HEADER: &str = "PROJECTS";

/// Guards the final truncation against float noise (e.g. 23.99999 → 23).
const LINE_EPSILON: f32 = 1e-4;

// ────────────────────────────────────────────────────────────────────────────
// Measurement seam
// ────────────────────────────────────────────────────────────────────────────

/// Width constraints for one paragraph, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextFrame {
    pub first_line_width_pt: f32,
    pub line_width_pt: f32,
    pub leading_pt: f32,
}

impl TextFrame {
    /// Plain body paragraph across the full content width.
    pub fn body(geometry: &PageGeometry) -> Self {
        let width = geometry.content_width_pt();
        Self {
            first_line_width_pt: width,
            line_width_pt: width,
            leading_pt: geometry.leading_pt,
        }
    }

    /// Bullet paragraph with a hanging first line.
    pub fn bullet(geometry: &PageGeometry) -> Self {
        let width = geometry.content_width_pt() - geometry.bullet_left_indent_pt;
        Self {
            first_line_width_pt: width - geometry.bullet_first_line_indent_pt,
            line_width_pt: width,
            leading_pt: geometry.leading_pt,
        }
    }
}

/// Measures the wrapped height of one paragraph. Implementations must be pure.
pub trait TextMeasurer: Send + Sync {
    fn wrapped_height(&self, text: &str, frame: &TextFrame) -> f32;
}

/// Greedy word wrap over static AFM widths.
pub struct MetricMeasurer {
    font: FontFamily,
    font_size_pt: f32,
}

impl MetricMeasurer {
    pub fn new(font: FontFamily, font_size_pt: f32) -> Self {
        Self { font, font_size_pt }
    }

    /// Number of lines `text` occupies in `frame`. A word wider than the frame takes
    /// a line of its own.
    pub fn wrapped_lines(&self, text: &str, frame: &TextFrame) -> u32 {
        let metrics = get_metrics(&self.font);
        let space = metrics.space_width(self.font_size_pt);
        let mut lines = 0u32;
        let mut current = 0.0_f32;
        let mut limit = frame.first_line_width_pt;

        for word in text.split_whitespace() {
            let word_w = metrics.measure_str(word, self.font_size_pt);
            if lines == 0 {
                lines = 1;
                current = word_w;
                continue;
            }
            if current + space + word_w > limit {
                lines += 1;
                limit = frame.line_width_pt;
                current = word_w;
            } else {
                current += space + word_w;
            }
        }
        lines
    }
}

impl TextMeasurer for MetricMeasurer {
    fn wrapped_height(&self, text: &str, frame: &TextFrame) -> f32 {
        self.wrapped_lines(text, frame) as f32 * frame.leading_pt
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Estimator
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimationResult {
    pub estimated_lines: u32,
}

/// Estimates the rendered line count of a summary plus ordered entries.
pub trait LengthEstimator: Send + Sync {
    fn estimate_lines(&self, summary: &str, entries: &[Entry]) -> u32;
}

pub struct LineEstimator {
    measurer: Arc<dyn TextMeasurer>,
    geometry: PageGeometry,
}

impl LineEstimator {
    pub fn new(measurer: Arc<dyn TextMeasurer>, geometry: PageGeometry) -> Self {
        Self { measurer, geometry }
    }

    /// Estimator measuring with the geometry's own font tables.
    pub fn with_metrics(geometry: PageGeometry) -> Self {
        let measurer = Arc::new(MetricMeasurer::new(geometry.font, geometry.font_size_pt));
        Self::new(measurer, geometry)
    }

    fn height_of(&self, text: &str, frame: &TextFrame) -> f32 {
        let plain = strip_emphasis(text);
        let plain = plain.trim();
        if plain.is_empty() {
            return 0.0;
        }
        self.measurer.wrapped_height(plain, frame)
    }
}

impl LengthEstimator for LineEstimator {
    fn estimate_lines(&self, summary: &str, entries: &[Entry]) -> u32 {
        let body = TextFrame::body(&self.geometry);
        let bullet = TextFrame::bullet(&self.geometry);
        let mut total = 0.0_f32;

        if !summary.trim().is_empty() {
            total += self.height_of(SUMMARY_HEADER, &body);
            total += summary
                .lines()
                .map(|line| self.height_of(line, &body))
                .sum::<f32>();
        }

        if !entries.is_empty() {
            total += self.height_of(PROJECTS_HEADER, &body);
            for entry in entries {
                total += self.height_of(&entry.title, &body);
                total += entry
                    .description
                    .lines()
                    .map(|line| self.height_of(line, &bullet))
                    .sum::<f32>();
            }
        }

        (total / self.geometry.leading_pt + LINE_EPSILON).floor() as u32
    }
}

/// Runs an estimate on the blocking pool.
pub async fn estimate_in_background(
    estimator: Arc<dyn LengthEstimator>,
    summary: String,
    entries: Vec<Entry>,
) -> Result<EstimationResult, AppError> {
    let estimated_lines =
        tokio::task::spawn_blocking(move || estimator.estimate_lines(&summary, &entries))
            .await
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("spawn_blocking failed in estimation: {e}"))
            })?;
    Ok(EstimationResult { estimated_lines })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::font_metrics::default_page_geometry;

    fn estimator() -> LineEstimator {
        LineEstimator::with_metrics(default_page_geometry(FontFamily::TimesRoman))
    }

    fn entry(title: &str, lines: usize) -> Entry {
        let description = (0..lines)
            .map(|i| format!("Delivered measurable outcome number {i}."))
            .collect::<Vec<_>>()
            .join("\n");
        Entry::new(title, description)
    }

    #[test]
    fn test_empty_input_is_zero() {
        assert_eq!(estimator().estimate_lines("", &[]), 0);
    }

    #[test]
    fn test_empty_summary_contributes_nothing() {
        let est = estimator();
        let entries = vec![entry("Alpha", 2)];
        // PROJECTS header + title + two short bullets
        assert_eq!(est.estimate_lines("", &entries), 4);
        assert_eq!(est.estimate_lines("   \n", &entries), 4);
    }

    #[test]
    fn test_summary_only_counts_header_and_lines() {
        let est = estimator();
        assert_eq!(est.estimate_lines("Short one.\nShort two.", &[]), 3);
    }

    #[test]
    fn test_long_bullet_wraps() {
        let est = estimator();
        let long = "Designed and shipped a streaming ingestion pipeline that replaced nightly batch \
                    jobs, cut end-to-end data latency from hours to seconds, and gave analysts a \
                    self-serve query layer over the raw event stream with strict access controls.";
        let entries = vec![Entry::new("Pipeline", long)];
        // header + title + wrapped bullet of at least two lines
        assert!(est.estimate_lines("", &entries) >= 4);
    }

    #[test]
    fn test_emphasis_markers_do_not_count() {
        let est = estimator();
        let plain = vec![Entry::new("A", "Built with Rust and Tokio.")];
        let marked = vec![Entry::new("A", "Built with **Rust** and **Tokio**.")];
        assert_eq!(est.estimate_lines("", &plain), est.estimate_lines("", &marked));
    }

    #[test]
    fn test_monotonic_in_added_lines() {
        let est = estimator();
        let mut entries = vec![entry("Alpha", 1)];
        let mut previous = est.estimate_lines("Summary line.", &entries);
        for n in 2..8 {
            entries[0] = entry("Alpha", n);
            let next = est.estimate_lines("Summary line.", &entries);
            assert!(next >= previous, "{next} < {previous} at {n} lines");
            previous = next;
        }
        entries.push(entry("Beta", 3));
        assert!(est.estimate_lines("Summary line.", &entries) >= previous);
    }

    #[test]
    fn test_deterministic() {
        let est = estimator();
        let entries = vec![entry("Alpha", 4), entry("Beta", 3)];
        let first = est.estimate_lines("One.\nTwo.", &entries);
        for _ in 0..5 {
            assert_eq!(est.estimate_lines("One.\nTwo.", &entries), first);
        }
    }

    #[test]
    fn test_overlong_word_takes_own_line() {
        let measurer = MetricMeasurer::new(FontFamily::TimesRoman, 10.5);
        let frame = TextFrame {
            first_line_width_pt: 30.0,
            line_width_pt: 30.0,
            leading_pt: 1.0,
        };
        assert_eq!(measurer.wrapped_lines("a Supercalifragilistic b", &frame), 3);
    }

    #[test]
    fn test_bullet_frame_hangs() {
        let geometry = default_page_geometry(FontFamily::TimesRoman);
        let frame = TextFrame::bullet(&geometry);
        assert!(frame.first_line_width_pt > frame.line_width_pt);
        assert!((frame.line_width_pt - 504.0).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_estimate_in_background_matches_sync() {
        let est: Arc<dyn LengthEstimator> = Arc::new(estimator());
        let entries = vec![entry("Alpha", 3)];
        let expected = est.estimate_lines("Hi.", &entries);
        let result = estimate_in_background(est, "Hi.".to_string(), entries)
            .await
            .unwrap();
        assert_eq!(result.estimated_lines, expected);
    }
}

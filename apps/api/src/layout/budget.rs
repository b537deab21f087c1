//! Length budget: classifies an estimated line count against the target page length.
//!
//! # Thresholds
//! - below `max_lines - tolerance_band`  → too short, one extra entry may be added
//! - above `max_lines`                   → moderately over, shorten the longest entry
//! - above `max_lines + overflow_band`   → way over, drop whole entries first

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthBudget {
    pub max_lines: u32,
    pub tolerance_band: u32,
    pub overflow_band: u32,
}

impl Default for LengthBudget {
    fn default() -> Self {
        Self {
            max_lines: 24,
            tolerance_band: 5,
            overflow_band: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthVerdict {
    TooShort,
    WithinBudget,
    ModeratelyOver,
    WayOver,
}

impl LengthBudget {
    pub fn too_short_threshold(&self) -> u32 {
        self.max_lines.saturating_sub(self.tolerance_band)
    }

    pub fn moderately_over_threshold(&self) -> u32 {
        self.max_lines
    }

    pub fn way_over_threshold(&self) -> u32 {
        self.max_lines.saturating_add(self.overflow_band)
    }

    pub fn is_too_short(&self, lines: u32) -> bool {
        lines < self.too_short_threshold()
    }

    pub fn is_over(&self, lines: u32) -> bool {
        lines > self.moderately_over_threshold()
    }

    pub fn is_way_over(&self, lines: u32) -> bool {
        lines > self.way_over_threshold()
    }

    pub fn classify(&self, lines: u32) -> LengthVerdict {
        if self.is_way_over(lines) {
            LengthVerdict::WayOver
        } else if self.is_over(lines) {
            LengthVerdict::ModeratelyOver
        } else if self.is_too_short(lines) {
            LengthVerdict::TooShort
        } else {
            LengthVerdict::WithinBudget
        }
    }

    /// Lines over budget, negative when under.
    pub fn overage(&self, lines: u32) -> i64 {
        lines as i64 - self.max_lines as i64
    }
}

//! `SelectionState`: the working set the length controller mutates.
//!
//! Invariant: every title in `working_text` appears exactly once in `ordered_titles`
//! and vice versa. Both fields are private; all mutation goes through methods that
//! keep them in step.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::profile::models::Entry;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Entry>", into = "Vec<Entry>")]
pub struct SelectionState {
    ordered_titles: Vec<String>,
    working_text: HashMap<String, String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ordered_titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered_titles.is_empty()
    }

    pub fn titles(&self) -> &[String] {
        &self.ordered_titles
    }

    pub fn contains(&self, title: &str) -> bool {
        self.working_text.contains_key(title)
    }

    pub fn text(&self, title: &str) -> Option<&str> {
        self.working_text.get(title).map(String::as_str)
    }

    /// Appends an entry at the lowest rank. Returns false (and changes nothing) if the
    /// title is already selected.
    pub fn push(&mut self, title: impl Into<String>, text: impl Into<String>) -> bool {
        let title = title.into();
        if self.working_text.contains_key(&title) {
            return false;
        }
        self.working_text.insert(title.clone(), text.into());
        self.ordered_titles.push(title);
        true
    }

    /// Removes the lowest-ranked entry, discarding its text.
    pub fn pop_last(&mut self) -> Option<Entry> {
        let title = self.ordered_titles.pop()?;
        let description = self.working_text.remove(&title).unwrap_or_default();
        Some(Entry { title, description })
    }

    /// Replaces the working text of a selected entry. Returns false if not selected.
    pub fn replace(&mut self, title: &str, text: String) -> bool {
        match self.working_text.get_mut(title) {
            Some(slot) => {
                *slot = text;
                true
            }
            None => false,
        }
    }

    /// The entry with the longest working text by character count. Ties go to the
    /// higher-ranked entry.
    pub fn longest_title(&self) -> Option<&str> {
        let mut best: Option<(&str, usize)> = None;
        for title in &self.ordered_titles {
            let len = self
                .working_text
                .get(title)
                .map(|t| t.chars().count())
                .unwrap_or(0);
            if best.map_or(true, |(_, best_len)| len > best_len) {
                best = Some((title.as_str(), len));
            }
        }
        best.map(|(title, _)| title)
    }

    /// Entries in rank order with their current working text.
    pub fn entries(&self) -> Vec<Entry> {
        self.ordered_titles
            .iter()
            .map(|title| Entry {
                title: title.clone(),
                description: self.working_text.get(title).cloned().unwrap_or_default(),
            })
            .collect()
    }
}

impl From<Vec<Entry>> for SelectionState {
    /// Later duplicates of a title are dropped.
    fn from(entries: Vec<Entry>) -> Self {
        let mut state = SelectionState::new();
        for entry in entries {
            state.push(entry.title, entry.description);
        }
        state
    }
}

impl From<SelectionState> for Vec<Entry> {
    fn from(state: SelectionState) -> Self {
        state.entries()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> SelectionState {
        SelectionState::from(vec![
            Entry::new("A", "short"),
            Entry::new("B", "a much longer description"),
            Entry::new("C", "a much longer description"),
        ])
    }

    #[test]
    fn test_push_rejects_duplicates() {
        let mut s = state();
        assert!(!s.push("A", "other"));
        assert_eq!(s.len(), 3);
        assert_eq!(s.text("A"), Some("short"));
    }

    #[test]
    fn test_pop_last_keeps_maps_in_step() {
        let mut s = state();
        let removed = s.pop_last().unwrap();
        assert_eq!(removed.title, "C");
        assert!(!s.contains("C"));
        assert_eq!(s.titles(), &["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_longest_title_tie_goes_to_higher_rank() {
        assert_eq!(state().longest_title(), Some("B"));
    }

    #[test]
    fn test_longest_title_counts_chars_not_bytes() {
        let s = SelectionState::from(vec![
            Entry::new("Bytes", "ééééé"),
            Entry::new("Chars", "abcdefg"),
        ]);
        assert_eq!(s.longest_title(), Some("Chars"));
    }

    #[test]
    fn test_replace_only_selected() {
        let mut s = state();
        assert!(s.replace("A", "new".into()));
        assert!(!s.replace("Z", "new".into()));
        assert_eq!(s.text("A"), Some("new"));
    }

    #[test]
    fn test_serde_round_trip_preserves_order() {
        let s = state();
        let json = serde_json::to_string(&s).unwrap();
        let back: SelectionState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.titles(), s.titles());
        assert_eq!(back, s);
    }
}

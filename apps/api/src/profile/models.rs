use serde::{Deserialize, Serialize};

/// A project from the master résumé. The description is free text, one bullet per line,
/// conventionally ending with a `Technologies used:` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub title: String,
    pub description: String,
}

impl Entry {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Everything extracted from a master résumé. Read-only once built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateProfile {
    pub full_text: String,
    pub contact: String,
    pub summary: String,
    pub skills: String,
    pub education: String,
    pub experience: String,
    /// Entry titles are unique within a profile.
    pub entries: Vec<Entry>,
}

impl CandidateProfile {
    pub fn entry(&self, title: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.title == title)
    }

    pub fn titles(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.title.as_str()).collect()
    }
}

//! Plain-text résumé assembly handed to the document renderer.

use crate::profile::models::{CandidateProfile, Entry};

/// Builds the `CONTACT / SUMMARY / SKILLS / EDUCATION / PROJECTS` document.
/// Sections are separated by a blank line; empty sections keep their header.
pub fn assemble_document(profile: &CandidateProfile, summary: &str, entries: &[Entry]) -> String {
    let mut doc = String::new();
    push_section(&mut doc, "CONTACT", &profile.contact);
    push_section(&mut doc, "SUMMARY", summary);
    push_section(&mut doc, "SKILLS", &profile.skills);
    push_section(&mut doc, "EDUCATION", &profile.education);

    doc.push_str("PROJECTS\n");
    for entry in entries {
        doc.push_str(entry.title.trim());
        doc.push('\n');
        for line in entry.description.lines().filter(|l| !l.trim().is_empty()) {
            doc.push_str(line.trim());
            doc.push('\n');
        }
        doc.push('\n');
    }
    doc.trim_end().to_string()
}

fn push_section(doc: &mut String, header: &str, body: &str) {
    doc.push_str(header);
    doc.push('\n');
    let body = body.trim();
    if !body.is_empty() {
        doc.push_str(body);
        doc.push('\n');
    }
    doc.push('\n');
}

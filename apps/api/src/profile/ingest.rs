//! Master résumé ingestion: plain text (or PDF-extracted text) into a `CandidateProfile`.
//!
//! Line-oriented: a line is a section header when, ignoring case and a trailing colon,
//! it is exactly one of the known headers. Text before the first header is the
//! contact block.

use bytes::Bytes;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::profile::models::{CandidateProfile, Entry};
use crate::tailoring::shortener::is_technologies_line;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Contact,
    Summary,
    Skills,
    Education,
    Experience,
    Projects,
}

fn section_header(line: &str) -> Option<Section> {
    let key = line.trim().trim_end_matches(':').trim().to_lowercase();
    match key.as_str() {
        "summary" | "professional summary" | "profile" => Some(Section::Summary),
        "skills" | "skills and interests" | "technical skills" => Some(Section::Skills),
        "education" => Some(Section::Education),
        "work experience" | "experience" | "professional experience" => Some(Section::Experience),
        "projects" | "personal projects" => Some(Section::Projects),
        _ => None,
    }
}

/// PDF text extraction sometimes renders `●` in UTF-8 read as Latin-1.
const BULLET_MARKERS: &[&str] = &[
    "\u{2022}",
    "\u{25CF}",
    "\u{00E2}\u{2014}\u{008F}",
    "\u{00E2}\u{2014}",
    "-",
    "* ",
];

/// Returns the bullet text if `line` starts with a bullet marker.
fn bullet_text(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    BULLET_MARKERS
        .iter()
        .find_map(|marker| trimmed.strip_prefix(marker))
        .map(str::trim)
}

fn block(lines: &[&str]) -> String {
    lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn ends_sentence(text: &str) -> bool {
    text.trim_end().ends_with(['.', '!', '?', ':'])
}

fn starts_lowercase(text: &str) -> bool {
    text.trim_start().chars().next().is_some_and(char::is_lowercase)
}

/// Groups the projects section into entries.
fn parse_projects(lines: &[&str]) -> Vec<Entry> {
    let mut entries: Vec<(String, Vec<String>)> = Vec::new();

    for raw in lines {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let Some((_, description)) = entries.last_mut() else {
            if bullet_text(line).is_none() {
                entries.push((line.to_string(), Vec::new()));
            }
            continue;
        };

        if let Some(text) = bullet_text(line) {
            if !text.is_empty() {
                description.push(text.to_string());
            }
        } else if is_technologies_line(line) {
            description.push(line.to_string());
        } else if description
            .last()
            .is_some_and(|prev| !is_technologies_line(prev) && (!ends_sentence(prev) || starts_lowercase(line)))
        {
            // Wrapped continuation of the previous bullet.
            if let Some(prev) = description.last_mut() {
                prev.push(' ');
                prev.push_str(line);
            }
        } else {
            entries.push((line.to_string(), Vec::new()));
        }
    }

    let mut result: Vec<Entry> = Vec::new();
    for (title, description) in entries {
        if description.is_empty() {
            warn!(title = %title, "Project has no description; dropping");
            continue;
        }
        let mut unique = title.clone();
        let mut n = 2;
        while result.iter().any(|e| e.title == unique) {
            unique = format!("{title} ({n})");
            n += 1;
        }
        // The technologies line closes the entry even when bullets followed it.
        let (technologies, mut lines): (Vec<String>, Vec<String>) = description
            .into_iter()
            .partition(|line| is_technologies_line(line));
        lines.extend(technologies);
        result.push(Entry::new(unique, lines.join("\n")));
    }
    result
}

/// Parses master résumé text into a profile.
pub fn parse_master_resume(text: &str) -> CandidateProfile {
    let mut section = Section::Contact;
    let mut contact = Vec::new();
    let mut summary = Vec::new();
    let mut skills = Vec::new();
    let mut education = Vec::new();
    let mut experience = Vec::new();
    let mut projects = Vec::new();

    for line in text.lines() {
        if let Some(next) = section_header(line) {
            section = next;
            continue;
        }
        let bucket = match section {
            Section::Contact => &mut contact,
            Section::Summary => &mut summary,
            Section::Skills => &mut skills,
            Section::Education => &mut education,
            Section::Experience => &mut experience,
            Section::Projects => &mut projects,
        };
        bucket.push(line);
    }

    let entries = parse_projects(&projects);
    info!(entries = entries.len(), "Master resume parsed");

    CandidateProfile {
        full_text: text.trim().to_string(),
        contact: block(&contact),
        summary: block(&summary),
        skills: block(&skills),
        education: block(&education),
        experience: block(&experience),
        entries,
    }
}

/// Extracts text from a PDF on the blocking pool.
pub async fn extract_pdf_text(bytes: Bytes) -> Result<String, AppError> {
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in pdf extraction: {e}")))?
        .map_err(|e| AppError::UnprocessableEntity(format!("could not read PDF: {e}")))?;
    if text.trim().is_empty() {
        return Err(AppError::UnprocessableEntity(
            "PDF contains no extractable text".to_string(),
        ));
    }
    Ok(text)
}

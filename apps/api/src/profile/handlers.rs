//! Axum route handlers for master résumé ingestion.

use axum::{extract::Multipart, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::profile::ingest::{extract_pdf_text, parse_master_resume};
use crate::profile::models::CandidateProfile;

#[derive(Debug, Deserialize)]
pub struct ParseProfileRequest {
    pub raw_text: String,
}

#[derive(Debug, Serialize)]
pub struct ParseProfileResponse {
    pub profile: CandidateProfile,
    pub entry_count: usize,
}

fn parsed(text: &str) -> Result<Json<ParseProfileResponse>, AppError> {
    let profile = parse_master_resume(text);
    if profile.entries.is_empty() {
        return Err(AppError::UnprocessableEntity(
            "no projects found; expected a 'Projects' section with bulleted descriptions"
                .to_string(),
        ));
    }
    Ok(Json(ParseProfileResponse {
        entry_count: profile.entries.len(),
        profile,
    }))
}

/// POST /api/v1/profile/parse
pub async fn handle_parse_profile(
    Json(request): Json<ParseProfileRequest>,
) -> Result<Json<ParseProfileResponse>, AppError> {
    if request.raw_text.trim().is_empty() {
        return Err(AppError::Validation("raw_text cannot be empty".to_string()));
    }
    parsed(&request.raw_text)
}

/// POST /api/v1/profile/parse-pdf
///
/// Multipart upload; the PDF is read from the `file` field.
pub async fn handle_parse_profile_pdf(
    mut multipart: Multipart,
) -> Result<Json<ParseProfileResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("could not read upload: {e}")))?;
        if bytes.is_empty() {
            return Err(AppError::Validation("uploaded file is empty".to_string()));
        }
        let text = extract_pdf_text(bytes).await?;
        return parsed(&text);
    }
    Err(AppError::Validation(
        "multipart body must contain a 'file' field".to_string(),
    ))
}

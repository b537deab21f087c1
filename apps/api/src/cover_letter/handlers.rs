//! Axum route handlers for cover letters. Letters live on the tailoring session.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::cover_letter::{draft_cover_letter, regenerate_cover_letter, CoverLetter, LetterContext};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegenerateRequest {
    pub feedback: String,
}

#[derive(Debug, Serialize)]
pub struct CoverLetterResponse {
    pub session_id: Uuid,
    pub cover_letter: CoverLetter,
    pub text: String,
    pub feedback: Vec<String>,
}

impl CoverLetterResponse {
    fn new(session_id: Uuid, cover_letter: CoverLetter, feedback: Vec<String>) -> Self {
        Self {
            session_id,
            text: cover_letter.text(),
            cover_letter,
            feedback,
        }
    }
}

/// POST /api/v1/resumes/:id/cover-letter
///
/// Drafts a letter from the session's latest tailored projects, replacing any
/// previous letter and clearing accumulated feedback.
pub async fn handle_draft_cover_letter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CoverLetterResponse>, AppError> {
    let session = state.sessions.get(id).await?;
    let ctx = LetterContext {
        target: &session.target_description,
        resume_text: &session.profile.full_text,
        projects: &session.latest.entries,
    };

    let letter = draft_cover_letter(state.letter_writer.as_ref(), &ctx).await?;
    let stored = letter.clone();
    state
        .sessions
        .update(id, session.revision, |s| {
            s.cover_letter = Some(stored);
            s.feedback.clear();
        })
        .await?;

    info!(session_id = %id, lines = letter.estimated_lines, "Cover letter drafted");
    Ok(Json(CoverLetterResponse::new(id, letter, Vec::new())))
}

/// POST /api/v1/resumes/:id/cover-letter/regenerate
///
/// Appends the feedback to the session and regenerates from all feedback so far.
pub async fn handle_regenerate_cover_letter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RegenerateRequest>,
) -> Result<Json<CoverLetterResponse>, AppError> {
    let feedback = request.feedback.trim();
    if feedback.is_empty() {
        return Err(AppError::Validation("feedback cannot be empty".to_string()));
    }

    let session = state.sessions.get(id).await?;
    let current = session.cover_letter.as_ref().ok_or_else(|| {
        AppError::UnprocessableEntity("no cover letter drafted for this session yet".to_string())
    })?;
    let mut all_feedback = session.feedback.clone();
    all_feedback.push(feedback.to_string());

    let ctx = LetterContext {
        target: &session.target_description,
        resume_text: &session.profile.full_text,
        projects: &session.latest.entries,
    };
    let letter =
        regenerate_cover_letter(state.letter_writer.as_ref(), &ctx, current, &all_feedback).await?;

    let stored = letter.clone();
    let stored_feedback = all_feedback.clone();
    state
        .sessions
        .update(id, session.revision, |s| {
            s.cover_letter = Some(stored);
            s.feedback = stored_feedback;
        })
        .await?;

    info!(
        session_id = %id,
        rounds = all_feedback.len(),
        lines = letter.estimated_lines,
        "Cover letter regenerated"
    );
    Ok(Json(CoverLetterResponse::new(id, letter, all_feedback)))
}

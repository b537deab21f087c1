//! Axum route handlers for the tailoring API.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::cover_letter::CoverLetter;
use crate::errors::AppError;
use crate::profile::ingest::parse_master_resume;
use crate::profile::models::CandidateProfile;
use crate::state::AppState;
use crate::tailoring::pipeline::{reselect, tailor_resume, TailoredResume};
use crate::tailoring::session::TailoringSession;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Either a parsed `profile` or the raw `master_resume_text` must be supplied.
#[derive(Debug, Deserialize)]
pub struct TailorRequest {
    pub profile: Option<CandidateProfile>,
    pub master_resume_text: Option<String>,
    pub target_description: String,
}

#[derive(Debug, Serialize)]
pub struct TailorResponse {
    pub session_id: Uuid,
    pub resume: TailoredResume,
}

#[derive(Debug, Deserialize)]
pub struct ReselectRequest {
    /// Ordered project titles, highest priority first.
    pub titles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub target_description: String,
    pub available_titles: Vec<String>,
    pub selected_titles: Vec<String>,
    pub resume: TailoredResume,
    pub cover_letter: Option<CoverLetter>,
    pub feedback: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TailoringSession> for SessionResponse {
    fn from(session: TailoringSession) -> Self {
        Self {
            session_id: session.id,
            target_description: session.target_description,
            available_titles: session
                .profile
                .titles()
                .into_iter()
                .map(str::to_string)
                .collect(),
            selected_titles: session.selection.titles().to_vec(),
            resume: session.latest,
            cover_letter: session.cover_letter,
            feedback: session.feedback,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes/tailor
///
/// Runs the full pipeline and opens a session for follow-up requests.
pub async fn handle_tailor(
    State(state): State<AppState>,
    Json(request): Json<TailorRequest>,
) -> Result<Json<TailorResponse>, AppError> {
    let profile = match (request.profile, request.master_resume_text) {
        (Some(profile), _) => profile,
        (None, Some(text)) if !text.trim().is_empty() => parse_master_resume(&text),
        _ => {
            return Err(AppError::Validation(
                "either profile or master_resume_text is required".to_string(),
            ))
        }
    };

    let (summary, run) =
        tailor_resume(&state.services, &profile, &request.target_description).await?;
    let resume = run.resume.clone();

    let session = TailoringSession::new(
        profile,
        request.target_description,
        summary,
        run.selection,
        run.resume,
    );
    let session_id = state.sessions.insert(session).await;

    info!(
        session_id = %session_id,
        estimated_lines = resume.estimated_lines,
        within_budget = resume.within_budget,
        "Tailoring session created"
    );

    Ok(Json(TailorResponse { session_id, resume }))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = state.sessions.get(id).await?;
    Ok(Json(session.into()))
}

/// PUT /api/v1/resumes/:id/selection
///
/// Replaces the selection with the user's ordered titles and re-runs the length
/// controller. Titles already selected keep their working (possibly shortened) text.
pub async fn handle_reselect(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReselectRequest>,
) -> Result<Json<TailorResponse>, AppError> {
    let session = state.sessions.get(id).await?;

    let run = reselect(
        &state.services,
        &session.profile,
        &session.summary,
        &session.selection,
        &request.titles,
        &session.target_description,
    )
    .await?;
    let resume = run.resume.clone();

    state
        .sessions
        .update(id, session.revision, |s| {
            s.selection = run.selection;
            s.latest = run.resume;
        })
        .await?;

    info!(
        session_id = %id,
        entries = resume.entries.len(),
        estimated_lines = resume.estimated_lines,
        "Selection updated"
    );

    Ok(Json(TailorResponse {
        session_id: id,
        resume,
    }))
}

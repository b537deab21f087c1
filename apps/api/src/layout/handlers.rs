//! Axum route handler for standalone length estimates.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::layout::budget::LengthVerdict;
use crate::layout::estimator::estimate_in_background;
use crate::profile::models::Entry;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    pub estimated_lines: u32,
    pub max_lines: u32,
    pub verdict: LengthVerdict,
}

/// POST /api/v1/layout/estimate
pub async fn handle_estimate(
    State(state): State<AppState>,
    Json(request): Json<EstimateRequest>,
) -> Result<Json<EstimateResponse>, AppError> {
    let result = estimate_in_background(
        state.services.estimator.clone(),
        request.summary,
        request.entries,
    )
    .await?;
    let budget = state.services.controller.budget();

    Ok(Json(EstimateResponse {
        estimated_lines: result.estimated_lines,
        max_lines: budget.max_lines,
        verdict: budget.classify(result.estimated_lines),
    }))
}

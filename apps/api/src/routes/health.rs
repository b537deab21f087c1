use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status plus the shared generation budget and open session count.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let limiter = state.llm.limiter();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "tailor-api",
        "llm": {
            "model": crate::llm_client::MODEL,
            "requests_in_window": limiter.admissions_in_window(),
            "max_requests": limiter.max_requests(),
            "window_secs": limiter.window().as_secs(),
        },
        "max_lines": state.config.max_lines,
        "sessions": state.sessions.len().await,
    }))
}

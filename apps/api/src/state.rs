use std::sync::Arc;

use crate::config::Config;
use crate::cover_letter::CoverLetterWriter;
use crate::llm_client::LlmClient;
use crate::tailoring::pipeline::TailoringServices;
use crate::tailoring::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub llm: LlmClient,
    pub config: Config,
    /// Ranker, summary, shortener, emphasis and estimator, all behind traits.
    /// The ranker backend is chosen by RANKER_BACKEND at startup.
    pub services: TailoringServices,
    pub letter_writer: Arc<dyn CoverLetterWriter>,
    pub sessions: Arc<SessionStore>,
}

mod config;
mod cover_letter;
mod errors;
mod layout;
mod llm_client;
mod markup;
mod profile;
mod routes;
mod state;
mod tailoring;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, RankerBackend};
use crate::cover_letter::LlmCoverLetterWriter;
use crate::layout::{default_page_geometry, LengthBudget, LengthEstimator, LineEstimator};
use crate::llm_client::{LlmClient, RateLimiter};
use crate::routes::build_router;
use crate::state::AppState;
use crate::tailoring::controller::{AdjustmentLimits, LengthController};
use crate::tailoring::emphasis::LlmEmphasizer;
use crate::tailoring::pipeline::TailoringServices;
use crate::tailoring::selector::{KeywordRanker, LlmRanker, RelevanceRanker};
use crate::tailoring::session::SessionStore;
use crate::tailoring::shortener::LlmShortener;
use crate::tailoring::summary::LlmSummaryWriter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing or invalid env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // One limiter for every generation call in the process
    let limiter = Arc::new(RateLimiter::new(
        config.llm_max_requests,
        Duration::from_secs(config.llm_window_secs),
    ));
    let llm = LlmClient::new(config.anthropic_api_key.clone(), limiter)?;
    info!(
        model = llm_client::MODEL,
        max_requests = config.llm_max_requests,
        window_secs = config.llm_window_secs,
        "LLM client initialized"
    );

    // Ranker backend is swappable via RANKER_BACKEND
    let ranker: Arc<dyn RelevanceRanker> = match config.ranker_backend {
        RankerBackend::Llm => Arc::new(LlmRanker(llm.clone())),
        RankerBackend::Keyword => Arc::new(KeywordRanker),
    };

    let geometry = default_page_geometry(config.page_font);
    info!(
        "Layout geometry: {:?} {}pt, {}pt measure",
        geometry.font,
        geometry.font_size_pt,
        geometry.content_width_pt()
    );
    let estimator: Arc<dyn LengthEstimator> = Arc::new(LineEstimator::with_metrics(geometry));

    let budget = LengthBudget {
        max_lines: config.max_lines,
        tolerance_band: config.length_tolerance_band,
        overflow_band: config.length_overflow_band,
    };
    let limits = AdjustmentLimits {
        floor: config.entry_floor,
        target: config.entry_target,
        ceiling: config.entry_ceiling,
        max_iterations: config.max_shorten_iterations,
    };
    let controller = LengthController::new(
        estimator.clone(),
        Arc::new(LlmShortener(llm.clone())),
        budget,
        limits,
    );

    let services = TailoringServices {
        ranker,
        summarizer: Arc::new(LlmSummaryWriter(llm.clone())),
        emphasizer: Arc::new(LlmEmphasizer(llm.clone())),
        estimator,
        controller,
    };

    // Build app state
    let state = AppState {
        llm: llm.clone(),
        config: config.clone(),
        services,
        letter_writer: Arc::new(LlmCoverLetterWriter(llm)),
        sessions: Arc::new(SessionStore::new(
            config.max_sessions,
            Duration::from_secs(config.session_ttl_secs),
        )),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client's host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

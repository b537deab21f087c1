pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::cover_letter::handlers as cover_letter;
use crate::layout::handlers as layout;
use crate::profile::handlers as profile;
use crate::state::AppState;
use crate::tailoring::handlers as tailoring;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Profile API
        .route("/api/v1/profile/parse", post(profile::handle_parse_profile))
        .route(
            "/api/v1/profile/parse-pdf",
            post(profile::handle_parse_profile_pdf),
        )
        // Layout API
        .route("/api/v1/layout/estimate", post(layout::handle_estimate))
        // Tailoring API
        .route("/api/v1/resumes/tailor", post(tailoring::handle_tailor))
        .route("/api/v1/resumes/:id", get(tailoring::handle_get_session))
        .route(
            "/api/v1/resumes/:id/selection",
            put(tailoring::handle_reselect),
        )
        // Cover letter API
        .route(
            "/api/v1/resumes/:id/cover-letter",
            post(cover_letter::handle_draft_cover_letter),
        )
        .route(
            "/api/v1/resumes/:id/cover-letter/regenerate",
            post(cover_letter::handle_regenerate_cover_letter),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::cover_letter::{CoverLetterWriter, LetterContext};
    use crate::layout::budget::LengthBudget;
    use crate::layout::estimator::LengthEstimator;
    use crate::llm_client::{LlmClient, LlmError, RateLimiter};
    use crate::profile::models::{CandidateProfile, Entry};
    use crate::tailoring::controller::{AdjustmentLimits, LengthController};
    use crate::tailoring::emphasis::Emphasizer;
    use crate::tailoring::pipeline::TailoringServices;
    use crate::tailoring::selector::KeywordRanker;
    use crate::tailoring::session::SessionStore;
    use crate::tailoring::shortener::{RewriteError, Shortener};
    use crate::tailoring::summary::SummaryWriter;

    struct LineCount;

    impl LengthEstimator for LineCount {
        fn estimate_lines(&self, summary: &str, entries: &[Entry]) -> u32 {
            let count = |t: &str| t.lines().filter(|l| !l.trim().is_empty()).count() as u32;
            count(summary) + entries.iter().map(|e| count(&e.description)).sum::<u32>()
        }
    }

    struct Offline;

    #[async_trait]
    impl Shortener for Offline {
        async fn shorten(&self, _: &str, _: &str, _: i64) -> Result<String, RewriteError> {
            Err(RewriteError::Capability("offline".into()))
        }
    }

    #[async_trait]
    impl SummaryWriter for Offline {
        async fn write_summary(&self, _: &CandidateProfile, _: &str) -> Result<String, RewriteError> {
            Err(RewriteError::Capability("offline".into()))
        }
    }

    #[async_trait]
    impl Emphasizer for Offline {
        async fn emphasize_entry(&self, _: &str, _: &str, _: &[String]) -> Result<String, RewriteError> {
            Err(RewriteError::Capability("offline".into()))
        }
    }

    #[async_trait]
    impl CoverLetterWriter for Offline {
        async fn write_sections(
            &self,
            _: &LetterContext<'_>,
            _: Option<&str>,
        ) -> Result<(String, String), LlmError> {
            Err(LlmError::EmptyContent)
        }

        async fn write_body(
            &self,
            _: &LetterContext<'_>,
            _: &str,
            _: &str,
            _: Option<&str>,
            _: Option<&str>,
        ) -> Result<String, LlmError> {
            Err(LlmError::EmptyContent)
        }
    }

    fn test_state() -> AppState {
        let config =
            Config::from_lookup(|key| (key == "ANTHROPIC_API_KEY").then(|| "test".to_string()))
                .unwrap();
        let limiter = Arc::new(RateLimiter::new(14, Duration::from_secs(60)));
        let llm = LlmClient::new(config.anthropic_api_key.clone(), limiter).unwrap();
        let estimator: Arc<dyn LengthEstimator> = Arc::new(LineCount);
        let services = TailoringServices {
            ranker: Arc::new(KeywordRanker),
            summarizer: Arc::new(Offline),
            emphasizer: Arc::new(Offline),
            estimator: estimator.clone(),
            controller: LengthController::new(
                estimator,
                Arc::new(Offline),
                LengthBudget::default(),
                AdjustmentLimits::default(),
            ),
        };
        AppState {
            llm,
            config,
            services,
            letter_writer: Arc::new(Offline),
            sessions: Arc::new(SessionStore::new(100, Duration::from_secs(3600))),
        }
    }

    async fn send(app: Router, method: &str, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    const MASTER: &str = "\
Jane Doe
Summary
Backend engineer.
Projects
Rust Gateway
• Built a rust gateway.
• Load tested the rust gateway.
Technologies used: Rust
Kafka Pipeline
• Built a kafka pipeline.
Technologies used: Kafka
Billing
• Rewrote billing.
Mobile App
• Shipped a mobile app.
";

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(build_router(test_state()), "GET", "/health", serde_json::Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "tailor-api");
        assert_eq!(body["sessions"], 0);
    }

    #[tokio::test]
    async fn test_tailor_then_reselect_then_fetch() {
        let app = build_router(test_state());
        let (status, body) = send(
            app.clone(),
            "POST",
            "/api/v1/resumes/tailor",
            serde_json::json!({
                "master_resume_text": MASTER,
                "target_description": "rust kafka engineer",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["resume"]["entries"][0]["title"], "Rust Gateway");
        let id = body["session_id"].as_str().unwrap().to_string();

        let (status, body) = send(
            app.clone(),
            "PUT",
            &format!("/api/v1/resumes/{id}/selection"),
            serde_json::json!({ "titles": ["Billing", "Mobile App", "Rust Gateway"] }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["resume"]["entries"][0]["title"], "Billing");

        let (status, body) = send(app, "GET", &format!("/api/v1/resumes/{id}"), serde_json::Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["selected_titles"],
            serde_json::json!(["Billing", "Mobile App", "Rust Gateway"])
        );
        assert_eq!(body["available_titles"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_tailor_requires_a_profile() {
        let (status, body) = send(
            build_router(test_state()),
            "POST",
            "/api/v1/resumes/tailor",
            serde_json::json!({ "target_description": "anything" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let uri = format!("/api/v1/resumes/{}", uuid::Uuid::new_v4());
        let (status, _) = send(build_router(test_state()), "GET", &uri, serde_json::Value::Null).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_regenerate_before_draft_is_422() {
        let app = build_router(test_state());
        let (_, body) = send(
            app.clone(),
            "POST",
            "/api/v1/resumes/tailor",
            serde_json::json!({ "master_resume_text": MASTER, "target_description": "rust" }),
        )
        .await;
        let id = body["session_id"].as_str().unwrap().to_string();

        let (status, _) = send(
            app,
            "POST",
            &format!("/api/v1/resumes/{id}/cover-letter/regenerate"),
            serde_json::json!({ "feedback": "more concise" }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_estimate_classifies_against_budget() {
        let (status, body) = send(
            build_router(test_state()),
            "POST",
            "/api/v1/layout/estimate",
            serde_json::json!({
                "summary": "One line.",
                "entries": [{ "title": "A", "description": "x\ny" }],
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["estimated_lines"], 3);
        assert_eq!(body["max_lines"], 24);
        assert_eq!(body["verdict"], "too_short");
    }
}

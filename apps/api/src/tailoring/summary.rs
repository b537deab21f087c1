//! Tailored professional summary, generated before length adjustment.

use async_trait::async_trait;
use tracing::warn;

use crate::llm_client::prompts::json_system;
use crate::llm_client::{GenerationKind, GenerationRequest, GenerationResponse, LlmClient};
use crate::markup::is_balanced;
use crate::profile::models::CandidateProfile;
use crate::tailoring::prompts::{SUMMARY_PROMPT_TEMPLATE, SUMMARY_SYSTEM_ROLE};
use crate::tailoring::shortener::{normalize_sentences, RewriteError};

#[async_trait]
pub trait SummaryWriter: Send + Sync {
    async fn write_summary(
        &self,
        profile: &CandidateProfile,
        target_context: &str,
    ) -> Result<String, RewriteError>;
}

pub struct LlmSummaryWriter(pub LlmClient);

#[async_trait]
impl SummaryWriter for LlmSummaryWriter {
    async fn write_summary(
        &self,
        profile: &CandidateProfile,
        target_context: &str,
    ) -> Result<String, RewriteError> {
        let prompt = SUMMARY_PROMPT_TEMPLATE
            .replace("{target}", target_context)
            .replace("{resume}", &profile.full_text);
        let system = json_system(SUMMARY_SYSTEM_ROLE);

        let response = self
            .0
            .generate(GenerationRequest {
                kind: GenerationKind::RewrittenText,
                system: &system,
                prompt: &prompt,
                temperature: None,
            })
            .await
            .map_err(|e| RewriteError::Capability(e.to_string()))?;

        match response {
            GenerationResponse::RewrittenText(text) => Ok(text),
            other => Err(RewriteError::Capability(format!(
                "unexpected {:?} response",
                other.kind()
            ))),
        }
    }
}

/// Writes the tailored summary, falling back to the profile's own summary block when
/// the capability fails or returns unusable text. Either way the result is one
/// sentence per line.
pub async fn tailored_summary(
    writer: &dyn SummaryWriter,
    profile: &CandidateProfile,
    target_context: &str,
) -> String {
    match writer.write_summary(profile, target_context).await {
        Ok(text) if !text.trim().is_empty() && is_balanced(&text) => normalize_sentences(&text),
        Ok(_) => {
            warn!("Summary generation returned unusable text; using profile summary");
            normalize_sentences(&profile.summary)
        }
        Err(e) => {
            warn!(error = %e, "Summary generation failed; using profile summary");
            normalize_sentences(&profile.summary)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<&'static str, ()>);

    #[async_trait]
    impl SummaryWriter for Fixed {
        async fn write_summary(
            &self,
            _: &CandidateProfile,
            _: &str,
        ) -> Result<String, RewriteError> {
            self.0
                .map(str::to_string)
                .map_err(|_| RewriteError::Capability("down".into()))
        }
    }

    fn profile() -> CandidateProfile {
        CandidateProfile {
            summary: "  Original summary.  ".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_uses_generated_summary() {
        let text = tailored_summary(&Fixed(Ok("A **third-year** student.")), &profile(), "job").await;
        assert_eq!(text, "A **third-year** student.");
    }

    #[tokio::test]
    async fn test_generated_summary_is_one_sentence_per_line() {
        let writer = Fixed(Ok("Builds **Rust** services. Ships weekly\n\n- Mentors interns"));
        let text = tailored_summary(&writer, &profile(), "job").await;
        assert_eq!(text, "Builds **Rust** services.\nShips weekly.\nMentors interns.");
    }

    #[tokio::test]
    async fn test_falls_back_on_failure() {
        let text = tailored_summary(&Fixed(Err(())), &profile(), "job").await;
        assert_eq!(text, "Original summary.");
    }

    #[tokio::test]
    async fn test_falls_back_on_unbalanced_markup() {
        let text = tailored_summary(&Fixed(Ok("A **third-year student.")), &profile(), "job").await;
        assert_eq!(text, "Original summary.");
    }
}

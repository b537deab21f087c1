//! LLM Client: the single point of entry for every generation call in the tailoring service.
//!
//! ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
//! Every call is admitted by the shared `RateLimiter` first, and every structured
//! response is validated against the schema of its call site (`GenerationKind`).
//!
//! No retry loop lives here: transport failures, timeouts and throttling surface as
//! `LlmError` and the caller's local fallback decides what happens next.

use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod prompts;
pub mod rate_limiter;

pub use rate_limiter::RateLimiter;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all generation calls. Hardcoded to prevent drift between call sites.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 4096;
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Response did not match the {expected:?} schema: {detail}")]
    Schema {
        expected: GenerationKind,
        detail: String,
    },

    #[error("LLM returned empty content")]
    EmptyContent,
}

// ────────────────────────────────────────────────────────────────────────────
// Tagged generation responses
// ────────────────────────────────────────────────────────────────────────────

/// The call sites of the generation capability. Each one has exactly one response shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationKind {
    RankedTitles,
    RewrittenText,
    EmphasizedText,
    CoverLetterSections,
}

/// A validated generation response. Callers match on the variant they asked for;
/// anything else is a schema error, never an attribute lookup on untyped JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResponse {
    RankedTitles(Vec<String>),
    RewrittenText(String),
    EmphasizedText(String),
    CoverLetterSections {
        introduction: String,
        conclusion: String,
    },
}

impl GenerationResponse {
    pub fn kind(&self) -> GenerationKind {
        match self {
            GenerationResponse::RankedTitles(_) => GenerationKind::RankedTitles,
            GenerationResponse::RewrittenText(_) => GenerationKind::RewrittenText,
            GenerationResponse::EmphasizedText(_) => GenerationKind::EmphasizedText,
            GenerationResponse::CoverLetterSections { .. } => GenerationKind::CoverLetterSections,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RankedTitlesSchema {
    project_titles: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RewrittenTextSchema {
    rewritten_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EmphasizedTextSchema {
    emphasized_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CoverLetterSectionsSchema {
    introduction: String,
    conclusion: String,
}

/// A structured generation request for one call site.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub kind: GenerationKind,
    pub system: &'a str,
    pub prompt: &'a str,
    pub temperature: Option<f32>,
}

/// Validates raw model text against the schema for `kind`.
pub fn parse_generation(kind: GenerationKind, text: &str) -> Result<GenerationResponse, LlmError> {
    let text = strip_json_fences(text);
    if text.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    let schema_err = |e: serde_json::Error| LlmError::Schema {
        expected: kind,
        detail: e.to_string(),
    };

    let response = match kind {
        GenerationKind::RankedTitles => {
            let parsed: RankedTitlesSchema = serde_json::from_str(text).map_err(schema_err)?;
            GenerationResponse::RankedTitles(parsed.project_titles)
        }
        GenerationKind::RewrittenText => {
            let parsed: RewrittenTextSchema = serde_json::from_str(text).map_err(schema_err)?;
            GenerationResponse::RewrittenText(parsed.rewritten_text)
        }
        GenerationKind::EmphasizedText => {
            let parsed: EmphasizedTextSchema = serde_json::from_str(text).map_err(schema_err)?;
            GenerationResponse::EmphasizedText(parsed.emphasized_text)
        }
        GenerationKind::CoverLetterSections => {
            let parsed: CoverLetterSectionsSchema =
                serde_json::from_str(text).map_err(schema_err)?;
            GenerationResponse::CoverLetterSections {
                introduction: parsed.introduction,
                conclusion: parsed.conclusion,
            }
        }
    };
    Ok(response)
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// The single LLM client used by every capability. Cloning shares the HTTP pool
/// and, crucially, the rate limiter.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    limiter: Arc<RateLimiter>,
}

impl LlmClient {
    pub fn new(api_key: String, limiter: Arc<RateLimiter>) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_key,
            limiter,
        })
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Makes one raw call to the API, after the rate limiter admits it.
    pub async fn call(
        &self,
        prompt: &str,
        system: &str,
        temperature: Option<f32>,
    ) -> Result<LlmResponse, LlmError> {
        self.limiter.acquire().await;

        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let llm_response: LlmResponse = response.json().await?;
        debug!(
            input_tokens = llm_response.usage.input_tokens,
            output_tokens = llm_response.usage.output_tokens,
            "LLM call succeeded"
        );
        Ok(llm_response)
    }

    /// Runs one structured generation and validates it against the call site's schema.
    pub async fn generate(
        &self,
        request: GenerationRequest<'_>,
    ) -> Result<GenerationResponse, LlmError> {
        let response = self
            .call(request.prompt, request.system, request.temperature)
            .await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        parse_generation(request.kind, text)
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_parse_ranked_titles() {
        let text = r#"{"project_titles": ["Alpha", "Beta"]}"#;
        let response = parse_generation(GenerationKind::RankedTitles, text).unwrap();
        assert_eq!(
            response,
            GenerationResponse::RankedTitles(vec!["Alpha".to_string(), "Beta".to_string()])
        );
        assert_eq!(response.kind(), GenerationKind::RankedTitles);
    }

    #[test]
    fn test_parse_rewritten_text_inside_fences() {
        let text = "```json\n{\"rewritten_text\": \"Built it.\"}\n```";
        let response = parse_generation(GenerationKind::RewrittenText, text).unwrap();
        assert_eq!(response, GenerationResponse::RewrittenText("Built it.".to_string()));
    }

    #[test]
    fn test_parse_rejects_wrong_shape() {
        // An emphasis payload is not a valid rewrite response.
        let text = r#"{"emphasized_text": "x"}"#;
        let err = parse_generation(GenerationKind::RewrittenText, text).unwrap_err();
        assert!(matches!(
            err,
            LlmError::Schema {
                expected: GenerationKind::RewrittenText,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_rejects_missing_field() {
        let err = parse_generation(GenerationKind::CoverLetterSections, r#"{"introduction": "Hi"}"#)
            .unwrap_err();
        assert!(matches!(err, LlmError::Schema { .. }));
    }

    #[test]
    fn test_parse_empty_text_is_empty_content() {
        let err = parse_generation(GenerationKind::EmphasizedText, "   ").unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
    }

    #[test]
    fn test_parse_cover_letter_sections() {
        let text = r#"{"introduction": "Hello.", "conclusion": "Thanks."}"#;
        match parse_generation(GenerationKind::CoverLetterSections, text).unwrap() {
            GenerationResponse::CoverLetterSections {
                introduction,
                conclusion,
            } => {
                assert_eq!(introduction, "Hello.");
                assert_eq!(conclusion, "Thanks.");
            }
            other => panic!("unexpected variant {other:?}"),
        }
    }
}

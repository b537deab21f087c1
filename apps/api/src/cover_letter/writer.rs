use async_trait::async_trait;
use tracing::{info, warn};

use crate::cover_letter::prompts::{
    BODY_PROMPT_TEMPLATE, LENGTH_EXPAND, LENGTH_SHORTEN, LETTER_SYSTEM_ROLE, REVISION_TEMPLATE,
    SECTIONS_PROMPT_TEMPLATE,
};
use crate::cover_letter::{CoverLetter, LETTER_MAX_LINES, LETTER_MIN_LINES};
use crate::errors::AppError;
use crate::llm_client::prompts::json_system;
use crate::llm_client::{GenerationKind, GenerationRequest, GenerationResponse, LlmClient, LlmError};
use crate::profile::models::Entry;

/// What every letter call is grounded on.
pub struct LetterContext<'a> {
    pub target: &'a str,
    pub resume_text: &'a str,
    pub projects: &'a [Entry],
}

#[async_trait]
pub trait CoverLetterWriter: Send + Sync {
    /// Returns `(introduction, conclusion)`.
    async fn write_sections(
        &self,
        ctx: &LetterContext<'_>,
        revision: Option<&str>,
    ) -> Result<(String, String), LlmError>;

    async fn write_body(
        &self,
        ctx: &LetterContext<'_>,
        introduction: &str,
        conclusion: &str,
        length_hint: Option<&str>,
        revision: Option<&str>,
    ) -> Result<String, LlmError>;
}

pub struct LlmCoverLetterWriter(pub LlmClient);

#[async_trait]
impl CoverLetterWriter for LlmCoverLetterWriter {
    async fn write_sections(
        &self,
        ctx: &LetterContext<'_>,
        revision: Option<&str>,
    ) -> Result<(String, String), LlmError> {
        let prompt = SECTIONS_PROMPT_TEMPLATE
            .replace("{revision}", revision.unwrap_or(""))
            .replace("{target}", ctx.target)
            .replace("{resume}", ctx.resume_text);
        let system = json_system(LETTER_SYSTEM_ROLE);

        match self
            .0
            .generate(GenerationRequest {
                kind: GenerationKind::CoverLetterSections,
                system: &system,
                prompt: &prompt,
                temperature: None,
            })
            .await?
        {
            GenerationResponse::CoverLetterSections {
                introduction,
                conclusion,
            } => Ok((introduction, conclusion)),
            other => Err(LlmError::Schema {
                expected: GenerationKind::CoverLetterSections,
                detail: format!("got {:?}", other.kind()),
            }),
        }
    }

    async fn write_body(
        &self,
        ctx: &LetterContext<'_>,
        introduction: &str,
        conclusion: &str,
        length_hint: Option<&str>,
        revision: Option<&str>,
    ) -> Result<String, LlmError> {
        let projects = ctx
            .projects
            .iter()
            .map(|e| format!("{}: {}", e.title, e.description))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = BODY_PROMPT_TEMPLATE
            .replace("{length}", length_hint.unwrap_or(""))
            .replace("{revision}", revision.unwrap_or(""))
            .replace("{introduction}", introduction)
            .replace("{conclusion}", conclusion)
            .replace("{target}", ctx.target)
            .replace("{resume}", ctx.resume_text)
            .replace("{projects}", &projects);
        let system = json_system(LETTER_SYSTEM_ROLE);

        match self
            .0
            .generate(GenerationRequest {
                kind: GenerationKind::RewrittenText,
                system: &system,
                prompt: &prompt,
                temperature: None,
            })
            .await?
        {
            GenerationResponse::RewrittenText(body) => Ok(body),
            other => Err(LlmError::Schema {
                expected: GenerationKind::RewrittenText,
                detail: format!("got {:?}", other.kind()),
            }),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Draft / regenerate
// ────────────────────────────────────────────────────────────────────────────

fn non_empty(text: String) -> Result<String, LlmError> {
    if text.trim().is_empty() {
        Err(LlmError::EmptyContent)
    } else {
        Ok(text)
    }
}

fn length_hint(lines: u32) -> Option<String> {
    if lines > LETTER_MAX_LINES {
        Some(
            LENGTH_SHORTEN
                .replace("{lines}", &lines.to_string())
                .replace("{max}", &LETTER_MAX_LINES.to_string()),
        )
    } else if lines < LETTER_MIN_LINES {
        Some(
            LENGTH_EXPAND
                .replace("{lines}", &lines.to_string())
                .replace("{min}", &LETTER_MIN_LINES.to_string()),
        )
    } else {
        None
    }
}

fn revision_block(current: &CoverLetter, feedback: &[String]) -> String {
    let numbered = feedback
        .iter()
        .enumerate()
        .map(|(i, f)| format!("{}. {}", i + 1, f.trim()))
        .collect::<Vec<_>>()
        .join("\n");
    REVISION_TEMPLATE
        .replace("{feedback}", &numbered)
        .replace("{current}", &current.text())
}

/// Builds the letter and, if its length is outside bounds, rewrites the body once.
/// A failed adjustment keeps the first version.
async fn compose(
    writer: &dyn CoverLetterWriter,
    ctx: &LetterContext<'_>,
    revision: Option<&str>,
) -> Result<CoverLetter, AppError> {
    let (introduction, conclusion) = writer.write_sections(ctx, revision).await?;
    let introduction = non_empty(introduction)?;
    let conclusion = non_empty(conclusion)?;
    let body = non_empty(
        writer
            .write_body(ctx, &introduction, &conclusion, None, revision)
            .await?,
    )?;
    let letter = CoverLetter::new(introduction, body, conclusion);

    let Some(hint) = length_hint(letter.estimated_lines) else {
        info!(lines = letter.estimated_lines, "Cover letter drafted");
        return Ok(letter);
    };

    match writer
        .write_body(ctx, &letter.introduction, &letter.conclusion, Some(&hint), revision)
        .await
        .and_then(non_empty)
    {
        Ok(body) => {
            let adjusted = CoverLetter::new(
                letter.introduction.clone(),
                body,
                letter.conclusion.clone(),
            );
            info!(
                before = letter.estimated_lines,
                after = adjusted.estimated_lines,
                "Cover letter body length adjusted"
            );
            Ok(adjusted)
        }
        Err(e) => {
            warn!(error = %e, lines = letter.estimated_lines, "Cover letter length adjustment failed; keeping draft");
            Ok(letter)
        }
    }
}

pub async fn draft_cover_letter(
    writer: &dyn CoverLetterWriter,
    ctx: &LetterContext<'_>,
) -> Result<CoverLetter, AppError> {
    compose(writer, ctx, None).await
}

/// Regenerates every section from the accumulated feedback.
pub async fn regenerate_cover_letter(
    writer: &dyn CoverLetterWriter,
    ctx: &LetterContext<'_>,
    current: &CoverLetter,
    feedback: &[String],
) -> Result<CoverLetter, AppError> {
    if feedback.iter().all(|f| f.trim().is_empty()) {
        return Err(AppError::Validation("feedback cannot be empty".to_string()));
    }
    let revision = revision_block(current, feedback);
    compose(writer, ctx, Some(&revision)).await
}

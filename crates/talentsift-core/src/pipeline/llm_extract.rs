//! LLM_EXTRACT stage: structured extraction against the job description.

use super::{prompts, PipelineContext};
use crate::error::StageError;
use crate::llm::GenerationParams;
use crate::schema::ExtractionResult;
use crate::storage::{candidates, documents, extractions, postings};

/// Run structured extraction for a candidate.
///
/// The combined resume text is rebuilt from all documents carrying a text
/// URI; the model response is validated once into [`ExtractionResult`] and
/// upserted with the model id and extract version.
pub async fn run(ctx: &PipelineContext, candidate_id: &str) -> Result<(), StageError> {
    tracing::info!(candidate_id, "starting structured extraction");

    let candidate = candidates::get(&ctx.pool, candidate_id)
        .await?
        .ok_or_else(|| StageError::InputMissing {
            what: format!("candidate {candidate_id}"),
        })?;
    let posting = postings::get(&ctx.pool, &candidate.job_id)
        .await?
        .ok_or_else(|| StageError::InputMissing {
            what: format!("job {}", candidate.job_id),
        })?;

    let resume_text = combined_resume_text(ctx, candidate_id).await?;

    let user_prompt = prompts::extraction_user(&posting.job_text_raw, &resume_text);
    let value = ctx
        .llm
        .extract_json(
            prompts::EXTRACTION_SYSTEM,
            &user_prompt,
            &GenerationParams::default(),
        )
        .await?;

    let result = ExtractionResult::from_value(value).map_err(|e| StageError::SchemaViolation {
        message: e.to_string(),
    })?;

    extractions::upsert(
        &ctx.pool,
        candidate_id,
        &result,
        ctx.llm.model(),
        prompts::EXTRACT_VERSION,
    )
    .await?;

    tracing::info!(
        candidate_id,
        musts = result.job_requirements.must.len(),
        nices = result.job_requirements.nice.len(),
        skills = result.candidate_profile.skills.len(),
        "structured extraction completed"
    );
    Ok(())
}

/// Rebuild the labelled concatenation of all extracted document texts.
async fn combined_resume_text(
    ctx: &PipelineContext,
    candidate_id: &str,
) -> Result<String, StageError> {
    let docs = documents::list_with_text(&ctx.pool, candidate_id).await?;
    if docs.is_empty() {
        return Err(StageError::InputMissing {
            what: format!("extracted text for candidate {candidate_id}"),
        });
    }

    let mut parts = Vec::new();
    for doc in &docs {
        if let Some(text_uri) = &doc.text_uri {
            let text = ctx.blobs.read_text(text_uri).await?;
            parts.push(format!("[{}]\n{text}", doc.doc_type.to_uppercase()));
        }
    }

    Ok(parts.join("\n\n---\n\n"))
}

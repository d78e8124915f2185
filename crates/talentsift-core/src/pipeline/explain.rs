//! EXPLAIN stage: bounded-length rationale for the score.

use super::{prompts, PipelineContext};
use crate::error::StageError;
use crate::llm::GenerationParams;
use crate::schema::ExplanationOutcome;
use crate::storage::{candidates, explanations, extractions, scores};

/// Generate and persist the explanation for a scored candidate, then mark
/// the candidate DONE. This is the terminal stage of the pipeline.
pub async fn run(ctx: &PipelineContext, candidate_id: &str) -> Result<(), StageError> {
    tracing::info!(candidate_id, "starting explanation generation");

    let extraction = extractions::get(&ctx.pool, candidate_id)
        .await?
        .ok_or_else(|| StageError::InputMissing {
            what: format!("extraction for candidate {candidate_id}"),
        })?;
    let score = scores::get(&ctx.pool, candidate_id)
        .await?
        .ok_or_else(|| StageError::InputMissing {
            what: format!("score for candidate {candidate_id}"),
        })?;

    let scores_blob = serde_json::json!({
        "must_score": score.breakdown.must_score,
        "nice_score": score.breakdown.nice_score,
        "year_score": score.breakdown.year_score,
        "role_score": score.breakdown.role_score,
        "total_fit_0_100": score.breakdown.total_fit_0_100,
        "must_gaps": score.breakdown.must_gaps,
    });

    let user_prompt = prompts::explanation_user(
        &extraction.result.job_requirements,
        &extraction.result.candidate_profile,
        &scores_blob,
        &extraction.result.evidence,
    );

    let value = ctx
        .llm
        .extract_json(
            prompts::EXPLANATION_SYSTEM,
            &user_prompt,
            &GenerationParams::default(),
        )
        .await?;

    let outcome = ExplanationOutcome::from_value(value).map_err(|e| StageError::SchemaViolation {
        message: e.to_string(),
    })?;

    explanations::upsert(&ctx.pool, candidate_id, &outcome).await?;
    candidates::mark_done(&ctx.pool, candidate_id).await?;

    tracing::info!(candidate_id, "explanation generation completed, candidate done");
    Ok(())
}

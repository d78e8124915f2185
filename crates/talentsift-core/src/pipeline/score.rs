//! SCORE stage: deterministic composite scoring.

use super::PipelineContext;
use crate::error::StageError;
use crate::scoring::ScoringEngine;
use crate::storage::{embeddings, extractions, score_config, scores};

/// Compute and persist the score for a candidate using the latest score
/// configuration. The configuration version is stamped onto the record.
pub async fn run(ctx: &PipelineContext, candidate_id: &str) -> Result<(), StageError> {
    tracing::info!(candidate_id, "starting score calculation");

    let extraction = extractions::get(&ctx.pool, candidate_id)
        .await?
        .ok_or_else(|| StageError::InputMissing {
            what: format!("extraction for candidate {candidate_id}"),
        })?;

    let config = score_config::latest(&ctx.pool)
        .await?
        .ok_or(StageError::ConfigMissing)?;

    let embedding_set = embeddings::for_candidate(&ctx.pool, candidate_id).await?;

    let engine = ScoringEngine::new(config.settings.clone());
    let breakdown = engine.score(
        &extraction.result.job_requirements,
        &extraction.result.candidate_profile,
        embedding_set.candidate.as_deref(),
        &embedding_set.nice,
    );

    scores::upsert(&ctx.pool, candidate_id, &breakdown, config.version).await?;

    tracing::info!(
        candidate_id,
        total = breakdown.total_fit_0_100,
        config_version = config.version,
        "score calculation completed"
    );
    Ok(())
}

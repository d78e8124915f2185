//! EMBED stage: candidate summary and per-requirement vectors.

use super::PipelineContext;
use crate::error::StageError;
use crate::schema::CandidateProfile;
use crate::storage::embeddings::{EmbeddingKind, NewEmbedding};
use crate::storage::{embeddings, extractions};

/// Generate the embedding set for a candidate.
///
/// All previous embeddings are replaced in one transaction so exactly the
/// new set survives. A candidate whose summary string is empty simply gets
/// no summary vector; the nice scorer treats that as 0.
pub async fn run(ctx: &PipelineContext, candidate_id: &str) -> Result<(), StageError> {
    tracing::info!(candidate_id, "starting embedding generation");

    let extraction = extractions::get(&ctx.pool, candidate_id)
        .await?
        .ok_or_else(|| StageError::InputMissing {
            what: format!("extraction for candidate {candidate_id}"),
        })?;

    let mut new_embeddings = Vec::new();

    let summary = candidate_summary_text(&extraction.result.candidate_profile);
    if summary.is_empty() {
        tracing::warn!(candidate_id, "empty candidate summary, skipping summary embedding");
    } else {
        let vector = ctx.llm.embed_one(&summary).await?;
        new_embeddings.push(NewEmbedding {
            kind: EmbeddingKind::CandidateSummary,
            ref_id: None,
            vector,
        });
    }

    let nice_requirements: Vec<_> = extraction
        .result
        .job_requirements
        .nice
        .iter()
        .filter(|req| !req.text.is_empty())
        .collect();

    for chunk in nice_requirements.chunks(ctx.worker.batch_size.max(1) as usize) {
        let texts: Vec<String> = chunk.iter().map(|req| req.text.clone()).collect();
        let vectors = ctx.llm.embed_many(&texts).await?;
        for (req, vector) in chunk.iter().zip(vectors) {
            new_embeddings.push(NewEmbedding {
                kind: EmbeddingKind::NiceReq,
                ref_id: Some(req.id.clone()),
                vector,
            });
        }
    }

    let count = new_embeddings.len();
    embeddings::replace_for_candidate(&ctx.pool, candidate_id, &new_embeddings).await?;

    tracing::info!(candidate_id, count, "embedding generation completed");
    Ok(())
}

/// Build the candidate summary string from the non-empty profile sections.
fn candidate_summary_text(profile: &CandidateProfile) -> String {
    let mut parts = Vec::new();

    if !profile.skills.is_empty() {
        parts.push(format!("Skills: {}", profile.skills.join(", ")));
    }
    if !profile.highlights.is_empty() {
        parts.push(format!("Highlights: {}", profile.highlights.join(". ")));
    }
    if !profile.roles.is_empty() {
        parts.push(format!("Roles: {}", profile.roles.join(", ")));
    }

    parts.join(" | ")
}

//! The asynchronous screening pipeline.
//!
//! Each candidate moves through five ordered stages: text extraction,
//! structured extraction, embedding, scoring, explanation. Stage handlers
//! are idempotent (upserts or scoped delete+insert) so at-least-once
//! execution is safe; the polling [`runner`] owns all queue and candidate
//! state transitions.

pub mod embed;
pub mod explain;
pub mod llm_extract;
pub mod prompts;
pub mod runner;
pub mod score;
pub mod text_extract;

#[cfg(test)]
mod e2e_tests;

use crate::blobstore::BlobStore;
use crate::config::WorkerConfig;
use crate::error::StageError;
use crate::llm::LlmClient;
use crate::storage::queue::Stage;
use crate::storage::DbPool;
use std::sync::Arc;

/// Shared dependencies every stage handler works against.
#[derive(Clone)]
pub struct PipelineContext {
    /// Database pool.
    pub pool: DbPool,
    /// Blob storage adapter.
    pub blobs: Arc<dyn BlobStore>,
    /// LLM and embedding provider.
    pub llm: Arc<dyn LlmClient>,
    /// Worker tuning knobs.
    pub worker: WorkerConfig,
}

/// Dispatch a stage to its handler.
pub async fn run_stage(
    ctx: &PipelineContext,
    stage: Stage,
    candidate_id: &str,
) -> Result<(), StageError> {
    match stage {
        Stage::TextExtract => text_extract::run(ctx, candidate_id).await,
        Stage::LlmExtract => llm_extract::run(ctx, candidate_id).await,
        Stage::Embed => embed::run(ctx, candidate_id).await,
        Stage::Score => score::run(ctx, candidate_id).await,
        Stage::Explain => explain::run(ctx, candidate_id).await,
    }
}

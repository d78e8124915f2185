//! Embedding vectors for the nice-to-have scorer.
//!
//! A candidate's embeddings are always replaced as a set: one delete plus
//! the new inserts inside a single transaction, so exactly the latest run
//! survives.

use super::DbPool;
use crate::error::StorageError;

/// What a stored vector represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingKind {
    /// The candidate's profile summary. At most one per candidate.
    CandidateSummary,
    /// One nice requirement's text; `ref_id` holds the requirement id.
    NiceReq,
}

impl EmbeddingKind {
    /// Database representation.
    pub fn as_db(self) -> &'static str {
        match self {
            EmbeddingKind::CandidateSummary => "CANDIDATE_SUMMARY",
            EmbeddingKind::NiceReq => "NICE_REQ",
        }
    }
}

/// A vector to be stored for a candidate.
#[derive(Debug, Clone)]
pub struct NewEmbedding {
    /// What the vector represents.
    pub kind: EmbeddingKind,
    /// Requirement id for nice vectors; `None` for the summary.
    pub ref_id: Option<String>,
    /// The vector itself.
    pub vector: Vec<f32>,
}

/// The embedding set for a candidate, shaped for the scorer.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingSet {
    /// The candidate summary vector, when one was produced.
    pub candidate: Option<Vec<f32>>,
    /// (requirement id, vector) for each nice requirement.
    pub nice: Vec<(String, Vec<f32>)>,
}

/// Atomically replace all embeddings for a candidate with the given set.
pub async fn replace_for_candidate(
    pool: &DbPool,
    candidate_id: &str,
    embeddings: &[NewEmbedding],
) -> Result<(), StorageError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| StorageError::Query { source: e })?;

    sqlx::query("DELETE FROM embeddings WHERE candidate_id = ?")
        .bind(candidate_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Query { source: e })?;

    for embedding in embeddings {
        let vector_json =
            serde_json::to_string(&embedding.vector).map_err(|e| StorageError::CorruptRecord {
                column: "vector_json".to_string(),
                message: e.to_string(),
            })?;
        sqlx::query(
            "INSERT INTO embeddings (embedding_id, candidate_id, kind, ref_id, vector_json) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(candidate_id)
        .bind(embedding.kind.as_db())
        .bind(&embedding.ref_id)
        .bind(vector_json)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Query { source: e })?;
    }

    tx.commit()
        .await
        .map_err(|e| StorageError::Query { source: e })?;

    Ok(())
}

/// Load the embedding set for a candidate.
pub async fn for_candidate(
    pool: &DbPool,
    candidate_id: &str,
) -> Result<EmbeddingSet, StorageError> {
    let rows: Vec<(String, Option<String>, String)> = sqlx::query_as(
        "SELECT kind, ref_id, vector_json FROM embeddings \
         WHERE candidate_id = ? ORDER BY rowid ASC",
    )
    .bind(candidate_id)
    .fetch_all(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    let mut set = EmbeddingSet::default();
    for (kind, ref_id, vector_json) in rows {
        let vector: Vec<f32> =
            serde_json::from_str(&vector_json).map_err(|e| StorageError::CorruptRecord {
                column: "vector_json".to_string(),
                message: e.to_string(),
            })?;
        match kind.as_str() {
            "CANDIDATE_SUMMARY" => set.candidate = Some(vector),
            "NICE_REQ" => {
                if let Some(ref_id) = ref_id {
                    set.nice.push((ref_id, vector));
                }
            }
            other => {
                tracing::warn!(kind = other, candidate_id, "ignoring embedding of unknown kind");
            }
        }
    }

    Ok(set)
}

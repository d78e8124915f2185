//! Job postings. Read-only input to the pipeline.

use super::DbPool;
use crate::error::StorageError;

/// A job posting whose raw text feeds structured extraction.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobPosting {
    /// Unique identifier.
    pub job_id: String,
    /// Human-readable title.
    pub title: String,
    /// The full job description text.
    pub job_text_raw: String,
}

/// Fetch a posting by id.
pub async fn get(pool: &DbPool, job_id: &str) -> Result<Option<JobPosting>, StorageError> {
    sqlx::query_as("SELECT job_id, title, job_text_raw FROM jobs WHERE job_id = ?")
        .bind(job_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })
}

//! Candidate status projection.
//!
//! The pipeline owns three transitions: PROCESSING when work is leased,
//! DONE after the explanation stage, ERROR when a stage exhausts retries.

use super::{truncate_error, DbPool};
use crate::error::StorageError;

/// A candidate row as the pipeline sees it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Candidate {
    /// Unique identifier.
    pub candidate_id: String,
    /// The job posting this candidate applied to.
    pub job_id: String,
    /// Display name for operator output.
    pub display_name: String,
    /// `NEW`, `PROCESSING`, `DONE` or `ERROR`.
    pub status: String,
    /// Failure detail when status is ERROR.
    pub error_message: Option<String>,
}

const SELECT_COLS: &str = "candidate_id, job_id, display_name, status, error_message";

/// Fetch a candidate by id.
pub async fn get(pool: &DbPool, candidate_id: &str) -> Result<Option<Candidate>, StorageError> {
    let sql = format!("SELECT {SELECT_COLS} FROM candidates WHERE candidate_id = ?");
    sqlx::query_as(&sql)
        .bind(candidate_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })
}

/// Mark a candidate as being processed. A candidate that already reached
/// DONE is left alone; an errored candidate being retried goes back to
/// PROCESSING.
pub async fn mark_processing(pool: &DbPool, candidate_id: &str) -> Result<(), StorageError> {
    sqlx::query(
        "UPDATE candidates SET status = 'PROCESSING', \
         updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now') \
         WHERE candidate_id = ? AND status != 'DONE'",
    )
    .bind(candidate_id)
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(())
}

/// Mark a candidate as fully screened.
pub async fn mark_done(pool: &DbPool, candidate_id: &str) -> Result<(), StorageError> {
    sqlx::query(
        "UPDATE candidates SET status = 'DONE', error_message = NULL, \
         updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now') \
         WHERE candidate_id = ?",
    )
    .bind(candidate_id)
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(())
}

/// Project a terminal pipeline failure onto the candidate.
pub async fn mark_error(
    pool: &DbPool,
    candidate_id: &str,
    error: &str,
) -> Result<(), StorageError> {
    sqlx::query(
        "UPDATE candidates SET status = 'ERROR', error_message = ?, \
         updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now') \
         WHERE candidate_id = ?",
    )
    .bind(truncate_error(error))
    .bind(candidate_id)
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::init_test_db;

    async fn seed(pool: &DbPool) {
        sqlx::query("INSERT INTO jobs (job_id, job_text_raw) VALUES ('j1', 'text')")
            .execute(pool)
            .await
            .expect("seed job");
        sqlx::query(
            "INSERT INTO candidates (candidate_id, job_id, display_name) VALUES ('c1', 'j1', 'Ada')",
        )
        .execute(pool)
        .await
        .expect("seed candidate");
    }

    #[tokio::test]
    async fn new_candidate_transitions_to_processing() {
        let pool = init_test_db().await.expect("db");
        seed(&pool).await;

        mark_processing(&pool, "c1").await.expect("mark");
        let candidate = get(&pool, "c1").await.expect("get").expect("row");
        assert_eq!(candidate.status, "PROCESSING");
    }

    #[tokio::test]
    async fn done_candidate_is_not_reset_to_processing() {
        let pool = init_test_db().await.expect("db");
        seed(&pool).await;

        mark_done(&pool, "c1").await.expect("done");
        mark_processing(&pool, "c1").await.expect("mark");

        let candidate = get(&pool, "c1").await.expect("get").expect("row");
        assert_eq!(candidate.status, "DONE");
    }

    #[tokio::test]
    async fn mark_error_stores_truncated_message() {
        let pool = init_test_db().await.expect("db");
        seed(&pool).await;

        let long = "boom ".repeat(300);
        mark_error(&pool, "c1", &long).await.expect("error");

        let candidate = get(&pool, "c1").await.expect("get").expect("row");
        assert_eq!(candidate.status, "ERROR");
        assert_eq!(candidate.error_message.as_deref().map(str::len), Some(1000));
    }

    #[tokio::test]
    async fn errored_candidate_can_resume_processing() {
        let pool = init_test_db().await.expect("db");
        seed(&pool).await;

        mark_error(&pool, "c1", "transient").await.expect("error");
        mark_processing(&pool, "c1").await.expect("mark");

        let candidate = get(&pool, "c1").await.expect("get").expect("row");
        assert_eq!(candidate.status, "PROCESSING");
    }

    #[tokio::test]
    async fn get_missing_candidate_returns_none() {
        let pool = init_test_db().await.expect("db");
        assert!(get(&pool, "ghost").await.expect("get").is_none());
    }
}

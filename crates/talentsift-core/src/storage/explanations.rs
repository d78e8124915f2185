//! Persisted explanation records, one per candidate.

use super::DbPool;
use crate::error::StorageError;
use crate::schema::ExplanationOutcome;

/// Fetch the explanation for a candidate.
pub async fn get(
    pool: &DbPool,
    candidate_id: &str,
) -> Result<Option<ExplanationOutcome>, StorageError> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT explanation_json FROM explanations WHERE candidate_id = ?")
            .bind(candidate_id)
            .fetch_optional(pool)
            .await
            .map_err(|e| StorageError::Query { source: e })?;

    row.map(|(raw,)| {
        serde_json::from_str(&raw).map_err(|e| StorageError::CorruptRecord {
            column: "explanation_json".to_string(),
            message: e.to_string(),
        })
    })
    .transpose()
}

/// Insert or overwrite the explanation for a candidate.
pub async fn upsert(
    pool: &DbPool,
    candidate_id: &str,
    explanation: &ExplanationOutcome,
) -> Result<(), StorageError> {
    let explanation_json =
        serde_json::to_string(explanation).map_err(|e| StorageError::CorruptRecord {
            column: "explanation_json".to_string(),
            message: e.to_string(),
        })?;

    sqlx::query(
        "INSERT INTO explanations (candidate_id, explanation_json, updated_at) \
         VALUES (?, ?, strftime('%Y-%m-%dT%H:%M:%SZ', 'now')) \
         ON CONFLICT(candidate_id) DO UPDATE SET \
            explanation_json = excluded.explanation_json, \
            updated_at = excluded.updated_at",
    )
    .bind(candidate_id)
    .bind(explanation_json)
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
        sqlx::query("INSERT INTO candidates (candidate_id, job_id) VALUES ('c1', 'j1')")
            .execute(pool)
            .await
            .expect("seed candidate");
    }

    fn sample() -> ExplanationOutcome {
        ExplanationOutcome {
            summary: "Solid backend candidate.".to_string(),
            strengths: vec!["Python depth".to_string()],
            concerns: vec!["No Go experience".to_string()],
            unknowns: vec!["Team size led".to_string()],
            must_gaps: vec!["Go required".to_string()],
        }
    }

    #[tokio::test]
    async fn upsert_then_get_round_trips() {
        let pool = init_test_db().await.expect("db");
        seed(&pool).await;

        upsert(&pool, "c1", &sample()).await.expect("upsert");

        let explanation = get(&pool, "c1").await.expect("get").expect("record");
        assert_eq!(explanation, sample());
    }

    #[tokio::test]
    async fn upsert_overwrites_existing() {
        let pool = init_test_db().await.expect("db");
        seed(&pool).await;

        upsert(&pool, "c1", &sample()).await.expect("first");

        let mut updated = sample();
        updated.summary = "Updated summary.".to_string();
        upsert(&pool, "c1", &updated).await.expect("second");

        let explanation = get(&pool, "c1").await.expect("get").expect("record");
        assert_eq!(explanation.summary, "Updated summary.");

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM explanations")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(count.0, 1);
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let pool = init_test_db().await.expect("db");
        assert!(get(&pool, "ghost").await.expect("get").is_none());
    }
}

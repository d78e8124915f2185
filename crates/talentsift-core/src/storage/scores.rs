//! Persisted score records, one per candidate.

use super::DbPool;
use crate::error::StorageError;
use crate::scoring::ScoreBreakdown;

/// A stored score with the config version that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    /// Owning candidate.
    pub candidate_id: String,
    /// The full breakdown.
    pub breakdown: ScoreBreakdown,
    /// Version of the score config used, kept for audit.
    pub score_config_version: i64,
}

#[derive(sqlx::FromRow)]
struct ScoreRow {
    candidate_id: String,
    must_score: f64,
    nice_score: f64,
    year_score: f64,
    role_score: f64,
    total_fit_0_100: i64,
    must_gaps_json: String,
    score_config_version: i64,
}

impl TryFrom<ScoreRow> for ScoreRecord {
    type Error = StorageError;

    fn try_from(row: ScoreRow) -> Result<Self, Self::Error> {
        let must_gaps: Vec<String> =
            serde_json::from_str(&row.must_gaps_json).map_err(|e| StorageError::CorruptRecord {
                column: "must_gaps_json".to_string(),
                message: e.to_string(),
            })?;

        Ok(ScoreRecord {
            candidate_id: row.candidate_id,
            breakdown: ScoreBreakdown {
                must_score: row.must_score,
                nice_score: row.nice_score,
                year_score: row.year_score,
                role_score: row.role_score,
                total_fit_0_100: row.total_fit_0_100,
                must_gaps,
            },
            score_config_version: row.score_config_version,
        })
    }
}

/// Fetch the score for a candidate.
pub async fn get(pool: &DbPool, candidate_id: &str) -> Result<Option<ScoreRecord>, StorageError> {
    let row: Option<ScoreRow> = sqlx::query_as(
        "SELECT candidate_id, must_score, nice_score, year_score, role_score, \
         total_fit_0_100, must_gaps_json, score_config_version \
         FROM scores WHERE candidate_id = ?",
    )
    .bind(candidate_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    row.map(ScoreRecord::try_from).transpose()
}

/// Insert or overwrite the score for a candidate.
pub async fn upsert(
    pool: &DbPool,
    candidate_id: &str,
    breakdown: &ScoreBreakdown,
    score_config_version: i64,
) -> Result<(), StorageError> {
    let must_gaps_json =
        serde_json::to_string(&breakdown.must_gaps).map_err(|e| StorageError::CorruptRecord {
            column: "must_gaps_json".to_string(),
            message: e.to_string(),
        })?;

    sqlx::query(
        "INSERT INTO scores \
         (candidate_id, must_score, nice_score, year_score, role_score, total_fit_0_100, \
          must_gaps_json, score_config_version, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, strftime('%Y-%m-%dT%H:%M:%SZ', 'now')) \
         ON CONFLICT(candidate_id) DO UPDATE SET \
            must_score = excluded.must_score, \
            nice_score = excluded.nice_score, \
            year_score = excluded.year_score, \
            role_score = excluded.role_score, \
            total_fit_0_100 = excluded.total_fit_0_100, \
            must_gaps_json = excluded.must_gaps_json, \
            score_config_version = excluded.score_config_version, \
            updated_at = excluded.updated_at",
    )
    .bind(candidate_id)
    .bind(breakdown.must_score)
    .bind(breakdown.nice_score)
    .bind(breakdown.year_score)
    .bind(breakdown.role_score)
    .bind(breakdown.total_fit_0_100)
    .bind(must_gaps_json)
    .bind(score_config_version)
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(())
}

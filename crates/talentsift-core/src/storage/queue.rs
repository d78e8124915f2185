//! Durable work queue backed by the `jobs_queue` table.
//!
//! The queue is polled by the pipeline runner. Leasing is a single atomic
//! UPDATE ... RETURNING statement: SQLite serializes writers, so a row can
//! only ever be claimed by one worker. This is the engine's equivalent of
//! row-level locking with skip-locked semantics.

use super::{truncate_error, DbPool};
use crate::error::StorageError;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// The five ordered operations a candidate undergoes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Parse raw document bytes into plain text.
    TextExtract,
    /// Structured extraction of requirements and profile via the LLM.
    LlmExtract,
    /// Candidate and per-requirement embedding vectors.
    Embed,
    /// Deterministic composite scoring.
    Score,
    /// Bounded-length rationale generation.
    Explain,
}

impl Stage {
    /// The stage's database representation.
    pub fn as_db(self) -> &'static str {
        match self {
            Stage::TextExtract => "TEXT_EXTRACT",
            Stage::LlmExtract => "LLM_EXTRACT",
            Stage::Embed => "EMBED",
            Stage::Score => "SCORE",
            Stage::Explain => "EXPLAIN",
        }
    }

    /// Parse a database representation. Returns `None` for unknown strings.
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "TEXT_EXTRACT" => Some(Stage::TextExtract),
            "LLM_EXTRACT" => Some(Stage::LlmExtract),
            "EMBED" => Some(Stage::Embed),
            "SCORE" => Some(Stage::Score),
            "EXPLAIN" => Some(Stage::Explain),
            _ => None,
        }
    }

    /// The stage enqueued after this one completes, if any.
    pub fn successor(self) -> Option<Self> {
        match self {
            Stage::TextExtract => Some(Stage::LlmExtract),
            Stage::LlmExtract => Some(Stage::Embed),
            Stage::Embed => Some(Stage::Score),
            Stage::Score => Some(Stage::Explain),
            Stage::Explain => None,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db())
    }
}

/// One leased or inspected unit of work.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QueueItem {
    /// Unique, never-reused identifier.
    pub queue_id: String,
    /// The candidate this work belongs to.
    pub candidate_id: String,
    /// Stage name as stored (`TEXT_EXTRACT`, ...).
    pub job_type: String,
    /// `READY`, `RUNNING`, `DONE` or `FAILED`.
    pub status: String,
    /// Times this item transitioned into RUNNING.
    pub attempts: i64,
    /// Last failure message, truncated to 1000 chars. Preserved across retries.
    pub last_error: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last transition timestamp.
    pub updated_at: DateTime<Utc>,
}

impl QueueItem {
    /// The typed stage, if the stored string is recognised.
    pub fn stage(&self) -> Option<Stage> {
        Stage::from_db(&self.job_type)
    }
}

/// Per-status counts for the queue, used by the status command.
#[derive(Debug, Clone, Default)]
pub struct QueueStats {
    /// Items waiting to be leased.
    pub ready: i64,
    /// Items currently leased.
    pub running: i64,
    /// Items completed.
    pub done: i64,
    /// Items awaiting operator retry.
    pub failed: i64,
}

const SELECT_COLS: &str =
    "queue_id, candidate_id, job_type, status, attempts, last_error, created_at, updated_at";

/// Append a new READY item for the candidate and stage. Returns its queue id.
///
/// The queue does not deduplicate: two items for the same (candidate, stage)
/// may legitimately coexist.
pub async fn enqueue(
    pool: &DbPool,
    candidate_id: &str,
    stage: Stage,
) -> Result<String, StorageError> {
    let queue_id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO jobs_queue (queue_id, candidate_id, job_type, status, attempts) \
         VALUES (?, ?, ?, 'READY', 0)",
    )
    .bind(&queue_id)
    .bind(candidate_id)
    .bind(stage.as_db())
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(queue_id)
}

/// Atomically claim the oldest READY item, transitioning it to RUNNING and
/// incrementing its attempt counter. Returns `None` when nothing is ready.
pub async fn lease_next(pool: &DbPool) -> Result<Option<QueueItem>, StorageError> {
    let sql = format!(
        "UPDATE jobs_queue SET status = 'RUNNING', attempts = attempts + 1, \
         updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now') \
         WHERE queue_id = (SELECT queue_id FROM jobs_queue WHERE status = 'READY' \
                           ORDER BY created_at ASC, rowid ASC LIMIT 1) \
         RETURNING {SELECT_COLS}"
    );
    sqlx::query_as(&sql)
        .fetch_optional(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })
}

/// Transition a RUNNING item to DONE. Terminal states are never re-entered,
/// so the update is guarded on the current status.
pub async fn complete(pool: &DbPool, queue_id: &str) -> Result<(), StorageError> {
    sqlx::query(
        "UPDATE jobs_queue SET status = 'DONE', \
         updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now') \
         WHERE queue_id = ? AND status = 'RUNNING'",
    )
    .bind(queue_id)
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(())
}

/// Transition a RUNNING item to FAILED, recording the truncated error.
pub async fn fail(pool: &DbPool, queue_id: &str, error: &str) -> Result<(), StorageError> {
    sqlx::query(
        "UPDATE jobs_queue SET status = 'FAILED', last_error = ?, \
         updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now') \
         WHERE queue_id = ? AND status = 'RUNNING'",
    )
    .bind(truncate_error(error))
    .bind(queue_id)
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(())
}

/// Transition a FAILED item back to READY without resetting attempts or
/// clearing `last_error`. Returns whether a row was actually transitioned.
pub async fn retry(pool: &DbPool, queue_id: &str) -> Result<bool, StorageError> {
    let result = sqlx::query(
        "UPDATE jobs_queue SET status = 'READY', \
         updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now') \
         WHERE queue_id = ? AND status = 'FAILED'",
    )
    .bind(queue_id)
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(result.rows_affected() > 0)
}

/// Reset RUNNING items whose last transition is older than `older_than`
/// back to READY. Recovers items orphaned by a process crash between
/// lease and complete/fail. Returns the number of items reset.
pub async fn reset_stuck(
    pool: &DbPool,
    older_than: std::time::Duration,
) -> Result<u64, StorageError> {
    let result = sqlx::query(
        "UPDATE jobs_queue SET status = 'READY', \
         updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now') \
         WHERE status = 'RUNNING' \
         AND updated_at < strftime('%Y-%m-%dT%H:%M:%SZ', 'now', ?)",
    )
    .bind(format!("-{} seconds", older_than.as_secs()))
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(result.rows_affected())
}

/// Fetch a single item by id.
pub async fn get(pool: &DbPool, queue_id: &str) -> Result<Option<QueueItem>, StorageError> {
    let sql = format!("SELECT {SELECT_COLS} FROM jobs_queue WHERE queue_id = ?");
    sqlx::query_as(&sql)
        .bind(queue_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })
}

/// Fetch the most recent FAILED items for the operator.
pub async fn failed(pool: &DbPool, limit: i64) -> Result<Vec<QueueItem>, StorageError> {
    let sql = format!(
        "SELECT {SELECT_COLS} FROM jobs_queue WHERE status = 'FAILED' \
         ORDER BY updated_at DESC LIMIT ?"
    );
    sqlx::query_as(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })
}

/// Counts of items grouped by status.
pub async fn stats(pool: &DbPool) -> Result<QueueStats, StorageError> {
    let row: (i64, i64, i64, i64) = sqlx::query_as(
        "SELECT \
            COALESCE(SUM(CASE WHEN status = 'READY' THEN 1 ELSE 0 END), 0), \
            COALESCE(SUM(CASE WHEN status = 'RUNNING' THEN 1 ELSE 0 END), 0), \
            COALESCE(SUM(CASE WHEN status = 'DONE' THEN 1 ELSE 0 END), 0), \
            COALESCE(SUM(CASE WHEN status = 'FAILED' THEN 1 ELSE 0 END), 0) \
         FROM jobs_queue",
    )
    .fetch_one(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(QueueStats {
        ready: row.0,
        running: row.1,
        done: row.2,
        failed: row.3,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::init_test_db;
    use std::time::Duration;

    async fn seed_candidate(pool: &DbPool, candidate_id: &str) {
        sqlx::query("INSERT OR IGNORE INTO jobs (job_id, job_text_raw) VALUES ('j1', 'text')")
            .execute(pool)
            .await
            .expect("seed job");
        sqlx::query("INSERT INTO candidates (candidate_id, job_id) VALUES (?, 'j1')")
            .bind(candidate_id)
            .execute(pool)
            .await
            .expect("seed candidate");
    }

    #[test]
    fn stage_round_trips_through_db_strings() {
        for stage in [
            Stage::TextExtract,
            Stage::LlmExtract,
            Stage::Embed,
            Stage::Score,
            Stage::Explain,
        ] {
            assert_eq!(Stage::from_db(stage.as_db()), Some(stage));
        }
        assert_eq!(Stage::from_db("RESCORE"), None);
    }

    #[test]
    fn successor_chain_ends_at_explain() {
        assert_eq!(Stage::TextExtract.successor(), Some(Stage::LlmExtract));
        assert_eq!(Stage::LlmExtract.successor(), Some(Stage::Embed));
        assert_eq!(Stage::Embed.successor(), Some(Stage::Score));
        assert_eq!(Stage::Score.successor(), Some(Stage::Explain));
        assert_eq!(Stage::Explain.successor(), None);
    }

    #[tokio::test]
    async fn enqueue_then_lease_returns_item() {
        let pool = init_test_db().await.expect("db");
        seed_candidate(&pool, "c1").await;

        let queue_id = enqueue(&pool, "c1", Stage::TextExtract).await.expect("enqueue");
        let item = lease_next(&pool).await.expect("lease").expect("item");

        assert_eq!(item.queue_id, queue_id);
        assert_eq!(item.candidate_id, "c1");
        assert_eq!(item.stage(), Some(Stage::TextExtract));
        assert_eq!(item.status, "RUNNING");
        assert_eq!(item.attempts, 1);
    }

    #[tokio::test]
    async fn lease_empty_queue_returns_none() {
        let pool = init_test_db().await.expect("db");
        assert!(lease_next(&pool).await.expect("lease").is_none());
    }

    #[tokio::test]
    async fn lease_is_fifo_across_candidates() {
        let pool = init_test_db().await.expect("db");
        seed_candidate(&pool, "c1").await;
        seed_candidate(&pool, "c2").await;

        let first = enqueue(&pool, "c1", Stage::TextExtract).await.expect("first");
        let second = enqueue(&pool, "c2", Stage::TextExtract).await.expect("second");

        let leased1 = lease_next(&pool).await.expect("lease").expect("item");
        let leased2 = lease_next(&pool).await.expect("lease").expect("item");

        assert_eq!(leased1.queue_id, first);
        assert_eq!(leased2.queue_id, second);
        assert!(lease_next(&pool).await.expect("lease").is_none());
    }

    #[tokio::test]
    async fn at_most_one_concurrent_lease() {
        let pool = init_test_db().await.expect("db");
        seed_candidate(&pool, "c1").await;
        enqueue(&pool, "c1", Stage::TextExtract).await.expect("enqueue");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move { lease_next(&pool).await }));
        }

        let mut leased = 0;
        for handle in handles {
            if handle.await.expect("join").expect("lease").is_some() {
                leased += 1;
            }
        }
        assert_eq!(leased, 1);
    }

    #[tokio::test]
    async fn complete_marks_done_and_is_terminal() {
        let pool = init_test_db().await.expect("db");
        seed_candidate(&pool, "c1").await;
        let queue_id = enqueue(&pool, "c1", Stage::Embed).await.expect("enqueue");

        lease_next(&pool).await.expect("lease").expect("item");
        complete(&pool, &queue_id).await.expect("complete");

        let item = get(&pool, &queue_id).await.expect("get").expect("item");
        assert_eq!(item.status, "DONE");

        // A DONE item cannot be failed or re-completed.
        fail(&pool, &queue_id, "late failure").await.expect("fail");
        let item = get(&pool, &queue_id).await.expect("get").expect("item");
        assert_eq!(item.status, "DONE");
        assert!(item.last_error.is_none());
    }

    #[tokio::test]
    async fn fail_records_truncated_error() {
        let pool = init_test_db().await.expect("db");
        seed_candidate(&pool, "c1").await;
        let queue_id = enqueue(&pool, "c1", Stage::Score).await.expect("enqueue");

        lease_next(&pool).await.expect("lease").expect("item");
        let long_error = "e".repeat(1500);
        fail(&pool, &queue_id, &long_error).await.expect("fail");

        let item = get(&pool, &queue_id).await.expect("get").expect("item");
        assert_eq!(item.status, "FAILED");
        assert_eq!(item.last_error.as_deref().map(str::len), Some(1000));
    }

    #[tokio::test]
    async fn retry_preserves_attempts_and_error() {
        let pool = init_test_db().await.expect("db");
        seed_candidate(&pool, "c1").await;
        let queue_id = enqueue(&pool, "c1", Stage::TextExtract).await.expect("enqueue");

        lease_next(&pool).await.expect("lease").expect("item");
        fail(&pool, &queue_id, "parser exploded").await.expect("fail");

        assert!(retry(&pool, &queue_id).await.expect("retry"));

        let item = get(&pool, &queue_id).await.expect("get").expect("item");
        assert_eq!(item.status, "READY");
        assert_eq!(item.attempts, 1);
        assert_eq!(item.last_error.as_deref(), Some("parser exploded"));

        // Second lease increments attempts again: monotonic, never reset.
        let leased = lease_next(&pool).await.expect("lease").expect("item");
        assert_eq!(leased.queue_id, queue_id);
        assert_eq!(leased.attempts, 2);
    }

    #[tokio::test]
    async fn retry_on_non_failed_item_is_noop() {
        let pool = init_test_db().await.expect("db");
        seed_candidate(&pool, "c1").await;
        let queue_id = enqueue(&pool, "c1", Stage::TextExtract).await.expect("enqueue");

        assert!(!retry(&pool, &queue_id).await.expect("retry"));
        assert!(!retry(&pool, "no-such-id").await.expect("retry"));
    }

    #[tokio::test]
    async fn reset_stuck_recovers_orphaned_running_items() {
        let pool = init_test_db().await.expect("db");
        seed_candidate(&pool, "c1").await;
        let queue_id = enqueue(&pool, "c1", Stage::Embed).await.expect("enqueue");
        lease_next(&pool).await.expect("lease").expect("item");

        // Fresh RUNNING items are untouched.
        let reset = reset_stuck(&pool, Duration::from_secs(600)).await.expect("sweep");
        assert_eq!(reset, 0);

        // Simulate a crashed worker: age the item past the threshold.
        sqlx::query("UPDATE jobs_queue SET updated_at = '2000-01-01T00:00:00Z' WHERE queue_id = ?")
            .bind(&queue_id)
            .execute(&pool)
            .await
            .expect("age item");

        let reset = reset_stuck(&pool, Duration::from_secs(600)).await.expect("sweep");
        assert_eq!(reset, 1);

        let item = get(&pool, &queue_id).await.expect("get").expect("item");
        assert_eq!(item.status, "READY");
        assert_eq!(item.attempts, 1);
    }

    #[tokio::test]
    async fn stats_counts_by_status() {
        let pool = init_test_db().await.expect("db");
        seed_candidate(&pool, "c1").await;

        enqueue(&pool, "c1", Stage::TextExtract).await.expect("enqueue");
        enqueue(&pool, "c1", Stage::TextExtract).await.expect("enqueue");
        lease_next(&pool).await.expect("lease").expect("item");

        let stats = stats(&pool).await.expect("stats");
        assert_eq!(stats.ready, 1);
        assert_eq!(stats.running, 1);
        assert_eq!(stats.done, 0);
        assert_eq!(stats.failed, 0);
    }

    #[tokio::test]
    async fn duplicate_stage_items_are_allowed() {
        let pool = init_test_db().await.expect("db");
        seed_candidate(&pool, "c1").await;

        let a = enqueue(&pool, "c1", Stage::TextExtract).await.expect("enqueue");
        let b = enqueue(&pool, "c1", Stage::TextExtract).await.expect("enqueue");
        assert_ne!(a, b);

        let stats = stats(&pool).await.expect("stats");
        assert_eq!(stats.ready, 2);
    }
}

//! Versioned scoring configuration.
//!
//! Rows are immutable once created; tuning always inserts a new version.
//! The SCORE stage uses the latest version and stamps it onto the score
//! record for audit.

use super::DbPool;
use crate::error::StorageError;
use crate::scoring::role::RoleMatrix;
use crate::scoring::{ScoreSettings, ScoreWeights};

/// One immutable configuration snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreConfigRecord {
    /// Monotonically increasing version.
    pub version: i64,
    /// The tuning knobs.
    pub settings: ScoreSettings,
}

#[derive(sqlx::FromRow)]
struct ScoreConfigRow {
    version: i64,
    weights_json: String,
    must_cap_enabled: bool,
    must_cap_value: i64,
    nice_top_n: i64,
    role_distance_json: String,
}

impl TryFrom<ScoreConfigRow> for ScoreConfigRecord {
    type Error = StorageError;

    fn try_from(row: ScoreConfigRow) -> Result<Self, Self::Error> {
        let weights: ScoreWeights =
            serde_json::from_str(&row.weights_json).map_err(|e| StorageError::CorruptRecord {
                column: "weights_json".to_string(),
                message: e.to_string(),
            })?;
        let role_distance: RoleMatrix = serde_json::from_str(&row.role_distance_json)
            .map_err(|e| StorageError::CorruptRecord {
                column: "role_distance_json".to_string(),
                message: e.to_string(),
            })?;

        Ok(ScoreConfigRecord {
            version: row.version,
            settings: ScoreSettings {
                weights,
                must_cap_enabled: row.must_cap_enabled,
                must_cap_value: row.must_cap_value,
                nice_top_n: usize::try_from(row.nice_top_n).unwrap_or(0),
                role_distance,
            },
        })
    }
}

/// Fetch the latest configuration version, if any exists.
pub async fn latest(pool: &DbPool) -> Result<Option<ScoreConfigRecord>, StorageError> {
    let row: Option<ScoreConfigRow> = sqlx::query_as(
        "SELECT version, weights_json, must_cap_enabled, must_cap_value, nice_top_n, role_distance_json \
         FROM score_config ORDER BY version DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    row.map(ScoreConfigRecord::try_from).transpose()
}

/// Fetch a specific configuration version.
pub async fn get(pool: &DbPool, version: i64) -> Result<Option<ScoreConfigRecord>, StorageError> {
    let row: Option<ScoreConfigRow> = sqlx::query_as(
        "SELECT version, weights_json, must_cap_enabled, must_cap_value, nice_top_n, role_distance_json \
         FROM score_config WHERE version = ?",
    )
    .bind(version)
    .fetch_optional(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    row.map(ScoreConfigRecord::try_from).transpose()
}

/// Insert a new configuration version. Returns the assigned version.
pub async fn insert(pool: &DbPool, settings: &ScoreSettings) -> Result<i64, StorageError> {
    let weights_json =
        serde_json::to_string(&settings.weights).map_err(|e| StorageError::CorruptRecord {
            column: "weights_json".to_string(),
            message: e.to_string(),
        })?;
    let role_distance_json = serde_json::to_string(&settings.role_distance).map_err(|e| {
        StorageError::CorruptRecord {
            column: "role_distance_json".to_string(),
            message: e.to_string(),
        }
    })?;

    let result = sqlx::query(
        "INSERT INTO score_config \
         (weights_json, must_cap_enabled, must_cap_value, nice_top_n, role_distance_json) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(weights_json)
    .bind(settings.must_cap_enabled)
    .bind(settings.must_cap_value)
    .bind(settings.nice_top_n as i64)
    .bind(role_distance_json)
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(result.last_insert_rowid())
}

/// Insert the default settings as a new version. Used by `init-config`.
pub async fn insert_default(pool: &DbPool) -> Result<i64, StorageError> {
    insert(pool, &ScoreSettings::default()).await
}

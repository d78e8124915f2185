//! Structured extraction records, one per candidate.

use super::DbPool;
use crate::error::StorageError;
use crate::schema::{CandidateProfile, Evidence, ExtractionResult, JobRequirements};

/// A persisted extraction with its provenance.
#[derive(Debug, Clone)]
pub struct ExtractionRecord {
    /// Owning candidate.
    pub candidate_id: String,
    /// The validated extraction payload.
    pub result: ExtractionResult,
    /// Model identifier that produced it.
    pub llm_model: String,
    /// Extraction schema/prompt version label.
    pub extract_version: String,
}

#[derive(sqlx::FromRow)]
struct ExtractionRow {
    candidate_id: String,
    job_requirements_json: String,
    candidate_profile_json: String,
    evidence_json: String,
    llm_model: String,
    extract_version: String,
}

fn decode<T: serde::de::DeserializeOwned>(column: &str, raw: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw).map_err(|e| StorageError::CorruptRecord {
        column: column.to_string(),
        message: e.to_string(),
    })
}

fn encode<T: serde::Serialize>(column: &str, value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|e| StorageError::CorruptRecord {
        column: column.to_string(),
        message: e.to_string(),
    })
}

impl TryFrom<ExtractionRow> for ExtractionRecord {
    type Error = StorageError;

    fn try_from(row: ExtractionRow) -> Result<Self, Self::Error> {
        let job_requirements: JobRequirements =
            decode("job_requirements_json", &row.job_requirements_json)?;
        let candidate_profile: CandidateProfile =
            decode("candidate_profile_json", &row.candidate_profile_json)?;
        let evidence: Evidence = decode("evidence_json", &row.evidence_json)?;

        Ok(ExtractionRecord {
            candidate_id: row.candidate_id,
            result: ExtractionResult {
                job_requirements,
                candidate_profile,
                evidence,
            },
            llm_model: row.llm_model,
            extract_version: row.extract_version,
        })
    }
}

/// Fetch the extraction for a candidate.
pub async fn get(
    pool: &DbPool,
    candidate_id: &str,
) -> Result<Option<ExtractionRecord>, StorageError> {
    let row: Option<ExtractionRow> = sqlx::query_as(
        "SELECT candidate_id, job_requirements_json, candidate_profile_json, evidence_json, \
         llm_model, extract_version \
         FROM extractions WHERE candidate_id = ?",
    )
    .bind(candidate_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    row.map(ExtractionRecord::try_from).transpose()
}

/// Insert or overwrite the extraction for a candidate.
pub async fn upsert(
    pool: &DbPool,
    candidate_id: &str,
    result: &ExtractionResult,
    llm_model: &str,
    extract_version: &str,
) -> Result<(), StorageError> {
    let job_requirements = encode("job_requirements_json", &result.job_requirements)?;
    let candidate_profile = encode("candidate_profile_json", &result.candidate_profile)?;
    let evidence = encode("evidence_json", &result.evidence)?;

    sqlx::query(
        "INSERT INTO extractions \
         (candidate_id, job_requirements_json, candidate_profile_json, evidence_json, llm_model, extract_version, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, strftime('%Y-%m-%dT%H:%M:%SZ', 'now')) \
         ON CONFLICT(candidate_id) DO UPDATE SET \
            job_requirements_json = excluded.job_requirements_json, \
            candidate_profile_json = excluded.candidate_profile_json, \
            evidence_json = excluded.evidence_json, \
            llm_model = excluded.llm_model, \
            extract_version = excluded.extract_version, \
            updated_at = excluded.updated_at",
    )
    .bind(candidate_id)
    .bind(job_requirements)
    .bind(candidate_profile)
    .bind(evidence)
    .bind(llm_model)
    .bind(extract_version)
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(())
}

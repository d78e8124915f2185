//! Candidate document records.
//!
//! Raw bytes and extracted text live in blob storage; rows here hold the
//! URIs. `text_uri` is written by the text-extraction stage.

use super::DbPool;
use crate::error::StorageError;

/// One uploaded document for a candidate.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Document {
    /// Unique identifier.
    pub document_id: String,
    /// Owning candidate.
    pub candidate_id: String,
    /// Document kind label (resume, cv, cover_letter).
    pub doc_type: String,
    /// Filename as uploaded, used for extension fallback when sniffing.
    pub original_filename: String,
    /// Blob URI of the raw bytes.
    pub object_uri: String,
    /// Blob URI of the extracted plain text, once available.
    pub text_uri: Option<String>,
}

const SELECT_COLS: &str =
    "document_id, candidate_id, doc_type, original_filename, object_uri, text_uri";

/// All documents for a candidate, oldest first.
pub async fn list_for_candidate(
    pool: &DbPool,
    candidate_id: &str,
) -> Result<Vec<Document>, StorageError> {
    let sql = format!(
        "SELECT {SELECT_COLS} FROM documents WHERE candidate_id = ? ORDER BY created_at ASC, rowid ASC"
    );
    sqlx::query_as(&sql)
        .bind(candidate_id)
        .fetch_all(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })
}

/// Documents for a candidate that already have extracted text, oldest first.
pub async fn list_with_text(
    pool: &DbPool,
    candidate_id: &str,
) -> Result<Vec<Document>, StorageError> {
    let sql = format!(
        "SELECT {SELECT_COLS} FROM documents \
         WHERE candidate_id = ? AND text_uri IS NOT NULL \
         ORDER BY created_at ASC, rowid ASC"
    );
    sqlx::query_as(&sql)
        .bind(candidate_id)
        .fetch_all(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })
}

/// Record the extracted-text URI for a document.
pub async fn set_text_uri(
    pool: &DbPool,
    document_id: &str,
    text_uri: &str,
) -> Result<(), StorageError> {
    sqlx::query("UPDATE documents SET text_uri = ? WHERE document_id = ?")
        .bind(text_uri)
        .bind(document_id)
        .execute(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })?;

    Ok(())
}

/// Insert a document row. Used by seeding and tests; the HTTP layer owns
/// uploads in production.
pub async fn insert(pool: &DbPool, doc: &Document) -> Result<(), StorageError> {
    sqlx::query(
        "INSERT INTO documents (document_id, candidate_id, doc_type, original_filename, object_uri, text_uri) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&doc.document_id)
    .bind(&doc.candidate_id)
    .bind(&doc.doc_type)
    .bind(&doc.original_filename)
    .bind(&doc.object_uri)
    .bind(&doc.text_uri)
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

    fn doc(id: &str, filename: &str) -> Document {
        Document {
            document_id: id.to_string(),
            candidate_id: "c1".to_string(),
            doc_type: "resume".to_string(),
            original_filename: filename.to_string(),
            object_uri: format!("raw/{id}.pdf"),
            text_uri: None,
        }
    }

    #[tokio::test]
    async fn list_and_update_text_uri() {
        let pool = init_test_db().await.expect("db");
        seed(&pool).await;

        insert(&pool, &doc("d1", "resume.pdf")).await.expect("insert");
        insert(&pool, &doc("d2", "cover.docx")).await.expect("insert");

        let docs = list_for_candidate(&pool, "c1").await.expect("list");
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].document_id, "d1");

        assert!(list_with_text(&pool, "c1").await.expect("list").is_empty());

        set_text_uri(&pool, "d1", "text/c1_x.txt").await.expect("set");
        let with_text = list_with_text(&pool, "c1").await.expect("list");
        assert_eq!(with_text.len(), 1);
        assert_eq!(with_text[0].text_uri.as_deref(), Some("text/c1_x.txt"));
    }
}

//! End-to-end pipeline tests against an in-memory database, an in-memory
//! blob store, and a mocked LLM provider.

use super::runner::Runner;
use super::{run_stage, PipelineContext};
use crate::blobstore::{BlobStore, MemoryBlobStore};
use crate::config::WorkerConfig;
use crate::error::{BlobError, LlmError};
use crate::llm::{GenerationParams, LlmClient};
use crate::storage::queue::{self, Stage};
use crate::storage::{
    candidates, documents, embeddings, explanations, extractions, init_test_db, score_config,
    scores, DbPool,
};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use zip::write::SimpleFileOptions;

/// Mock provider returning canned extraction/explanation JSON and unit
/// vectors so nice similarity comes out as 1.0.
struct MockLlm;

#[async_trait::async_trait]
impl LlmClient for MockLlm {
    fn model(&self) -> &str {
        "mock-model"
    }

    async fn extract_json(
        &self,
        system: &str,
        _user: &str,
        _params: &GenerationParams,
    ) -> Result<serde_json::Value, LlmError> {
        if system.contains("information extraction engine") {
            Ok(serde_json::json!({
                "job_requirements": {
                    "must": [
                        {"id": "m1", "text": "Python experience required", "skill_tags": ["Python"]}
                    ],
                    "nice": [
                        {"id": "n1", "text": "AWS experience preferred", "skill_tags": ["AWS"]}
                    ],
                    "role_expectation": "IC",
                    "year_requirements": {"Python": 3}
                },
                "candidate_profile": {
                    "skills": ["Python", "JavaScript"],
                    "roles": ["IC"],
                    "experience_years": {"Python": 5},
                    "highlights": ["5 years of Python development"],
                    "concerns": [],
                    "unknowns": ["AWS experience unclear"]
                },
                "evidence": {
                    "job": {"must:m1": "Python experience required"},
                    "candidate": {"skill:Python": "5 years of Python development"}
                }
            }))
        } else {
            Ok(serde_json::json!({
                "summary": "Strong Python candidate with relevant experience.",
                "strengths": ["5 years Python experience"],
                "concerns": ["AWS experience unclear"],
                "unknowns": ["Team collaboration style"],
                "must_gaps": []
            }))
        }
    }

    async fn embed_one(&self, _text: &str) -> Result<Vec<f32>, LlmError> {
        Ok(vec![1.0, 0.0, 0.0])
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0]).collect())
    }
}

/// Blob store whose first read fails, simulating a transient storage error.
struct FlakyBlobStore {
    inner: MemoryBlobStore,
    fail_next_read: AtomicBool,
}

#[async_trait::async_trait]
impl BlobStore for FlakyBlobStore {
    async fn read(&self, uri: &str) -> Result<Vec<u8>, BlobError> {
        if self.fail_next_read.swap(false, Ordering::SeqCst) {
            return Err(BlobError::Io {
                uri: uri.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "injected failure"),
            });
        }
        self.inner.read(uri).await
    }

    async fn read_text(&self, uri: &str) -> Result<String, BlobError> {
        self.inner.read_text(uri).await
    }

    async fn write_raw(&self, ext: &str, bytes: &[u8]) -> Result<String, BlobError> {
        self.inner.write_raw(ext, bytes).await
    }

    async fn write_text(&self, candidate_id: &str, content: &str) -> Result<String, BlobError> {
        self.inner.write_text(candidate_id, content).await
    }

    async fn write_evidence(
        &self,
        candidate_id: &str,
        content: &str,
    ) -> Result<String, BlobError> {
        self.inner.write_evidence(candidate_id, content).await
    }
}

/// Minimal .docx with a single paragraph.
fn docx_bytes(text: &str) -> Vec<u8> {
    let document_xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body><w:p><w:r><w:t>{text}</w:t></w:r></w:p></w:body></w:document>"
    );
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut cursor);
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .expect("start file");
        writer
            .write_all(document_xml.as_bytes())
            .expect("write xml");
        writer.finish().expect("finish archive");
    }
    cursor.into_inner()
}

async fn seed_job_and_candidate(pool: &DbPool) {
    sqlx::query("INSERT INTO jobs (job_id, title, job_text_raw) VALUES ('j1', 'Backend Engineer', 'Python experience required. AWS preferred.')")
        .execute(pool)
        .await
        .expect("seed job");
    sqlx::query("INSERT INTO candidates (candidate_id, job_id, display_name) VALUES ('c1', 'j1', 'Ada')")
        .execute(pool)
        .await
        .expect("seed candidate");
}

async fn seed_document(pool: &DbPool, blobs: &dyn BlobStore) {
    let object_uri = blobs
        .write_raw(".docx", &docx_bytes("Ada has 5 years of Python development."))
        .await
        .expect("store raw");
    documents::insert(
        pool,
        &documents::Document {
            document_id: "d1".to_string(),
            candidate_id: "c1".to_string(),
            doc_type: "resume".to_string(),
            original_filename: "resume.docx".to_string(),
            object_uri,
            text_uri: None,
        },
    )
    .await
    .expect("insert document");
}

async fn test_context(blobs: Arc<dyn BlobStore>) -> PipelineContext {
    let pool = init_test_db().await.expect("db");
    seed_job_and_candidate(&pool).await;
    score_config::insert_default(&pool).await.expect("config");
    PipelineContext {
        pool,
        blobs,
        llm: Arc::new(MockLlm),
        worker: WorkerConfig::default(),
    }
}

/// Drain the queue, bounded so a broken successor chain cannot hang the test.
async fn drain(runner: &Runner) -> usize {
    let mut processed = 0;
    for _ in 0..10 {
        match runner.run_once().await.expect("run_once") {
            Some(_) => processed += 1,
            None => break,
        }
    }
    processed
}

#[tokio::test]
async fn pipeline_runs_candidate_to_done() {
    let blobs = Arc::new(MemoryBlobStore::new());
    let ctx = test_context(blobs).await;
    seed_document(&ctx.pool, ctx.blobs.as_ref()).await;
    let runner = Runner::new(ctx.clone());

    queue::enqueue(&ctx.pool, "c1", Stage::TextExtract).await.expect("enqueue");

    // After the first stage the candidate must be in flight.
    runner.run_once().await.expect("run_once").expect("leased item");
    let candidate = candidates::get(&ctx.pool, "c1").await.expect("get").expect("row");
    assert_eq!(candidate.status, "PROCESSING");

    let processed = drain(&runner).await;
    assert_eq!(processed, 4); // remaining four stages

    let candidate = candidates::get(&ctx.pool, "c1").await.expect("get").expect("row");
    assert_eq!(candidate.status, "DONE");
    assert!(candidate.error_message.is_none());

    // All five stages ran exactly once and the chain stopped.
    let stats = queue::stats(&ctx.pool).await.expect("stats");
    assert_eq!(stats.done, 5);
    assert_eq!(stats.ready, 0);
    assert_eq!(stats.failed, 0);

    // Projected records exist exactly once each.
    let extraction = extractions::get(&ctx.pool, "c1").await.expect("get").expect("extraction");
    assert_eq!(extraction.llm_model, "mock-model");
    assert_eq!(extraction.extract_version, "v1");

    let score = scores::get(&ctx.pool, "c1").await.expect("get").expect("score");
    assert_eq!(score.breakdown.must_score, 1.0);
    assert_eq!(score.breakdown.year_score, 1.0);
    assert_eq!(score.breakdown.role_score, 1.0);
    assert!((score.breakdown.nice_score - 1.0).abs() < 1e-9);
    assert_eq!(score.breakdown.total_fit_0_100, 100);
    assert!(score.breakdown.must_gaps.is_empty());
    assert_eq!(score.score_config_version, 1);

    let explanation = explanations::get(&ctx.pool, "c1").await.expect("get").expect("explanation");
    assert!(explanation.summary.contains("Python"));

    // The document row now points at its extracted text.
    let docs = documents::list_with_text(&ctx.pool, "c1").await.expect("docs");
    assert_eq!(docs.len(), 1);
    let text = ctx
        .blobs
        .read_text(docs[0].text_uri.as_deref().expect("text uri"))
        .await
        .expect("read text");
    assert!(text.contains("5 years of Python development"));
}

#[tokio::test]
async fn transient_failure_retries_then_succeeds() {
    let blobs = Arc::new(FlakyBlobStore {
        inner: MemoryBlobStore::new(),
        fail_next_read: AtomicBool::new(true),
    });
    let ctx = test_context(blobs).await;
    seed_document(&ctx.pool, ctx.blobs.as_ref()).await;
    let runner = Runner::new(ctx.clone());

    let queue_id = queue::enqueue(&ctx.pool, "c1", Stage::TextExtract).await.expect("enqueue");

    // First attempt hits the injected storage failure.
    runner.run_once().await.expect("run_once").expect("leased item");
    let item = queue::get(&ctx.pool, &queue_id).await.expect("get").expect("item");
    assert_eq!(item.status, "FAILED");
    assert_eq!(item.attempts, 1);
    assert!(item.last_error.as_deref().expect("error").contains("injected failure"));

    // Below max retries the candidate is not errored.
    let candidate = candidates::get(&ctx.pool, "c1").await.expect("get").expect("row");
    assert_eq!(candidate.status, "PROCESSING");

    // Operator retries; second attempt succeeds and advances the pipeline.
    assert!(queue::retry(&ctx.pool, &queue_id).await.expect("retry"));
    runner.run_once().await.expect("run_once").expect("leased item");

    let item = queue::get(&ctx.pool, &queue_id).await.expect("get").expect("item");
    assert_eq!(item.status, "DONE");
    assert_eq!(item.attempts, 2);

    let stats = queue::stats(&ctx.pool).await.expect("stats");
    assert_eq!(stats.ready, 1); // LLM_EXTRACT enqueued
}

#[tokio::test]
async fn exhausted_retries_project_error_onto_candidate() {
    let blobs = Arc::new(MemoryBlobStore::new());
    let ctx = test_context(blobs).await;
    // No documents seeded: TEXT_EXTRACT fails with missing input every time.
    let runner = Runner::new(ctx.clone());

    let queue_id = queue::enqueue(&ctx.pool, "c1", Stage::TextExtract).await.expect("enqueue");

    for attempt in 1..=3 {
        runner.run_once().await.expect("run_once").expect("leased item");
        let item = queue::get(&ctx.pool, &queue_id).await.expect("get").expect("item");
        assert_eq!(item.status, "FAILED");
        assert_eq!(item.attempts, attempt);
        if attempt < 3 {
            let candidate = candidates::get(&ctx.pool, "c1").await.expect("get").expect("row");
            assert_eq!(candidate.status, "PROCESSING");
            assert!(queue::retry(&ctx.pool, &queue_id).await.expect("retry"));
        }
    }

    let candidate = candidates::get(&ctx.pool, "c1").await.expect("get").expect("row");
    assert_eq!(candidate.status, "ERROR");
    assert!(candidate
        .error_message
        .as_deref()
        .expect("message")
        .contains("missing input"));
}

#[tokio::test]
async fn missing_score_config_is_fatal_immediately() {
    let pool = init_test_db().await.expect("db");
    seed_job_and_candidate(&pool).await;
    let ctx = PipelineContext {
        pool,
        blobs: Arc::new(MemoryBlobStore::new()),
        llm: Arc::new(MockLlm),
        worker: WorkerConfig::default(),
    };
    let runner = Runner::new(ctx.clone());

    // A valid extraction exists, but no score config row.
    let extraction = crate::schema::ExtractionResult::default();
    extractions::upsert(&ctx.pool, "c1", &extraction, "mock-model", "v1")
        .await
        .expect("upsert");

    let queue_id = queue::enqueue(&ctx.pool, "c1", Stage::Score).await.expect("enqueue");
    runner.run_once().await.expect("run_once").expect("leased item");

    let item = queue::get(&ctx.pool, &queue_id).await.expect("get").expect("item");
    assert_eq!(item.status, "FAILED");
    assert!(item.last_error.as_deref().expect("error").contains("no score config"));

    // Fatal on the first attempt, not only after max retries.
    let candidate = candidates::get(&ctx.pool, "c1").await.expect("get").expect("row");
    assert_eq!(candidate.status, "ERROR");
}

#[tokio::test]
async fn embed_score_and_explain_are_idempotent() {
    let blobs = Arc::new(MemoryBlobStore::new());
    let ctx = test_context(blobs).await;
    seed_document(&ctx.pool, ctx.blobs.as_ref()).await;
    let runner = Runner::new(ctx.clone());

    queue::enqueue(&ctx.pool, "c1", Stage::TextExtract).await.expect("enqueue");
    drain(&runner).await;

    let first_embeddings = embeddings::for_candidate(&ctx.pool, "c1").await.expect("load");
    let first_score = scores::get(&ctx.pool, "c1").await.expect("get").expect("score");
    let first_explanation = explanations::get(&ctx.pool, "c1").await.expect("get").expect("row");

    // Re-run the last three stages directly, twice each.
    for _ in 0..2 {
        run_stage(&ctx, Stage::Embed, "c1").await.expect("embed");
        run_stage(&ctx, Stage::Score, "c1").await.expect("score");
        run_stage(&ctx, Stage::Explain, "c1").await.expect("explain");
    }

    let second_embeddings = embeddings::for_candidate(&ctx.pool, "c1").await.expect("load");
    assert_eq!(second_embeddings.candidate, first_embeddings.candidate);
    assert_eq!(second_embeddings.nice, first_embeddings.nice);

    let second_score = scores::get(&ctx.pool, "c1").await.expect("get").expect("score");
    assert_eq!(second_score, first_score);

    let second_explanation = explanations::get(&ctx.pool, "c1").await.expect("get").expect("row");
    assert_eq!(second_explanation, first_explanation);

    let candidate = candidates::get(&ctx.pool, "c1").await.expect("get").expect("row");
    assert_eq!(candidate.status, "DONE");
}

#[tokio::test]
async fn unknown_job_type_fails_the_item() {
    let blobs = Arc::new(MemoryBlobStore::new());
    let ctx = test_context(blobs).await;
    let runner = Runner::new(ctx.clone());

    sqlx::query(
        "INSERT INTO jobs_queue (queue_id, candidate_id, job_type, status) \
         VALUES ('q-bad', 'c1', 'RESCORE', 'READY')",
    )
    .execute(&ctx.pool)
    .await
    .expect("insert bad item");

    runner.run_once().await.expect("run_once").expect("leased item");

    let item = queue::get(&ctx.pool, "q-bad").await.expect("get").expect("item");
    assert_eq!(item.status, "FAILED");
    assert!(item.last_error.as_deref().expect("error").contains("RESCORE"));
}

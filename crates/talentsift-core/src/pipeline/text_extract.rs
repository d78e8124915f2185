//! TEXT_EXTRACT stage: parse raw document bytes into plain text.

use super::PipelineContext;
use crate::error::StageError;
use crate::extract::{self, DocumentFormat};
use crate::storage::documents;

/// Extract text from every document of the candidate.
///
/// Each document's text is stored under a fresh text URI and recorded on
/// the document row; the labelled concatenation of all documents is stored
/// as a second artefact for the structured-extraction stage. The stage
/// fails when the candidate has no documents or none of them yields text.
pub async fn run(ctx: &PipelineContext, candidate_id: &str) -> Result<(), StageError> {
    tracing::info!(candidate_id, "starting text extraction");

    let docs = documents::list_for_candidate(&ctx.pool, candidate_id).await?;
    if docs.is_empty() {
        return Err(StageError::InputMissing {
            what: format!("documents for candidate {candidate_id}"),
        });
    }

    let mut combined_parts = Vec::new();

    for doc in &docs {
        let bytes = ctx.blobs.read(&doc.object_uri).await?;

        let Some(format) = extract::sniff_format(&bytes, &doc.original_filename) else {
            tracing::warn!(
                document_id = %doc.document_id,
                filename = %doc.original_filename,
                "unsupported document format, skipping"
            );
            continue;
        };

        let text = match format {
            DocumentFormat::Pdf => extract::pdf::extract_text(&bytes),
            DocumentFormat::Word => extract::word::extract_text(&bytes),
        };
        let text = match text {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(
                    document_id = %doc.document_id,
                    error = %e,
                    "failed to extract text from document"
                );
                continue;
            }
        };

        let text_uri = ctx.blobs.write_text(candidate_id, &text).await?;
        documents::set_text_uri(&ctx.pool, &doc.document_id, &text_uri).await?;

        combined_parts.push(format!("[{}]\n{text}", doc.doc_type.to_uppercase()));
        tracing::info!(document_id = %doc.document_id, chars = text.len(), "extracted document text");
    }

    if combined_parts.is_empty() {
        return Err(StageError::ParseFailure {
            message: "no text could be extracted from any document".to_string(),
        });
    }

    let combined = combined_parts.join("\n\n---\n\n");
    let combined_uri = ctx.blobs.write_text(candidate_id, &combined).await?;

    tracing::info!(candidate_id, combined_uri = %combined_uri, "text extraction completed");
    Ok(())
}

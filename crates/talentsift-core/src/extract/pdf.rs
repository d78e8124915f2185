//! PDF text extraction via lopdf.

use crate::error::ExtractError;

/// Extract plain text from PDF bytes, page by page.
///
/// Pages that fail to parse are skipped with a warning; the extraction
/// fails only when no page yields text.
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let document = lopdf::Document::load_mem(bytes).map_err(|e| ExtractError::Pdf {
        message: e.to_string(),
    })?;

    let mut parts = Vec::new();
    for page_number in document.get_pages().keys() {
        match document.extract_text(&[*page_number]) {
            Ok(text) if !text.trim().is_empty() => {
                parts.push(format!("--- Page {page_number} ---\n{text}"));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(page = page_number, error = %e, "skipping unreadable PDF page");
            }
        }
    }

    if parts.is_empty() {
        return Err(ExtractError::Empty);
    }

    Ok(parts.join("\n\n"))
}

//! Document text extraction.
//!
//! Format detection prefers content sniffing (magic bytes) and falls back
//! to the filename extension. Parsers produce plain text or a typed
//! [`ExtractError`](crate::error::ExtractError).

pub mod pdf;
pub mod word;

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// PDF document.
    Pdf,
    /// Word document (.docx; legacy .doc is attempted but usually fails).
    Word,
}

const PDF_MAGIC: &[u8] = b"%PDF-";
// A .docx file is a ZIP archive.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Detect a document's format from its bytes, falling back to the filename
/// extension. Returns `None` when neither identifies a supported format.
pub fn sniff_format(bytes: &[u8], filename: &str) -> Option<DocumentFormat> {
    if bytes.starts_with(PDF_MAGIC) {
        return Some(DocumentFormat::Pdf);
    }
    if bytes.starts_with(ZIP_MAGIC) {
        return Some(DocumentFormat::Word);
    }

    let extension = filename.rsplit('.').next()?.to_lowercase();
    match extension.as_str() {
        "pdf" => Some(DocumentFormat::Pdf),
        "docx" | "doc" => Some(DocumentFormat::Word),
        _ => None,
    }
}

//! Text extraction from uploaded documents.
//!
//! The live pipeline receives complaint and FRL uploads as raw PDF bytes and
//! needs the concatenated per-page text. Extraction is deterministic and has
//! no side effects; an empty text layer is not an error by itself (scanned
//! documents produce empty output and degrade later stages instead).

use thiserror::Error;
use tracing::debug;

/// Errors emitted while extracting text from a document.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("document is not a PDF (missing %PDF header)")]
    UnrecognisedFormat,

    #[error("failed to parse PDF document: {0}")]
    Pdf(#[from] pdf_extract::OutputError),
}

/// Converts a binary document into plain text.
///
/// The pipeline depends on this trait so tests can feed synthetic documents
/// without building real PDFs.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError>;
}

/// PDF text extractor backed by the pure-Rust `pdf-extract` crate.
///
/// Returns the concatenation of per-page text in document order.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        if !bytes.starts_with(b"%PDF") {
            return Err(ExtractError::UnrecognisedFormat);
        }
        let text = pdf_extract::extract_text_from_mem(bytes)?;
        debug!(bytes = bytes.len(), chars = text.len(), "extracted pdf text");
        Ok(text)
    }
}

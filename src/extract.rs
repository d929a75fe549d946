//! Text extraction collaborator.
//!
//! The pipeline treats extraction as an opaque service behind the
//! [`TextExtractor`] trait; the production implementation wraps `pdf-extract`.
//! Tests substitute a stub so pipeline behavior can be exercised without
//! real documents.

use crate::error::PipelineError;

/// Pulls plain text out of an uploaded document's bytes.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, PipelineError>;
}

/// PDF text extraction via `pdf-extract`.
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, PipelineError> {
        pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| PipelineError::ExtractionFailure(e.to_string()))
    }
}

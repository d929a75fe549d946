//! Typed errors for the content pipeline.
//!
//! The decoder and chunker only fail on structurally invalid input; downstream
//! service failures are wrapped by the orchestrator into a single error.
//! Context selection never fails (no match degrades to an empty string).

/// Error raised by the upload-processing pipeline.
#[derive(Debug)]
pub enum PipelineError {
    /// Missing or unparseable multipart boundary, or no file part present.
    MalformedRequest(String),
    /// Text extraction (or staging the upload for extraction) failed.
    ExtractionFailure(String),
    /// The embedding service rejected a chunk or became unreachable.
    EmbeddingFailure(String),
    /// A required field was empty or missing.
    InvalidInput(String),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::MalformedRequest(e) => write!(f, "malformed request: {}", e),
            PipelineError::ExtractionFailure(e) => write!(f, "text extraction failed: {}", e),
            PipelineError::EmbeddingFailure(e) => write!(f, "embedding generation failed: {}", e),
            PipelineError::InvalidInput(e) => write!(f, "invalid input: {}", e),
        }
    }
}

impl std::error::Error for PipelineError {}

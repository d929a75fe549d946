//! Upload-processing pipeline orchestration.
//!
//! Sequences the full flow for one uploaded document: multipart decode →
//! stage bytes to a temp file → text extraction → code-snippet extraction →
//! chunking → per-chunk embedding. Any downstream failure aborts the request;
//! partial results are never returned.
//!
//! External collaborators are injected at construction so the application
//! entry point owns their lifecycle and tests can substitute stubs.

use tracing::info;

use crate::chunk::chunk_text;
use crate::context;
use crate::embedding::EmbeddingService;
use crate::error::PipelineError;
use crate::extract::TextExtractor;
use crate::models::{Chunk, MultipartPart, ProcessedDocument, Question};
use crate::multipart;
use crate::snippets::extract_code_snippets;

/// Name of the multipart field carrying the uploaded document.
const UPLOAD_FIELD: &str = "pdf";

pub struct ContentPipeline {
    extractor: Box<dyn TextExtractor>,
    embeddings: Box<dyn EmbeddingService>,
    /// Chunk token budget (1 token ≈ 4 characters).
    max_tokens: usize,
}

impl ContentPipeline {
    pub fn new(
        extractor: Box<dyn TextExtractor>,
        embeddings: Box<dyn EmbeddingService>,
        max_tokens: usize,
    ) -> Self {
        Self {
            extractor,
            embeddings,
            max_tokens,
        }
    }

    /// Process one uploaded document from a raw multipart body.
    ///
    /// `content_type` is the request's `Content-Type` header value; the
    /// boundary is parsed from it. The body must contain a file part named
    /// `pdf`.
    pub async fn process_upload(
        &self,
        body: &[u8],
        content_type: &str,
    ) -> Result<ProcessedDocument, PipelineError> {
        let boundary = multipart::parse_boundary(content_type)?;
        let parts = multipart::parse_multipart(body, &boundary);
        let file = find_upload(&parts).ok_or_else(|| {
            PipelineError::MalformedRequest("no PDF file provided".to_string())
        })?;
        info!(
            filename = file.filename.as_deref().unwrap_or(""),
            bytes = file.data.len(),
            "upload received"
        );

        // Stage to a temp file scoped to this request: write once, read once.
        // The file is removed when the handle drops.
        let staged = stage_upload(&file.data)?;
        let bytes = std::fs::read(staged.path())
            .map_err(|e| PipelineError::ExtractionFailure(e.to_string()))?;

        self.process_bytes(&bytes).await
    }

    /// Extract, scan, chunk, and embed a document already in memory.
    pub async fn process_bytes(&self, bytes: &[u8]) -> Result<ProcessedDocument, PipelineError> {
        if bytes.is_empty() {
            return Err(PipelineError::InvalidInput("empty document".to_string()));
        }

        let text = self.extractor.extract_text(bytes)?;
        info!(chars = text.len(), "text extracted");

        let code_snippets = extract_code_snippets(&text);
        info!(count = code_snippets.len(), "code snippets extracted");

        let mut chunks = chunk_text(&text, self.max_tokens);
        for chunk in &mut chunks {
            let vector = self
                .embeddings
                .embed(&chunk.text)
                .await
                .map_err(|e| PipelineError::EmbeddingFailure(e.to_string()))?;
            chunk.embedding = Some(vector);
        }
        info!(
            chunks = chunks.len(),
            model = self.embeddings.model_name(),
            "embeddings generated"
        );

        Ok(ProcessedDocument {
            text,
            code_snippets,
            chunks,
        })
    }

    /// Pick the chunk most relevant to a question/answer pair. Never fails;
    /// no match degrades to an empty string.
    pub fn select_context(
        &self,
        question: &Question,
        user_answer: &str,
        chunks: &[Chunk],
    ) -> String {
        context::select_context(question, user_answer, chunks)
    }
}

fn find_upload(parts: &[MultipartPart]) -> Option<&MultipartPart> {
    parts
        .iter()
        .find(|p| p.name == UPLOAD_FIELD && p.filename.is_some())
}

fn stage_upload(data: &[u8]) -> Result<tempfile::NamedTempFile, PipelineError> {
    let mut file =
        tempfile::NamedTempFile::new().map_err(|e| PipelineError::ExtractionFailure(e.to_string()))?;
    std::io::Write::write_all(&mut file, data)
        .map_err(|e| PipelineError::ExtractionFailure(e.to_string()))?;
    Ok(file)
}

//! End-to-end pipeline tests over stub collaborators.
//!
//! The extractor and embedder are swapped for in-process stubs so the full
//! decode → extract → snippet → chunk → embed flow runs without documents or
//! network access. One test exercises the real PDF extractor against a
//! hand-built minimal PDF.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use quizgen::embedding::EmbeddingService;
use quizgen::error::PipelineError;
use quizgen::extract::{PdfTextExtractor, TextExtractor};
use quizgen::pipeline::ContentPipeline;

/// Treats the uploaded bytes as the document text itself.
struct PassThroughExtractor;

impl TextExtractor for PassThroughExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, PipelineError> {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| PipelineError::ExtractionFailure(e.to_string()))
    }
}

/// Always fails, to test extraction error propagation.
struct BrokenExtractor;

impl TextExtractor for BrokenExtractor {
    fn extract_text(&self, _bytes: &[u8]) -> Result<String, PipelineError> {
        Err(PipelineError::ExtractionFailure("scanner jammed".to_string()))
    }
}

/// Returns a vector derived from the chunk text so tests can verify that
/// embeddings index-align with chunk order.
struct CountingEmbedder {
    calls: Arc<AtomicUsize>,
}

impl CountingEmbedder {
    fn new() -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl EmbeddingService for CountingEmbedder {
    fn model_name(&self) -> &str {
        "counting-stub"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![text.len() as f32])
    }
}

/// Fails on the first call, to test fail-fast behavior.
struct BrokenEmbedder;

#[async_trait]
impl EmbeddingService for BrokenEmbedder {
    fn model_name(&self) -> &str {
        "broken-stub"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        anyhow::bail!("embedding backend unreachable")
    }
}

fn upload_body(boundary: &str, filename: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"pdf\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

fn twenty_thousand_chars() -> String {
    let text = "lorem ipsum dolor sit amet ".repeat(741);
    text[..20_000].to_string()
}

/// Minimal one-page PDF shaped like a tutorial excerpt: a heading line plus
/// a body line on an A5 page. Builds the body then an xref table with
/// correct byte offsets so pdf-extract can parse it.
fn minimal_tutorial_pdf() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let o1 = out.len();
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
    let o2 = out.len();
    out.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
    let o3 = out.len();
    out.extend_from_slice(b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 420 595] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj\n");
    let o4 = out.len();
    let content = b"BT /F1 11 Tf 48 520 Td (tutorial test phrase) Tj 0 -16 Td (covering loops and functions) Tj ET";
    out.extend_from_slice(format!("4 0 obj << /Length {} >> stream\n", content.len()).as_bytes());
    out.extend_from_slice(content);
    out.extend_from_slice(b"\nendstream endobj\n");
    let o5 = out.len();
    out.extend_from_slice(
        b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
    );
    let xref_start = out.len();
    out.extend_from_slice(b"xref\n0 6\n");
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    out.extend_from_slice(format!("{:010} 00000 n \n", o1).as_bytes());
    out.extend_from_slice(format!("{:010} 00000 n \n", o2).as_bytes());
    out.extend_from_slice(format!("{:010} 00000 n \n", o3).as_bytes());
    out.extend_from_slice(format!("{:010} 00000 n \n", o4).as_bytes());
    out.extend_from_slice(format!("{:010} 00000 n \n", o5).as_bytes());
    out.extend_from_slice(b"trailer << /Size 6 /Root 1 0 R >>\nstartxref\n");
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}

fn stub_pipeline(max_tokens: usize) -> (ContentPipeline, Arc<AtomicUsize>) {
    let (embedder, calls) = CountingEmbedder::new();
    let pipeline = ContentPipeline::new(
        Box::new(PassThroughExtractor),
        Box::new(embedder),
        max_tokens,
    );
    (pipeline, calls)
}

#[tokio::test]
async fn large_document_fits_one_chunk_at_default_budget() {
    let text = twenty_thousand_chars();
    let body = upload_body("X", "tutorial.txt", text.as_bytes());
    let (pipeline, calls) = stub_pipeline(8000);

    let document = pipeline
        .process_upload(&body, "multipart/form-data; boundary=X")
        .await
        .unwrap();

    assert_eq!(document.text, text);
    assert_eq!(document.chunks.len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn smaller_budget_splits_into_five_chunks_round_trip() {
    let text = twenty_thousand_chars();
    let body = upload_body("X", "tutorial.txt", text.as_bytes());
    let (pipeline, calls) = stub_pipeline(1000);

    let document = pipeline
        .process_upload(&body, "multipart/form-data; boundary=X")
        .await
        .unwrap();

    assert_eq!(document.chunks.len(), 5);
    let reassembled: String = document.chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(reassembled, text);
    assert_eq!(calls.load(Ordering::SeqCst), 5);

    // Embeddings index-align with chunk order.
    for chunk in &document.chunks {
        let embedding = chunk.embedding.as_ref().unwrap();
        assert_eq!(embedding[0], chunk.text.len() as f32);
    }
}

#[tokio::test]
async fn code_snippets_survive_the_pipeline() {
    let text = "Intro.\n```python\ndef greet(name):\n    print(name)\n```\nOutro.";
    let body = upload_body("B", "snip.txt", text.as_bytes());
    let (pipeline, _) = stub_pipeline(8000);

    let document = pipeline
        .process_upload(&body, "multipart/form-data; boundary=B")
        .await
        .unwrap();

    assert_eq!(document.code_snippets.len(), 1);
    assert!(document.code_snippets[0].contains("def greet(name):"));
}

#[tokio::test]
async fn missing_boundary_is_malformed_request() {
    let (pipeline, _) = stub_pipeline(8000);
    let err = pipeline
        .process_upload(b"irrelevant", "multipart/form-data")
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::MalformedRequest(_)));
}

#[tokio::test]
async fn missing_file_part_is_malformed_request() {
    let body =
        b"--X\r\nContent-Disposition: form-data; name=\"difficulty\"\r\n\r\nhard\r\n--X--\r\n";
    let (pipeline, _) = stub_pipeline(8000);
    let err = pipeline
        .process_upload(body, "multipart/form-data; boundary=X")
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::MalformedRequest(_)));
}

#[tokio::test]
async fn extraction_failure_aborts_the_request() {
    let (embedder, calls) = CountingEmbedder::new();
    let pipeline = ContentPipeline::new(Box::new(BrokenExtractor), Box::new(embedder), 8000);

    let body = upload_body("X", "doc.pdf", b"whatever bytes");
    let err = pipeline
        .process_upload(&body, "multipart/form-data; boundary=X")
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::ExtractionFailure(_)));
    // Nothing downstream ran.
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn embedding_failure_aborts_with_no_partial_result() {
    let pipeline = ContentPipeline::new(
        Box::new(PassThroughExtractor),
        Box::new(BrokenEmbedder),
        1000,
    );

    let text = twenty_thousand_chars();
    let body = upload_body("X", "doc.txt", text.as_bytes());
    let err = pipeline
        .process_upload(&body, "multipart/form-data; boundary=X")
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::EmbeddingFailure(_)));
}

#[tokio::test]
async fn empty_upload_is_invalid_input() {
    let body = upload_body("X", "empty.pdf", b"");
    let (pipeline, _) = stub_pipeline(8000);
    let err = pipeline
        .process_upload(&body, "multipart/form-data; boundary=X")
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidInput(_)));
}

#[tokio::test]
async fn real_pdf_extraction_flows_through() {
    let (embedder, _) = CountingEmbedder::new();
    let pipeline = ContentPipeline::new(Box::new(PdfTextExtractor), Box::new(embedder), 8000);

    let body = upload_body("pdfbound", "tutorial.pdf", &minimal_tutorial_pdf());
    let document = pipeline
        .process_upload(&body, "multipart/form-data; boundary=pdfbound")
        .await
        .unwrap();

    assert!(document.text.contains("tutorial test phrase"));
    assert!(document.text.contains("covering loops and functions"));
    assert_eq!(document.chunks.len(), 1);
    assert!(document.chunks[0].embedding.is_some());
}

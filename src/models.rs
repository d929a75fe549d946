//! Core data models used throughout quizgen.
//!
//! These types represent the uploaded documents, chunks, and quiz questions
//! that flow through the processing and answer-checking pipeline. JSON-facing
//! types use the camelCase field names of the HTTP API.

use serde::{Deserialize, Serialize};

/// One part of a decoded multipart/form-data body.
///
/// A part with a `filename` is a file upload and its `data` stays binary;
/// a part without one is a plain form field (callers decode `data` as UTF-8).
#[derive(Debug, Clone)]
pub struct MultipartPart {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// A contiguous slice of document text bounded by an approximate token budget.
///
/// Concatenating all chunks of a document in `index` order reproduces the
/// extracted text exactly. The embedding is attached by the pipeline once the
/// external embedding service has been called.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Defaults to 0 on deserialization: clients replaying a processed
    /// document send only `text` and `embedding`.
    #[serde(default)]
    pub index: usize,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// Result of processing one uploaded document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedDocument {
    /// Full extracted text.
    pub text: String,
    /// Deduplicated code snippets found in the text.
    pub code_snippets: Vec<String>,
    /// Ordered chunks, each carrying its embedding.
    pub chunks: Vec<Chunk>,
}

/// A quiz question, as produced by generation and consumed by answer checking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "type", default)]
    pub question_type: String,
    #[serde(default)]
    pub question_number: u32,
    #[serde(default)]
    pub question_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// Chunk of source material the question was generated from. When set,
    /// context selection returns it directly without scoring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_chunk: Option<String>,
}

/// Verdict on a user's answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerFeedback {
    pub is_correct: bool,
    pub percent_correct: f64,
    pub explanation: String,
}

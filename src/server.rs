//! HTTP API server.
//!
//! Exposes the content pipeline and quiz engine as a JSON HTTP API for the
//! quiz front end.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/process-pdf` | Upload a PDF (multipart), get text + snippets + embedded chunks |
//! | `POST` | `/generate-questions` | Generate quiz questions from processed chunks |
//! | `POST` | `/check-answer` | Check a user's answer against a question |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses share one schema:
//!
//! ```json
//! { "error": { "code": "malformed_request", "message": "no boundary found in content-type" } }
//! ```
//!
//! Error codes: `malformed_request` (400), `invalid_input` (400),
//! `extraction_failed` (500), `embedding_failed` (500), `internal` (500).
//!
//! The upload body is read raw and fed through the crate's own multipart
//! decoder; axum's multipart extractor is not used.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::completion::{create_completion_service, CompletionService};
use crate::config::Config;
use crate::embedding::create_embedding_service;
use crate::error::PipelineError;
use crate::extract::PdfTextExtractor;
use crate::models::{Chunk, ProcessedDocument, Question};
use crate::pipeline::ContentPipeline;
use crate::quiz;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    pipeline: Arc<ContentPipeline>,
    completion: Arc<dyn CompletionService>,
    config: Arc<Config>,
}

/// Starts the HTTP server.
///
/// Builds the pipeline and its collaborators from configuration, binds to
/// `[server].bind`, and runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let embeddings = create_embedding_service(&config.embedding)?;
    let completion: Arc<dyn CompletionService> =
        Arc::from(create_completion_service(&config.completion)?);

    let pipeline = ContentPipeline::new(
        Box::new(PdfTextExtractor),
        embeddings,
        config.chunking.max_tokens,
    );

    let state = AppState {
        pipeline: Arc::new(pipeline),
        completion,
        config: Arc::new(config.clone()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/process-pdf", post(handle_process_pdf))
        .route("/generate-questions", post(handle_generate_questions))
        .route("/check-answer", post(handle_check_answer))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(config.server.max_upload_bytes))
        .layer(cors)
        .with_state(state);

    let bind_addr = &config.server.bind;
    info!(addr = %bind_addr, "quizgen server listening");

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let (status, code) = match &err {
            PipelineError::MalformedRequest(_) => (StatusCode::BAD_REQUEST, "malformed_request"),
            PipelineError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            PipelineError::ExtractionFailure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "extraction_failed")
            }
            PipelineError::EmbeddingFailure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "embedding_failed")
            }
        };
        AppError {
            status,
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

fn invalid_input(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "invalid_input".to_string(),
        message: message.into(),
    }
}

fn internal_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /process-pdf ============

/// Handler for `POST /process-pdf`.
///
/// Reads the raw multipart body, decodes it with the crate's own decoder,
/// and runs the full pipeline. Returns the extracted text, code snippets,
/// and embedded chunks.
async fn handle_process_pdf(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ProcessedDocument>, AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let document = state.pipeline.process_upload(&body, content_type).await?;
    Ok(Json(document))
}

// ============ POST /generate-questions ============

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateQuestionsRequest {
    /// Chunks from a prior `/process-pdf` call. Older clients send this
    /// field as `embeddings`; both names are accepted.
    #[serde(alias = "embeddings")]
    chunks: Vec<Chunk>,
    #[serde(default)]
    code_snippets: Vec<String>,
    #[serde(default)]
    count: Option<usize>,
    #[serde(default)]
    difficulty: Option<String>,
}

#[derive(Serialize)]
struct GenerateQuestionsResponse {
    questions: Vec<Question>,
}

async fn handle_generate_questions(
    State(state): State<AppState>,
    Json(req): Json<GenerateQuestionsRequest>,
) -> Result<Json<GenerateQuestionsResponse>, AppError> {
    if req.chunks.is_empty() {
        return Err(invalid_input("Valid chunks are required"));
    }

    let count = req.count.unwrap_or(state.config.quiz.question_count);
    let difficulty = req
        .difficulty
        .unwrap_or_else(|| state.config.quiz.difficulty.clone());

    let mut rng = StdRng::from_entropy();
    let questions = quiz::generate_questions(
        state.completion.as_ref(),
        &mut rng,
        &req.chunks,
        &req.code_snippets,
        count,
        &difficulty,
    )
    .await
    .map_err(|e| internal_error(format!("Failed to generate questions: {}", e)))?;

    info!(count = questions.len(), "questions generated");
    Ok(Json(GenerateQuestionsResponse { questions }))
}

// ============ POST /check-answer ============

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckAnswerRequest {
    question: Question,
    user_answer: String,
    #[serde(default, alias = "embeddings")]
    chunks: Vec<Chunk>,
    #[serde(default)]
    pdf_text: String,
}

async fn handle_check_answer(
    State(state): State<AppState>,
    Json(req): Json<CheckAnswerRequest>,
) -> Result<Json<crate::models::AnswerFeedback>, AppError> {
    if req.question.question_text.is_empty() {
        return Err(invalid_input("Question is required"));
    }

    let context = state
        .pipeline
        .select_context(&req.question, &req.user_answer, &req.chunks);

    let feedback = quiz::check_answer(
        state.completion.as_ref(),
        &req.question,
        &req.user_answer,
        &context,
        &req.pdf_text,
    )
    .await;

    info!(is_correct = feedback.is_correct, "answer checked");
    Ok(Json(feedback))
}

//! # quizgen
//!
//! Turns programming PDFs into quizzes. An uploaded document flows through a
//! content pipeline — multipart decode, text extraction, code-snippet
//! detection, budget-bounded chunking, per-chunk embedding — and the results
//! feed question generation and answer checking against a text-completion
//! service.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────────────────────┐   ┌─────────────┐
//! │ Upload   │──▶│  Pipeline                      │──▶│ Quiz engine │
//! │ (multi-  │   │ extract → snippets → chunk →  │   │ generate /  │
//! │  part)   │   │ embed                          │   │ check       │
//! └──────────┘   └───────────────────────────────┘   └──────┬──────┘
//!                                                           │
//!                                      ┌────────────────────┤
//!                                      ▼                    ▼
//!                                 ┌──────────┐        ┌──────────┐
//!                                 │   CLI    │        │   HTTP   │
//!                                 │  (qgen)  │        │  (axum)  │
//!                                 └──────────┘        └──────────┘
//! ```
//!
//! State lives only in memory for the session: there is no storage layer, and
//! each request's decoding, chunking, and scoring operate on request-local
//! data.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`multipart`] | Hand-rolled multipart/form-data decoder |
//! | [`chunk`] | Budget-bounded text chunking |
//! | [`snippets`] | Heuristic code-snippet extraction |
//! | [`context`] | Keyword-scored context selection |
//! | [`extract`] | Text extraction collaborator (PDF) |
//! | [`embedding`] | Embedding service abstraction |
//! | [`completion`] | Text-completion service abstraction |
//! | [`pipeline`] | Upload-processing orchestration |
//! | [`quiz`] | Question generation and answer checking |
//! | [`server`] | HTTP API server |

pub mod chunk;
pub mod completion;
pub mod config;
pub mod context;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod models;
pub mod multipart;
pub mod pipeline;
pub mod quiz;
pub mod server;
pub mod snippets;

//! # quizgen CLI (`qgen`)
//!
//! The `qgen` binary runs the quizgen service and provides a local
//! document-processing command for inspection.
//!
//! ## Usage
//!
//! ```bash
//! qgen --config ./quizgen.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `qgen process <file>` | Extract text, snippets, and chunks from a local PDF |
//! | `qgen serve` | Start the HTTP API server |
//!
//! ## Examples
//!
//! ```bash
//! # Inspect what the pipeline would produce for a tutorial PDF
//! qgen process ./tutorial.pdf
//!
//! # Also call the embedding service for each chunk
//! qgen process ./tutorial.pdf --embed
//!
//! # Start the HTTP server
//! qgen serve --config ./quizgen.toml
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use quizgen::chunk::chunk_text;
use quizgen::config::{load_config, Config};
use quizgen::embedding::create_embedding_service;
use quizgen::extract::{PdfTextExtractor, TextExtractor};
use quizgen::pipeline::ContentPipeline;
use quizgen::server::run_server;
use quizgen::snippets::extract_code_snippets;

/// quizgen — turn programming PDFs into quizzes.
#[derive(Parser)]
#[command(name = "qgen", version, about)]
struct Cli {
    /// Path to the TOML configuration file. Defaults are used when the file
    /// does not exist.
    #[arg(long, global = true, default_value = "quizgen.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text, code snippets, and chunks from a local document.
    Process {
        /// Path to the PDF file.
        file: PathBuf,
        /// Also request an embedding for every chunk.
        #[arg(long)]
        embed: bool,
    },
    /// Start the HTTP API server.
    Serve,
}

fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::default())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = load_or_default(&cli.config)?;

    match cli.command {
        Commands::Process { file, embed } => run_process(&config, &file, embed).await,
        Commands::Serve => run_server(&config).await,
    }
}

async fn run_process(config: &Config, file: &Path, embed: bool) -> Result<()> {
    let bytes = std::fs::read(file)?;

    if embed {
        let pipeline = ContentPipeline::new(
            Box::new(PdfTextExtractor),
            create_embedding_service(&config.embedding)?,
            config.chunking.max_tokens,
        );
        let document = pipeline.process_bytes(&bytes).await?;

        println!("process {}", file.display());
        println!("  text chars: {}", document.text.len());
        println!("  code snippets: {}", document.code_snippets.len());
        println!("  chunks: {}", document.chunks.len());
        let embedded = document
            .chunks
            .iter()
            .filter(|c| c.embedding.is_some())
            .count();
        println!("  embeddings: {}", embedded);
        println!("ok");
        return Ok(());
    }

    let text = PdfTextExtractor.extract_text(&bytes)?;
    let snippets = extract_code_snippets(&text);
    let chunks = chunk_text(&text, config.chunking.max_tokens);

    println!("process {}", file.display());
    println!("  text chars: {}", text.len());
    println!("  code snippets: {}", snippets.len());
    println!("  chunks: {}", chunks.len());
    println!("ok");
    Ok(())
}

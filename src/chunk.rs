//! Budget-bounded text chunker.
//!
//! Splits document text into [`Chunk`]s that respect a `max_tokens` limit
//! (tokens approximated as 4 characters each). Each chunk ends on the nearest
//! natural boundary past the budget — a paragraph break within 500 bytes, a
//! line break within 100, a space within 20 — falling back to a hard cut.
//!
//! Unlike a normalizing chunker, nothing is trimmed or dropped: concatenating
//! the chunks in index order reproduces the input text byte for byte.

use crate::models::Chunk;

/// Approximate chars-per-token ratio used for sizing only.
pub const CHARS_PER_TOKEN: usize = 4;

/// How far past the budget to look for each boundary kind.
const PARAGRAPH_WINDOW: usize = 500;
const LINE_WINDOW: usize = 100;
const SPACE_WINDOW: usize = 20;

/// Split text into chunks, respecting `max_tokens`. Returns chunks with
/// contiguous indices starting at 0; empty input yields no chunks.
///
/// `max_tokens` must be > 0 (enforced by config validation).
pub fn chunk_text(text: &str, max_tokens: usize) -> Vec<Chunk> {
    let max_chars = max_tokens * CHARS_PER_TOKEN;

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let end = if start + max_chars < text.len() {
            let candidate = floor_char_boundary(text, start + max_chars);
            pick_boundary(text, candidate)
        } else {
            text.len()
        };

        chunks.push(Chunk {
            index: chunks.len(),
            text: text[start..end].to_string(),
            embedding: None,
        });
        start = end;
    }

    chunks
}

/// Choose the chunk end at or after `candidate`: the nearest paragraph break,
/// then line break, then space, each within its window; else `candidate`.
fn pick_boundary(text: &str, candidate: usize) -> usize {
    let rest = &text[candidate..];
    if let Some(pos) = rest.find("\n\n").filter(|&p| p < PARAGRAPH_WINDOW) {
        return candidate + pos;
    }
    if let Some(pos) = rest.find('\n').filter(|&p| p < LINE_WINDOW) {
        return candidate + pos;
    }
    if let Some(pos) = rest.find(' ').filter(|&p| p < SPACE_WINDOW) {
        return candidate + pos;
    }
    candidate
}

/// Largest char boundary at or below `index`. Keeps hard cuts from landing
/// inside a multi-byte character.
fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

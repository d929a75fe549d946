//! Keyword-scored context selection.
//!
//! Given a question and a user's answer, picks the single most relevant chunk
//! of source text by counting keyword hits. Selection never fails: a question
//! with a pre-assigned source chunk returns it directly, and when nothing
//! scores above zero the result degrades to an empty string.

use std::collections::HashMap;

use crate::models::{Chunk, Question};

/// Maximum number of keywords considered per selection.
const MAX_KEYWORDS: usize = 5;

/// Tokens too common to be useful as keywords.
const STOP_WORDS: &[&str] = &["this", "that", "with", "from", "then", "than", "what"];

/// A candidate chunk paired with its keyword-hit count.
struct ContextMatch<'a> {
    chunk: &'a Chunk,
    score: usize,
}

/// Return the chunk text most relevant to a question/answer pair, or `""`.
///
/// Ties keep input order: the first chunk reaching the top score wins.
pub fn select_context(question: &Question, user_answer: &str, chunks: &[Chunk]) -> String {
    if let Some(source) = &question.source_chunk {
        return source.clone();
    }
    if chunks.is_empty() {
        return String::new();
    }

    let combined = format!(
        "{} {} {}",
        question.question_text,
        question.question_description.as_deref().unwrap_or(""),
        user_answer
    );
    let keywords = extract_keywords(&combined);

    let mut matches: Vec<ContextMatch> = chunks
        .iter()
        .map(|chunk| {
            let haystack = chunk.text.to_lowercase();
            let score = keywords.iter().filter(|kw| haystack.contains(*kw)).count();
            ContextMatch { chunk, score }
        })
        .collect();
    matches.sort_by(|a, b| b.score.cmp(&a.score)); // stable: ties keep order

    match matches.first() {
        Some(best) if best.score > 0 => best.chunk.text.clone(),
        _ => String::new(),
    }
}

/// Extract up to five keywords: split on non-word runs, drop short tokens and
/// stop words, rank by case-insensitive frequency. Frequency ties keep first
/// occurrence order so extraction is deterministic.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for word in text.split(|c: char| !(c.is_alphanumeric() || c == '_')) {
        if word.len() <= 3 {
            continue;
        }
        let lower = word.to_lowercase();
        if STOP_WORDS.contains(&lower.as_str()) {
            continue;
        }
        let count = counts.entry(lower.clone()).or_insert(0);
        if *count == 0 {
            order.push(lower);
        }
        *count += 1;
    }

    let mut ranked: Vec<String> = order;
    ranked.sort_by(|a, b| counts[b].cmp(&counts[a])); // stable: first-seen breaks ties
    ranked.truncate(MAX_KEYWORDS);
    ranked
}

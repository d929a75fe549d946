//! Quiz question generation and answer checking.
//!
//! Questions are generated from processed document chunks through the
//! [`CompletionService`]; answer checking compares multiple-choice answers
//! directly and defers everything else to the model, with a lenient fallback
//! when the model is unavailable. Randomness (question type mix, content
//! selection) comes from an injected [`Rng`] so tests are deterministic.

use anyhow::Result;
use rand::Rng;
use std::collections::HashSet;
use tracing::warn;

use crate::completion::{CompletionRequest, CompletionService};
use crate::models::{AnswerFeedback, Chunk, Question};

const BASE_QUESTION_TYPES: &[&str] = &["multiple_choice", "short_answer", "fill_in_blank"];

fn difficulty_description(difficulty: &str) -> &'static str {
    match difficulty {
        "easy" => "beginner-friendly questions focusing on basic concepts and recognition",
        "hard" => "advanced questions requiring analysis, synthesis and deep understanding",
        _ => "intermediate-level questions requiring understanding and application",
    }
}

/// Generate a mix of quiz questions from document chunks.
///
/// Code-analysis questions are only in the mix when snippets exist. A
/// question the model fails to produce is skipped, not fatal, so the result
/// may hold fewer than `count` questions.
pub async fn generate_questions<R: Rng>(
    completion: &dyn CompletionService,
    rng: &mut R,
    chunks: &[Chunk],
    code_snippets: &[String],
    count: usize,
    difficulty: &str,
) -> Result<Vec<Question>> {
    if chunks.is_empty() {
        anyhow::bail!("Valid chunks are required");
    }

    let mut question_types: Vec<&str> = BASE_QUESTION_TYPES.to_vec();
    if !code_snippets.is_empty() {
        question_types.push("code_analysis");
    }

    let mut questions = Vec::new();

    for number in 1..=count {
        // Half the questions are multiple choice; the rest draw from the mix.
        let question_type = if rng.gen::<f64>() < 0.5 {
            "multiple_choice"
        } else {
            question_types[rng.gen_range(0..question_types.len())]
        };

        let content = select_content(rng, chunks, &questions);

        let code_snippet = if question_type == "code_analysis" && !code_snippets.is_empty() {
            Some(code_snippets[rng.gen_range(0..code_snippets.len())].clone())
        } else {
            None
        };

        match create_question(
            completion,
            question_type,
            &content,
            difficulty,
            code_snippet,
            number as u32,
        )
        .await
        {
            Some(question) => questions.push(question),
            None => warn!(number, question_type, "question generation failed, skipping"),
        }
    }

    Ok(questions)
}

/// Pick a chunk to base the next question on, avoiding chunks already used
/// as a source. Falls back to any chunk when all have been used.
fn select_content<R: Rng>(rng: &mut R, chunks: &[Chunk], existing: &[Question]) -> String {
    let used: HashSet<&str> = existing
        .iter()
        .filter_map(|q| q.source_chunk.as_deref())
        .collect();

    let available: Vec<&Chunk> = chunks
        .iter()
        .filter(|c| !used.contains(c.text.as_str()))
        .collect();

    if available.is_empty() {
        chunks[rng.gen_range(0..chunks.len())].text.clone()
    } else {
        available[rng.gen_range(0..available.len())].text.clone()
    }
}

async fn create_question(
    completion: &dyn CompletionService,
    question_type: &str,
    content: &str,
    difficulty: &str,
    code_snippet: Option<String>,
    number: u32,
) -> Option<Question> {
    let difficulty_text = difficulty_description(difficulty);

    let prompt = if let (true, Some(snippet)) = (question_type == "code_analysis", &code_snippet) {
        format!(
            "Create a {difficulty} difficulty programming question about the following code:\n\
             ```\n{snippet}\n```\n\n\
             For context, this is from a programming tutorial that also includes this information:\n\
             {context}...\n\n\
             Create a question that tests the reader's understanding of this code. {difficulty_text}.\n\n\
             The question should include:\n\
             1. A clear question asking about the code's functionality, purpose, or potential issues\n\
             2. The expected correct answer\n\
             3. For multiple choice questions, include 4 options with one correct answer\n\n\
             Format the response as a JSON object with these fields:\n\
             - type: \"{question_type}\"\n\
             - questionNumber: {number}\n\
             - questionText: A concise question title\n\
             - questionDescription: Detailed description of what you're asking\n\
             - codeSnippet: The code snippet to analyze\n\
             - correctAnswer: The correct answer\n\
             - options: Array of 4 possible answers (only for multiple choice)",
            context = truncate_chars(content, 500),
        )
    } else {
        format!(
            "Based on this content from a programming tutorial:\n\
             {context}...\n\n\
             Create a {question_type} question that tests understanding of the material. {difficulty_text}.\n\n\
             Question types:\n\
             - multiple_choice: Include 4 options with 1 correct answer\n\
             - short_answer: Should have a specific expected answer\n\
             - fill_in_blank: Should have a specific word or phrase to be filled in\n\n\
             Format the response as a JSON object with these fields:\n\
             - type: \"{question_type}\"\n\
             - questionNumber: {number}\n\
             - questionText: A concise question title\n\
             - questionDescription: Detailed description of what you're asking\n\
             - correctAnswer: The correct answer\n\
             - options: Array of 4 possible answers (only for multiple choice)\n\
             - sourceChunk: \"{source}...\"",
            context = truncate_chars(content, 800),
            source = truncate_chars(content, 100).replace('\n', " "),
        )
    };

    let request = CompletionRequest {
        system: "You are an expert educational content creator specializing in programming \
                 tutorials. Your task is to create high-quality questions based on programming \
                 tutorial content."
            .to_string(),
        user: prompt,
        temperature: 0.7,
        max_tokens: 1000,
        json_response: true,
    };

    let raw = match completion.complete(request).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "completion request failed");
            return None;
        }
    };

    match serde_json::from_str::<Question>(&raw) {
        Ok(mut question) => {
            if question.question_type.is_empty() {
                question.question_type = question_type.to_string();
            }
            if question.question_number == 0 {
                question.question_number = number;
            }
            Some(question)
        }
        Err(e) => {
            warn!(error = %e, "could not parse generated question");
            None
        }
    }
}

/// Check a user's answer against the question.
///
/// Multiple-choice answers with a known correct answer are compared directly;
/// everything else is evaluated by the model. A model failure falls back to a
/// lenient substring match so answer checking itself never errors out.
pub async fn check_answer(
    completion: &dyn CompletionService,
    question: &Question,
    user_answer: &str,
    context: &str,
    pdf_text: &str,
) -> AnswerFeedback {
    if question.question_type == "multiple_choice" {
        if let Some(correct) = &question.correct_answer {
            let is_correct =
                user_answer.trim().to_lowercase() == correct.trim().to_lowercase();
            let explanation = generate_feedback(
                completion,
                question,
                user_answer,
                is_correct,
                context,
                pdf_text,
            )
            .await;
            return AnswerFeedback {
                is_correct,
                percent_correct: if is_correct { 1.0 } else { 0.0 },
                explanation,
            };
        }
    }

    match evaluate_with_model(completion, question, user_answer, context, pdf_text).await {
        Ok(feedback) => feedback,
        Err(e) => {
            warn!(error = %e, "model evaluation failed, falling back to direct match");
            let is_correct = question
                .correct_answer
                .as_ref()
                .map(|correct| user_answer.to_lowercase().contains(&correct.to_lowercase()))
                .unwrap_or(false);
            AnswerFeedback {
                is_correct,
                percent_correct: if is_correct { 1.0 } else { 0.0 },
                explanation: format!(
                    "The correct answer is: {}",
                    question.correct_answer.as_deref().unwrap_or("Not available")
                ),
            }
        }
    }
}

async fn evaluate_with_model(
    completion: &dyn CompletionService,
    question: &Question,
    user_answer: &str,
    context: &str,
    pdf_text: &str,
) -> Result<AnswerFeedback> {
    let prompt = format!(
        "Question: {question_text}\n\
         {description}{code}\
         Expected Answer: {expected}\n\
         User's Answer: {user_answer}\n\n\
         Relevant Context from the Programming Tutorial:\n\
         {context}\n\n\
         Evaluate the user's answer based on the context from the programming tutorial.\n\n\
         Determine:\n\
         1. Is the answer correct? (true/false)\n\
         2. How correct is it as a percentage? (0.0 to 1.0)\n\
         3. Provide a detailed explanation of why the answer is correct or incorrect\n\
         4. Include specific references to the course material when possible\n\n\
         Format response as a JSON object with these fields:\n\
         - isCorrect: boolean\n\
         - percentCorrect: number (0.0 to 1.0)\n\
         - explanation: string",
        question_text = question.question_text,
        description = prompt_line("Description", question.question_description.as_deref()),
        code = prompt_code_block(question.code_snippet.as_deref()),
        expected = question.correct_answer.as_deref().unwrap_or("Not provided directly"),
        context = context_or_excerpt(context, pdf_text),
    );

    let request = CompletionRequest {
        system: "You are an expert programming educator evaluating a student answer to a \
                 programming question. Your feedback should be accurate, helpful, and educational."
            .to_string(),
        user: prompt,
        temperature: 0.3,
        max_tokens: 1000,
        json_response: true,
    };

    let raw = completion.complete(request).await?;
    Ok(serde_json::from_str(&raw)?)
}

/// Feedback text for an already-decided multiple-choice verdict. A model
/// failure degrades to a canned message rather than an error.
async fn generate_feedback(
    completion: &dyn CompletionService,
    question: &Question,
    user_answer: &str,
    is_correct: bool,
    context: &str,
    pdf_text: &str,
) -> String {
    let prompt = format!(
        "Question: {question_text}\n\
         {description}{code}\
         User's Answer: {user_answer}\n\
         Correct Answer: {expected}\n\
         Is Correct: {is_correct}\n\n\
         Relevant Context from the Programming Tutorial:\n\
         {context}\n\n\
         Generate helpful feedback for the user's answer. The feedback should:\n\
         1. Be encouraging and educational\n\
         2. Explain why the answer is correct or incorrect\n\
         3. Provide additional context or information to deepen understanding\n\
         4. For incorrect answers, explain the correct answer\n\
         5. Include code examples where appropriate\n\n\
         Keep your feedback concise (3-5 sentences) but informative.",
        question_text = question.question_text,
        description = prompt_line("Description", question.question_description.as_deref()),
        code = prompt_code_block(question.code_snippet.as_deref()),
        expected = question.correct_answer.as_deref().unwrap_or("Not provided directly"),
        context = context_or_excerpt(context, pdf_text),
    );

    let request = CompletionRequest {
        system: "You are an expert programming educator providing feedback on a student answer. \
                 Your feedback should be accurate, helpful, and educational."
            .to_string(),
        user: prompt,
        temperature: 0.7,
        max_tokens: 500,
        json_response: false,
    };

    match completion.complete(request).await {
        Ok(feedback) => feedback,
        Err(e) => {
            warn!(error = %e, "feedback generation failed");
            if is_correct {
                "Correct! Well done.".to_string()
            } else {
                format!(
                    "Incorrect. The correct answer is: {}",
                    question.correct_answer.as_deref().unwrap_or("Not available")
                )
            }
        }
    }
}

fn prompt_line(label: &str, value: Option<&str>) -> String {
    match value {
        Some(v) => format!("{}: {}\n", label, v),
        None => String::new(),
    }
}

fn prompt_code_block(code: Option<&str>) -> String {
    match code {
        Some(c) => format!("Code: ```\n{}\n```\n", c),
        None => String::new(),
    }
}

fn context_or_excerpt(context: &str, pdf_text: &str) -> String {
    if !context.is_empty() {
        context.to_string()
    } else {
        format!("{}...", truncate_chars(pdf_text, 500))
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

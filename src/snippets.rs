//! Heuristic code-snippet extraction.
//!
//! Three independent detectors run over the text and their captures are
//! unioned: triple-backtick fences, runs of two or more lines indented by
//! four or more spaces, and single lines opening with a declaration keyword
//! and containing `{` or `:`. Captures shorter than 21 characters or failing
//! the `is_likely_code` check are discarded; survivors are trimmed and
//! deduplicated by exact trimmed text.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Minimum raw capture length for a candidate to be kept.
const MIN_SNIPPET_LEN: usize = 20;

/// Fenced block: the language tag after the opening fence is ignored.
static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:\w*\n)?(.*?)```").unwrap());

/// Two or more consecutive lines indented by 4+ spaces, the first starting
/// with a word character or `(`.
static INDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\n)( {4,}[\w(].+(?:\n {4,}.+)+)").unwrap());

/// Declaration-keyword line that also contains `{` or `:`.
static KEYWORD_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?:function|def|class|import|from|public|private|var|let|const)[ \t].+[{:]")
        .unwrap()
});

static ASSIGNMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-zA-Z0-9]+=").unwrap());

const CODE_KEYWORDS: &[&str] = &[
    "function", "return", "if", "else", "for", "while", "class", "import", "export", "from",
    "def", "print", "var", "let", "const", "= function", "=>", "public", "private", "static",
];

/// Scan text for likely source code and return deduplicated snippets.
/// Insertion order is preserved but callers must not rely on it.
pub fn extract_code_snippets(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut snippets = Vec::new();

    let mut push = |candidate: &str| {
        if candidate.len() > MIN_SNIPPET_LEN && is_likely_code(candidate) {
            let trimmed = candidate.trim();
            if seen.insert(trimmed.to_string()) {
                snippets.push(trimmed.to_string());
            }
        }
    };

    for caps in FENCE_RE.captures_iter(text) {
        push(&caps[1]);
    }
    for caps in INDENT_RE.captures_iter(text) {
        push(&caps[1]);
    }
    for m in KEYWORD_LINE_RE.find_iter(text) {
        push(m.as_str());
    }

    snippets
}

/// Fixed-rule classifier: code keywords, brackets, or an assignment pattern.
fn is_likely_code(text: &str) -> bool {
    CODE_KEYWORDS.iter().any(|kw| text.contains(kw))
        || text.contains('{')
        || text.contains('}')
        || text.contains('(')
        || text.contains(')')
        || ASSIGNMENT_RE.is_match(text)
        || text.contains('[')
        || text.contains(']')
        || text.contains('<')
        || text.contains('>')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_block_is_captured() {
        let text = "Intro prose.\n```js\nconst total = a + b;\nreturn total;\n```\nMore prose.";
        let snippets = extract_code_snippets(text);
        assert_eq!(snippets.len(), 1);
        assert!(snippets[0].contains("const total = a + b;"));
    }

    #[test]
    fn fence_at_length_threshold_is_excluded() {
        // Captured content is exactly 20 characters: not kept.
        let text = "```\nreturn first + next\n```";
        assert_eq!(text.find("return").unwrap(), 4);
        assert!(extract_code_snippets(text).is_empty());

        // One character more and it qualifies.
        let text = "```\nreturn first + next2\n```";
        assert_eq!(extract_code_snippets(text).len(), 1);
    }

    #[test]
    fn indented_run_is_captured() {
        let text = "Example:\n    total = compute(items)\n    print(total)\nDone.";
        let snippets = extract_code_snippets(text);
        assert_eq!(snippets.len(), 1);
        assert!(snippets[0].contains("compute(items)"));
        assert!(snippets[0].contains("print(total)"));
    }

    #[test]
    fn single_indented_line_is_not_a_run() {
        let text = "Example:\n    total = compute_everything(items)\nDone.";
        assert!(extract_code_snippets(text).is_empty());
    }

    #[test]
    fn keyword_line_with_brace_is_captured() {
        let text = "See below.\nfunction renderWidget(props) {\nprose continues";
        let snippets = extract_code_snippets(text);
        assert_eq!(snippets.len(), 1);
        assert!(snippets[0].starts_with("function renderWidget"));
    }

    #[test]
    fn keyword_line_without_brace_or_colon_is_ignored() {
        let text = "from the beginning there was prose and nothing else\n";
        assert!(extract_code_snippets(text).is_empty());
    }

    #[test]
    fn prose_without_code_markers_is_ignored() {
        let text = "```\nplain words only here nothing code like at all\n```";
        assert!(extract_code_snippets(text).is_empty());
    }

    #[test]
    fn duplicates_collapse_to_one() {
        let code = "const value = compute(1, 2);";
        let text = format!(
            "```\n{code}\n```\nrepeat:\n```\n{code}\n```\nand indented:\n    {code}\n    {code}\n"
        );
        let snippets = extract_code_snippets(&text);
        let unique: HashSet<&str> = snippets.iter().map(String::as_str).collect();
        assert_eq!(snippets.len(), unique.len());
        assert!(snippets.iter().any(|s| s == code));
    }

    #[test]
    fn assignment_counts_as_code() {
        assert!(is_likely_code("total=41 plus one more"));
        assert!(!is_likely_code("plain words without anything"));
    }
}

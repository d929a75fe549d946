//! Hand-rolled multipart/form-data decoder.
//!
//! Splits a raw request body into [`MultipartPart`]s given the boundary from
//! the `Content-Type` header. Deliberately lenient: a part with no header/body
//! separator stops the scan instead of failing, so trailing garbage after the
//! last well-formed part is tolerated. Only an absent boundary is an error.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::PipelineError;
use crate::models::MultipartPart;

static BOUNDARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)boundary=(?:"([^"]+)"|([^;]+))"#).unwrap());
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"name="([^"]+)""#).unwrap());
static FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"filename="([^"]+)""#).unwrap());

/// Extract the boundary parameter from a `Content-Type` header value.
/// Accepts both quoted and bare forms.
pub fn parse_boundary(content_type: &str) -> Result<String, PipelineError> {
    BOUNDARY_RE
        .captures(content_type)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            PipelineError::MalformedRequest("no boundary found in content-type".to_string())
        })
}

/// Decode a multipart body into its parts, in order of appearance.
///
/// Each part's body is the exact byte span between its header block and the
/// `\r\n` preceding the next `--<boundary>` delimiter.
pub fn parse_multipart(buffer: &[u8], boundary: &str) -> Vec<MultipartPart> {
    let delimiter = format!("--{}", boundary).into_bytes();
    let end_delimiter = format!("--{}--", boundary).into_bytes();

    let mut parts = Vec::new();
    let mut start = match find_bytes(buffer, &delimiter, 0) {
        Some(pos) => pos,
        None => return parts,
    };

    loop {
        let search_from = start + delimiter.len();
        let end = match find_bytes(buffer, &delimiter, search_from)
            .or_else(|| find_bytes(buffer, &end_delimiter, search_from))
        {
            Some(pos) => pos,
            None => break,
        };

        // Blank line separating headers from the body. A part without one is
        // truncated input; stop rather than emit a corrupt part.
        let header_end = match find_bytes(buffer, b"\r\n\r\n", start) {
            Some(pos) if pos < end => pos,
            _ => break,
        };

        let header_start = (start + delimiter.len() + 2).min(header_end);
        let headers = parse_headers(&String::from_utf8_lossy(&buffer[header_start..header_end]));

        let body_start = header_end + 4;
        let body_end = end.saturating_sub(2); // drop the \r\n before the next delimiter
        let data = if body_end > body_start {
            buffer[body_start..body_end].to_vec()
        } else {
            Vec::new()
        };

        let disposition = headers
            .get("content-disposition")
            .map(String::as_str)
            .unwrap_or("");
        let name = NAME_RE
            .captures(disposition)
            .map(|c| c[1].to_string())
            .unwrap_or_default();
        let filename = FILENAME_RE.captures(disposition).map(|c| c[1].to_string());

        parts.push(MultipartPart {
            name,
            filename,
            content_type: headers.get("content-type").cloned(),
            data,
        });

        start = end;
    }

    parts
}

/// Parse `name: value` header lines, lower-casing names. Split on the first
/// colon only, so values may themselves contain colons.
fn parse_headers(block: &str) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    for line in block.split("\r\n") {
        if let Some(sep) = line.find(':') {
            let key = line[..sep].trim().to_lowercase();
            let value = line[sep + 1..].trim().to_string();
            headers.insert(key, value);
        }
    }
    headers
}

fn find_bytes(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() || needle.is_empty() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| from + pos)
}

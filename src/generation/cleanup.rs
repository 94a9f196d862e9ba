// src/generation/cleanup.rs

//! Text surgery applied to model output before it is parsed as JSON.
//!
//! Extraction narrows the raw text to the most JSON-like region. Cleanup
//! then runs a fixed, ordered list of pure rules over that region.

use std::sync::LazyLock;

use regex::Regex;

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?i:json)?\s*([\s\S]*?)```").unwrap());

static ARRAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\s*\{[\s\S]*\}\s*\]").unwrap());

static TRAILING_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").unwrap());

static BLANK_LINES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());

static CODE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```[\s\S]*?```").unwrap());

static INLINE_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`[^`\n]*`").unwrap());

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Picks the working text out of a raw model response.
///
/// Preference order: the interior of the first fenced block, then the first
/// `[ { ... } ]` region, then the whole response trimmed.
pub fn extract_candidate(raw: &str) -> String {
    if let Some(inner) = FENCE_RE.captures(raw).and_then(|c| c.get(1)) {
        return inner.as_str().trim().to_string();
    }
    if let Some(array) = ARRAY_RE.find(raw) {
        return array.as_str().to_string();
    }
    raw.trim().to_string()
}

/// A single cleanup step.
pub type CleanupRule = fn(&str) -> String;

/// Cleanup rules in application order. Array clamping must stay first.
pub const CLEANUP_RULES: &[(&str, CleanupRule)] = &[
    ("clamp_to_array", clamp_to_array),
    ("strip_trailing_commas", strip_trailing_commas),
    ("collapse_blank_lines", collapse_blank_lines),
    ("unescape_quotes", unescape_quotes),
    ("replace_escaped_newlines", replace_escaped_newlines),
    ("strip_code_spans", strip_code_spans),
    ("collapse_whitespace", collapse_whitespace),
];

/// Runs every rule in [`CLEANUP_RULES`] over `text`.
///
/// A single pass is not a fixed point for every input: a code span sitting
/// between a comma and a closing bracket (``{"a":1,`x`}``) only exposes the
/// trailing comma after `strip_code_spans`, which runs after
/// `strip_trailing_commas`.
pub fn clean(text: &str) -> String {
    CLEANUP_RULES
        .iter()
        .fold(text.to_string(), |acc, (_, rule)| rule(&acc))
}

/// Keeps only the span from the first `[` to the last `]`.
pub fn clamp_to_array(text: &str) -> String {
    match (text.find('['), text.rfind(']')) {
        (Some(start), Some(end)) if start < end => text[start..=end].to_string(),
        _ => text.to_string(),
    }
}

pub fn strip_trailing_commas(text: &str) -> String {
    TRAILING_COMMA_RE.replace_all(text, "$1").into_owned()
}

pub fn collapse_blank_lines(text: &str) -> String {
    BLANK_LINES_RE.replace_all(text, "\n").into_owned()
}

pub fn unescape_quotes(text: &str) -> String {
    text.replace("\\\"", "\"")
}

/// Literal `\n` sequences (backslash, n) become a space.
pub fn replace_escaped_newlines(text: &str) -> String {
    text.replace("\\n", " ")
}

/// Removes fenced blocks and inline code spans nested inside question text.
pub fn strip_code_spans(text: &str) -> String {
    let without_blocks = CODE_BLOCK_RE.replace_all(text, "");
    INLINE_CODE_RE.replace_all(&without_blocks, "").into_owned()
}

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

//! Text cleanup applied to every value before it reaches the export
//!
//! Spreadsheet writers reject control characters, and the source data carries
//! mojibake from upstream encoding round trips. Everything outside printable
//! ASCII is stripped.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static NON_PRINTABLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\x20-\x7E]").unwrap()
});

/// Replacement-character artifacts seen in the source narratives
const ARTIFACTS: [&str; 3] = ["\u{2665}", "\u{00BF}", "\u{FFFD}"];

/// Strip non-printable characters and known artifacts from a string
pub fn sanitize(value: &str) -> String {
    let mut cleaned = NON_PRINTABLE_REGEX.replace_all(value, "").into_owned();
    for artifact in ARTIFACTS {
        if cleaned.contains(artifact) {
            cleaned = cleaned.replace(artifact, "");
        }
    }
    cleaned
}

/// Coerce a JSON scalar to sanitized text
///
/// Null, arrays and objects have no scalar form and become the empty string.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => sanitize(s),
        Value::Number(n) => sanitize(&n.to_string()),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn object_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("valid object regex"))
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the info string, e.g. ```json
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Pulls a JSON value out of a model reply.
///
/// Code fences are stripped; if the remainder is not JSON the outermost
/// `{...}` block is tried instead.
pub fn extract_json(reply: &str) -> Option<Value> {
    let body = strip_code_fence(reply);
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return Some(value);
    }
    let block = object_pattern().find(body)?;
    serde_json::from_str(block.as_str()).ok()
}

/// Like [`extract_json`] but only accepts objects.
pub fn extract_object(reply: &str) -> Option<serde_json::Map<String, Value>> {
    match extract_json(reply)? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

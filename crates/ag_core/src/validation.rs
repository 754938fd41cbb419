use jsonschema::{Draft, JSONSchema};
use serde_json::{json, Value};

pub const VALID_MESSAGE: &str = "JSON is valid.";

/// Validates `document` against `schema`.
///
/// Returns `(true, "JSON is valid.")` or `(false, "JSON validation error: ...")`.
/// A schema that fails to compile is reported the same way.
pub fn validate_json(document: &Value, schema: &Value) -> (bool, String) {
    let compiled = match JSONSchema::options().with_draft(Draft::Draft7).compile(schema) {
        Ok(compiled) => compiled,
        Err(e) => return (false, format!("JSON validation error: invalid schema: {}", e)),
    };

    let outcome = match compiled.validate(document) {
        Ok(()) => (true, VALID_MESSAGE.to_string()),
        Err(errors) => {
            let messages: Vec<String> = errors.map(|e| e.to_string()).collect();
            (false, format!("JSON validation error: {}", messages.join("; ")))
        }
    };
    outcome
}

/// Schema of the classification object produced for collected items.
pub fn analysis_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "short_description": {"type": "string", "maxLength": 50},
            "actionable": {"type": "boolean"},
            "priority_level": {"type": "string", "enum": ["high", "medium", "low", "neutral"]},
            "opportunity_type": {"type": "string"},
            "suggested_action": {"type": "string"},
            "relevance": {"type": "string", "maxLength": 100},
            "suggested_reply": {"type": "string"}
        },
        "required": ["short_description", "actionable", "priority_level"]
    })
}

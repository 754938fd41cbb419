use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const SHORT_DESCRIPTION_MAX: usize = 50;
pub const RELEVANCE_MAX: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    High,
    Medium,
    Low,
    #[default]
    Neutral,
}

impl PriorityLevel {
    /// Dashboard urgency score.
    pub fn urgency(&self) -> u8 {
        match self {
            PriorityLevel::Neutral => 0,
            PriorityLevel::Low => 1,
            PriorityLevel::Medium => 2,
            PriorityLevel::High => 3,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "high" => Some(PriorityLevel::High),
            "medium" => Some(PriorityLevel::Medium),
            "low" => Some(PriorityLevel::Low),
            "neutral" => Some(PriorityLevel::Neutral),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityLevel::High => "high",
            PriorityLevel::Medium => "medium",
            PriorityLevel::Low => "low",
            PriorityLevel::Neutral => "neutral",
        }
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// LLM judgement attached to a collected item.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Classification {
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub actionable: bool,
    #[serde(default)]
    pub priority_level: PriorityLevel,
    #[serde(default)]
    pub opportunity_type: String,
    #[serde(default)]
    pub suggested_action: String,
    #[serde(default)]
    pub relevance: String,
    #[serde(default)]
    pub suggested_reply: String,
}

impl Classification {
    /// The non-actionable judgement substituted whenever classification fails.
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Reads a classification out of loosely shaped LLM output.
    ///
    /// Missing keys default; `actionable` accepts booleans and "true"/"false"
    /// strings; an unknown priority falls back to `low` for actionable items
    /// and `neutral` otherwise.
    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .map(|s| s.to_string())
                .unwrap_or_default()
        };

        let actionable = match value.get("actionable") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
            _ => false,
        };

        let priority_level = value
            .get("priority_level")
            .and_then(Value::as_str)
            .and_then(PriorityLevel::from_label)
            .unwrap_or(if actionable {
                PriorityLevel::Low
            } else {
                PriorityLevel::Neutral
            });

        Self {
            short_description: truncate_chars(&text("short_description"), SHORT_DESCRIPTION_MAX),
            actionable,
            priority_level,
            opportunity_type: text("opportunity_type"),
            suggested_action: text("suggested_action"),
            relevance: truncate_chars(&text("relevance"), RELEVANCE_MAX),
            suggested_reply: text("suggested_reply"),
        }
    }

    /// Clears everything a non-actionable item must not carry.
    pub fn blank_if_not_actionable(mut self) -> Self {
        if !self.actionable {
            self.priority_level = PriorityLevel::Neutral;
            self.opportunity_type.clear();
            self.suggested_action.clear();
            self.relevance.clear();
            self.suggested_reply.clear();
        }
        self
    }
}

/// An actionable item as returned by the context agent's analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemAnalysis {
    pub original_item: Value,
    pub analysis: Classification,
}

/// Truncates to at most `max` characters without splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_urgency_mapping() {
        assert_eq!(PriorityLevel::Neutral.urgency(), 0);
        assert_eq!(PriorityLevel::Low.urgency(), 1);
        assert_eq!(PriorityLevel::Medium.urgency(), 2);
        assert_eq!(PriorityLevel::High.urgency(), 3);
    }

    #[test]
    fn test_from_value_lenient() {
        let c = Classification::from_value(&json!({
            "actionable": "true",
            "priority_level": "URGENT",
            "relevance": "x".repeat(150),
        }));
        assert!(c.actionable);
        assert_eq!(c.priority_level, PriorityLevel::Low);
        assert_eq!(c.relevance.chars().count(), RELEVANCE_MAX);

        let c = Classification::from_value(&json!({"foo": 1}));
        assert_eq!(c, Classification::neutral());
    }

    #[test]
    fn test_blank_if_not_actionable() {
        let c = Classification {
            short_description: "Newsletter".into(),
            actionable: false,
            priority_level: PriorityLevel::High,
            suggested_action: "Call".into(),
            ..Default::default()
        }
        .blank_if_not_actionable();
        assert_eq!(c.short_description, "Newsletter");
        assert_eq!(c.priority_level, PriorityLevel::Neutral);
        assert!(c.suggested_action.is_empty());
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("ăîșțâ", 3), "ăîș");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}

use super::Classifier;
use crate::json_reply::extract_object;
use crate::prompts;
use ag_core::classification::truncate_chars;
use ag_core::{ChatMessage, EmailRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// LLM enrichment attached to a collected email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailEnhancement {
    pub category: String,
    pub short_description: String,
    pub actionable: bool,
    pub suggested_action: String,
    pub relevance: String,
    pub suggested_reply: String,
}

impl Default for EmailEnhancement {
    fn default() -> Self {
        Self {
            category: "Unknown".to_string(),
            short_description: String::new(),
            actionable: false,
            suggested_action: String::new(),
            relevance: String::new(),
            suggested_reply: String::new(),
        }
    }
}

impl EmailEnhancement {
    fn from_object(obj: &Map<String, Value>) -> Self {
        let text = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim()
                .to_string()
        };
        let actionable = match obj.get("actionable") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        };
        let category = text("category");
        let mut enhancement = Self {
            category: if category.is_empty() { "Unknown".to_string() } else { category },
            short_description: truncate_chars(&text("short_description"), 50),
            actionable,
            suggested_action: text("suggested_action"),
            relevance: truncate_chars(&text("relevance"), 100),
            suggested_reply: text("suggested_reply"),
        };
        if !enhancement.actionable {
            enhancement.suggested_action.clear();
            enhancement.relevance.clear();
            enhancement.suggested_reply.clear();
        }
        enhancement
    }

    /// Copies the enrichment onto an email record.
    pub fn apply_to(&self, email: &mut EmailRecord) {
        email.category = Some(self.category.clone());
        email.short_description = self.short_description.clone();
        email.actionable = self.actionable;
        email.suggested_action = self.suggested_action.clone();
        email.relevance = self.relevance.clone();
        email.suggested_reply = (!self.suggested_reply.is_empty()).then(|| self.suggested_reply.clone());
    }
}

impl Classifier {
    /// Categorises an email body, optionally with prior correspondence.
    pub async fn enhance_email(&self, body: &str, history: &str) -> EmailEnhancement {
        let messages = [
            ChatMessage::system(prompts::EMAIL_SYSTEM),
            ChatMessage::user(format!("Historical Emails:\n{}", history)),
            ChatMessage::user(format!("New Email:\n{}", body)),
        ];
        let reply = match self.model().complete(&messages).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("Email enhancement failed: {}", e);
                return EmailEnhancement::default();
            }
        };
        match extract_object(&reply) {
            Some(obj) => EmailEnhancement::from_object(&obj),
            None => {
                tracing::warn!("Unparsable email enhancement: {}", reply);
                EmailEnhancement::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scripted::ScriptedModel;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_enhance_email() {
        let model = Arc::new(ScriptedModel::new([r#"{
            "category": "Actionable",
            "short_description": "Meeting request",
            "actionable": true,
            "suggested_action": "Schedule call",
            "relevance": "Partnership",
            "suggested_reply": "Happy to meet."
        }"#]));
        let classifier = Classifier::new(model.clone());
        let e = classifier.enhance_email("Can we meet?", "").await;
        assert_eq!(e.category, "Actionable");
        assert!(e.actionable);

        let mut email = EmailRecord { id: "m1".into(), ..Default::default() };
        e.apply_to(&mut email);
        assert_eq!(email.category.as_deref(), Some("Actionable"));
        assert_eq!(email.suggested_reply.as_deref(), Some("Happy to meet."));
        assert!(model.prompts()[0].contains("New Email:\nCan we meet?"));
    }

    #[tokio::test]
    async fn test_enhance_email_fallback() {
        let e = Classifier::new(Arc::new(ScriptedModel::failing()))
            .enhance_email("body", "")
            .await;
        assert_eq!(e, EmailEnhancement::default());
        assert_eq!(e.category, "Unknown");

        let e = Classifier::new(Arc::new(ScriptedModel::new([
            r#"{"category": "Promo", "actionable": false, "suggested_action": "Buy"}"#,
        ])))
        .enhance_email("Sale!", "")
        .await;
        assert_eq!(e.category, "Promo");
        assert!(e.suggested_action.is_empty());
    }
}

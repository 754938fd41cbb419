use super::{Classifier, SELECTOR_SNIPPET_LIMIT};
use crate::json_reply::extract_object;
use crate::prompts;
use ag_core::classification::truncate_chars;
use serde_json::Value;

impl Classifier {
    /// Infers a CSS selector for an article's publication date.
    pub async fn find_date_selector(&self, url: &str, body_text: &str) -> Option<String> {
        let snippet = truncate_chars(body_text, SELECTOR_SNIPPET_LIMIT);
        let reply = self
            .ask(prompts::DATE_SELECTOR_SYSTEM, prompts::date_selector_user(url, &snippet))
            .await?;
        let selector = extract_object(&reply)?
            .get("selector")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("null"))
            .map(str::to_string)?;
        tracing::info!("LLM identified date selector '{}' for {}", selector, url);
        Some(selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scripted::ScriptedModel;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_selector() {
        let classifier = Classifier::new(Arc::new(ScriptedModel::new([
            r#"{"selector": "time.published"}"#,
            r#"{"selector": null}"#,
            "nope",
        ])));
        assert_eq!(
            classifier.find_date_selector("https://a.com/blog/x", "body").await.as_deref(),
            Some("time.published")
        );
        assert!(classifier.find_date_selector("https://a.com/blog/x", "body").await.is_none());
        assert!(classifier.find_date_selector("https://a.com/blog/x", "body").await.is_none());
    }
}

use super::{Classifier, PAGE_TEXT_LIMIT};
use crate::json_reply::extract_object;
use crate::prompts;
use ag_core::classification::truncate_chars;
use ag_core::{PageAnalysis, PageType};
use serde_json::Value;

impl Classifier {
    /// Classifies a page from its cleaned text. Failures yield `OTHER/llm_error`.
    pub async fn classify_page(&self, text: &str) -> PageAnalysis {
        let text = truncate_chars(text, PAGE_TEXT_LIMIT);
        let Some(reply) = self.ask(prompts::PAGE_TYPE_SYSTEM, text).await else {
            return PageAnalysis::other("llm_error");
        };
        let Some(obj) = extract_object(&reply) else {
            tracing::warn!("Unparsable page classification: {}", reply);
            return PageAnalysis::other("llm_error");
        };

        let page_type = obj
            .get("page_type")
            .and_then(Value::as_str)
            .map(PageType::from_label)
            .unwrap_or(PageType::Other);
        let reason = obj
            .get("reason")
            .and_then(Value::as_str)
            .filter(|r| !r.trim().is_empty())
            .unwrap_or("no_reason");
        PageAnalysis::new(page_type, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scripted::ScriptedModel;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_classify_page() {
        let model = Arc::new(ScriptedModel::new([
            r#"{"page_type": "BLOG_INDEX", "reason": "lists posts"}"#,
            "```json\n{\"page_type\": \"resources mix\"}\n```",
            "I think it is a blog",
        ]));
        let classifier = Classifier::new(model.clone());

        let a = classifier.classify_page("Latest posts").await;
        assert_eq!(a, PageAnalysis::new(PageType::BlogIndex, "lists posts"));

        let b = classifier.classify_page("Hub").await;
        assert_eq!(b.page_type, PageType::ResourcesMix);
        assert_eq!(b.reason, "no_reason");

        let c = classifier.classify_page("?").await;
        assert_eq!(c, PageAnalysis::other("llm_error"));
    }

    #[tokio::test]
    async fn test_model_failure_is_other() {
        let classifier = Classifier::new(Arc::new(ScriptedModel::failing()));
        let analysis = classifier.classify_page("text").await;
        assert_eq!(analysis.page_type, PageType::Other);
        assert_eq!(analysis.reason, "llm_error");
    }

    #[tokio::test]
    async fn test_page_text_is_capped() {
        let model = Arc::new(ScriptedModel::default());
        let classifier = Classifier::new(model.clone());
        classifier.classify_page(&"x".repeat(20_000)).await;
        let prompt = &model.prompts()[0];
        assert!(prompt.ends_with(&"x".repeat(PAGE_TEXT_LIMIT)));
        assert!(!prompt.contains(&"x".repeat(PAGE_TEXT_LIMIT + 1)));
    }
}

use super::{Classifier, MAX_LINK_ENTRIES};
use crate::json_reply::extract_object;
use crate::prompts;
use serde_json::Value;

impl Classifier {
    /// Asks the model which of the `"anchor -> url"` entries are section
    /// indexes. Returns the raw URLs, possibly relative; empty on failure.
    pub async fn shortlist_index_links(&self, base_url: &str, entries: &[String]) -> Vec<String> {
        if entries.is_empty() {
            return Vec::new();
        }
        let entries = &entries[..entries.len().min(MAX_LINK_ENTRIES)];
        let Some(reply) = self
            .ask(prompts::INDEX_LINKS_SYSTEM, prompts::index_links_user(base_url, entries))
            .await
        else {
            return Vec::new();
        };

        extract_object(&reply)
            .and_then(|obj| obj.get("urls").cloned())
            .and_then(|urls| match urls {
                Value::Array(items) => Some(
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect(),
                ),
                _ => None,
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scripted::ScriptedModel;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_shortlist() {
        let model = Arc::new(ScriptedModel::new([
            r#"{"urls": ["https://acme.com/blog", "/news", 3]}"#,
        ]));
        let classifier = Classifier::new(model.clone());
        let entries = vec!["blog -> https://acme.com/blog".to_string()];
        let urls = classifier.shortlist_index_links("https://acme.com", &entries).await;
        assert_eq!(urls, vec!["https://acme.com/blog", "/news"]);
        assert!(model.prompts()[0].contains("blog -> https://acme.com/blog"));
    }

    #[tokio::test]
    async fn test_shortlist_defaults_to_empty() {
        let classifier = Classifier::new(Arc::new(ScriptedModel::new([r#"{"links": []}"#])));
        let entries = vec!["a -> b".to_string()];
        assert!(classifier.shortlist_index_links("https://acme.com", &entries).await.is_empty());

        let model = Arc::new(ScriptedModel::failing());
        let classifier = Classifier::new(model.clone());
        assert!(classifier.shortlist_index_links("https://acme.com", &[]).await.is_empty());
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_entries_are_capped() {
        let model = Arc::new(ScriptedModel::default());
        let classifier = Classifier::new(model.clone());
        let entries: Vec<String> = (0..250).map(|i| format!("link{} -> https://acme.com/p{}", i, i)).collect();
        classifier.shortlist_index_links("https://acme.com", &entries).await;
        let prompt = &model.prompts()[0];
        assert!(prompt.contains("link199 ->"));
        assert!(!prompt.contains("link200 ->"));
    }
}

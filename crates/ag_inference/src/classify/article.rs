use super::Classifier;
use crate::json_reply::extract_object;
use crate::prompts;
use ag_core::{Classification, ContextProvider};
use serde_json::Value;

impl Classifier {
    /// Judges a scraped article for the client it was collected for.
    ///
    /// Only the short description survives a non-actionable verdict. Any
    /// failure yields [`Classification::neutral`].
    pub async fn analyze_article(
        &self,
        client_name: &str,
        title: &str,
        content: &str,
        profile: Option<&Value>,
        context: &dyn ContextProvider,
    ) -> Classification {
        let fetched = if client_name.is_empty() {
            String::new()
        } else {
            context.client_context(client_name).await
        };
        let profile = profile.and_then(|p| serde_json::to_string_pretty(p).ok());
        let prompt = prompts::article_user(title, content, profile.as_deref(), &fetched);

        let Some(reply) = self.ask(prompts::ARTICLE_SYSTEM, prompt).await else {
            return Classification::neutral();
        };
        match extract_object(&reply) {
            Some(obj) => Classification::from_value(&Value::Object(obj)).blank_if_not_actionable(),
            None => {
                tracing::warn!("Unparsable article analysis: {}", reply);
                Classification::neutral()
            }
        }
    }
}

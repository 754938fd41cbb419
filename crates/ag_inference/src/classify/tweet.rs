use super::Classifier;
use crate::json_reply::extract_object;
use crate::prompts;
use ag_core::{Classification, ContextProvider};
use serde_json::Value;

impl Classifier {
    /// Judges a tweet for the given user profile and client.
    ///
    /// Context for `client_name` is pulled from `context` and appended to the
    /// prompt. Any failure yields [`Classification::neutral`].
    pub async fn classify_tweet(
        &self,
        tweet_text: &str,
        profile: Option<&Value>,
        client_name: Option<&str>,
        context: &dyn ContextProvider,
    ) -> Classification {
        let fetched = match client_name {
            Some(name) if !name.is_empty() => context.client_context(name).await,
            _ => String::new(),
        };
        let profile = profile.and_then(|p| serde_json::to_string_pretty(p).ok());
        let prompt = prompts::tweet_user(tweet_text, profile.as_deref(), &fetched);

        let Some(reply) = self.ask(prompts::TWEET_SYSTEM, prompt).await else {
            return Classification::neutral();
        };
        match extract_object(&reply) {
            Some(obj) => Classification::from_value(&Value::Object(obj)).blank_if_not_actionable(),
            None => {
                tracing::warn!("Unparsable tweet classification: {}", reply);
                Classification::neutral()
            }
        }
    }
}

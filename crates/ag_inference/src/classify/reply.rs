use super::Classifier;
use crate::prompts;
use ag_core::ChatMessage;

impl Classifier {
    /// Short, friendly reply to a tweet. Falls back to [`prompts::REPLY_FALLBACK`]
    /// when the model fails or answers with nothing.
    pub async fn generate_reply(&self, tweet_text: &str) -> String {
        let messages = [ChatMessage::user(prompts::reply_user(tweet_text))];
        match self.model().complete(&messages).await {
            Ok(reply) => {
                let reply = reply.trim().trim_matches('"').trim();
                if reply.is_empty() {
                    prompts::REPLY_FALLBACK.to_string()
                } else {
                    reply.to_string()
                }
            }
            Err(e) => {
                tracing::warn!("Reply generation failed: {}", e);
                prompts::REPLY_FALLBACK.to_string()
            }
        }
    }
}

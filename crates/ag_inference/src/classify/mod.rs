//! LLM-backed judgements. Every call degrades to a safe default instead of
//! returning an error.

use ag_core::{ChatMessage, LanguageModel};
use std::fmt;
use std::sync::Arc;

mod article;
mod email;
mod index_links;
mod item;
mod page;
mod reply;
mod selector;
mod tweet;

pub use email::EmailEnhancement;

/// Cap on the page text sent for page-type classification.
pub const PAGE_TEXT_LIMIT: usize = 15_000;
/// Cap on the article body sent for date-selector inference.
pub const SELECTOR_SNIPPET_LIMIT: usize = 8_000;
/// Cap on the anchor list sent for index shortlisting.
pub const MAX_LINK_ENTRIES: usize = 200;

#[derive(Clone)]
pub struct Classifier {
    model: Arc<dyn LanguageModel>,
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("model", &self.model.name())
            .finish()
    }
}

impl Classifier {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &Arc<dyn LanguageModel> {
        &self.model
    }

    /// System + user exchange; `None` when the model call fails.
    async fn ask(&self, system: &str, user: String) -> Option<String> {
        let messages = [ChatMessage::system(system), ChatMessage::user(user)];
        match self.model.complete(&messages).await {
            Ok(reply) => Some(reply),
            Err(e) => {
                tracing::warn!("{} call failed: {}", self.model.name(), e);
                None
            }
        }
    }
}

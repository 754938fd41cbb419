use super::Classifier;
use crate::json_reply::extract_object;
use crate::prompts;
use ag_core::{Classification, ItemAnalysis};
use serde_json::Value;

impl Classifier {
    /// Analyses one collected item for the context agent.
    ///
    /// Returns `None` when the model answers `{}`, reports the item as not
    /// actionable, or its reply cannot be parsed.
    pub async fn analyze_item(
        &self,
        profile: &Value,
        rag_context: &str,
        item: &Value,
    ) -> Option<ItemAnalysis> {
        let profile_json = serde_json::to_string_pretty(profile).unwrap_or_default();
        let item_json = serde_json::to_string_pretty(item).unwrap_or_default();
        let reply = self
            .ask(
                prompts::ITEM_SYSTEM,
                prompts::item_user(&profile_json, rag_context, &item_json),
            )
            .await?;

        let Some(obj) = extract_object(&reply) else {
            tracing::warn!("Unparsable item analysis: {}", reply);
            return None;
        };
        let analysis = obj.get("analysis").filter(|a| a.is_object())?;
        let classification = Classification::from_value(analysis);
        if !classification.actionable {
            return None;
        }

        let original_item = match obj.get("original_item") {
            Some(original) if original.is_object() => original.clone(),
            _ => item.clone(),
        };
        Some(ItemAnalysis {
            original_item,
            analysis: classification,
        })
    }
}

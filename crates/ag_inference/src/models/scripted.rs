use ag_core::{ChatMessage, Error, LanguageModel, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;

type Responder = Box<dyn Fn(&[ChatMessage]) -> Option<String> + Send + Sync>;

/// Deterministic model for offline runs and tests.
///
/// Replies come from the queue first, then from the responder, then the
/// fallback. With none of those it fails like an unreachable endpoint.
pub struct ScriptedModel {
    queue: Mutex<VecDeque<String>>,
    responder: Option<Responder>,
    fallback: Option<String>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl Default for ScriptedModel {
    fn default() -> Self {
        Self::new(Vec::<String>::new()).with_fallback("{}")
    }
}

impl ScriptedModel {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queue: Mutex::new(replies.into_iter().map(Into::into).collect()),
            responder: None,
            fallback: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A model whose every call fails.
    pub fn failing() -> Self {
        Self::new(Vec::<String>::new())
    }

    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&[ChatMessage]) -> Option<String> + Send + Sync + 'static,
    {
        let mut model = Self::new(Vec::<String>::new());
        model.responder = Some(Box::new(responder));
        model
    }

    pub fn with_fallback(mut self, reply: impl Into<String>) -> Self {
        self.fallback = Some(reply.into());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Concatenated message text of every call so far.
    pub fn prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| {
                calls
                    .iter()
                    .map(|msgs| {
                        msgs.iter()
                            .map(|m| m.content.as_str())
                            .collect::<Vec<_>>()
                            .join("\n")
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl fmt::Debug for ScriptedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedModel")
            .field("calls", &self.call_count())
            .field("fallback", &self.fallback)
            .finish()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(messages.to_vec());
        }

        let queued = self.queue.lock().ok().and_then(|mut q| q.pop_front());
        queued
            .or_else(|| self.responder.as_ref().and_then(|r| r(messages)))
            .or_else(|| self.fallback.clone())
            .ok_or_else(|| Error::Inference("scripted model has no reply".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_then_fallback() {
        let model = ScriptedModel::new(["first"]).with_fallback("rest");
        assert_eq!(model.prompt("a").await.unwrap(), "first");
        assert_eq!(model.prompt("b").await.unwrap(), "rest");
        assert_eq!(model.call_count(), 2);
        assert_eq!(model.prompts()[1], "b");
    }

    #[tokio::test]
    async fn test_responder_and_failure() {
        let model = ScriptedModel::from_fn(|msgs| {
            msgs.iter()
                .any(|m| m.content.contains("ping"))
                .then(|| "pong".to_string())
        });
        assert_eq!(model.prompt("ping").await.unwrap(), "pong");
        assert!(model.prompt("other").await.is_err());
        assert!(ScriptedModel::failing().prompt("x").await.is_err());
    }
}

use async_trait::async_trait;

/// Source of recent business context about a client, fed to classifiers.
#[async_trait]
pub trait ContextProvider: Send + Sync {
    /// Newline-joined context lines; empty when nothing is known.
    async fn client_context(&self, client_name: &str) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoContext;

#[async_trait]
impl ContextProvider for NoContext {
    async fn client_context(&self, _client_name: &str) -> String {
        String::new()
    }
}

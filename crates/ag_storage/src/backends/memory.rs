use crate::DocumentBackend;
use ag_core::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-process document, shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    contents: Arc<RwLock<Option<String>>>,
}

impl MemoryBackend {
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Arc::new(RwLock::new(Some(contents.into()))),
        }
    }
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    async fn load(&self) -> Result<Option<String>> {
        Ok(self.contents.read().await.clone())
    }

    async fn save(&self, contents: &str) -> Result<()> {
        *self.contents.write().await = Some(contents.to_string());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory://".to_string()
    }
}

use crate::{DocumentBackend, JsonDocument};
use ag_core::{Result, SiteState, TwitterCursor};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Keyed state blob; every update rewrites the whole map, last writer wins.
#[derive(Debug, Clone)]
pub struct StateDocument<V> {
    doc: JsonDocument<BTreeMap<String, V>>,
}

/// Scraping state keyed by `client|base_url`.
pub type ScrapingStateStore = StateDocument<SiteState>;

/// Twitter cursors keyed by client name.
pub type TwitterStateStore = StateDocument<TwitterCursor>;

impl<V> StateDocument<V>
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self {
            doc: JsonDocument::new(backend),
        }
    }

    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            doc: JsonDocument::file(path),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            doc: JsonDocument::memory(),
        }
    }

    pub async fn load(&self) -> BTreeMap<String, V> {
        self.doc.load().await
    }

    pub async fn save(&self, state: &BTreeMap<String, V>) -> Result<()> {
        self.doc.save(state).await?;
        tracing::debug!("Saved {} state entries to {}", state.len(), self.doc.describe());
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        self.load().await.get(key).cloned()
    }

    /// Replaces one entry and rewrites the document.
    pub async fn put(&self, key: &str, value: V) -> Result<()> {
        let mut state = self.load().await;
        state.insert(key.to_string(), value);
        self.save(&state).await
    }
}

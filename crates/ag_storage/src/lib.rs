use ag_core::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;

pub mod articles;
pub mod backends;
pub mod payload_log;
pub mod state;
pub mod tweets;

pub use articles::ArticleStore;
pub use backends::*;
pub use payload_log::{PayloadLog, PayloadLogEntry};
pub use state::{ScrapingStateStore, StateDocument, TwitterStateStore};
pub use tweets::TweetStore;

/// Raw storage for a single JSON document.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Current contents, `None` when nothing has been written yet
    async fn load(&self) -> Result<Option<String>>;

    /// Replace the whole document
    async fn save(&self, contents: &str) -> Result<()>;

    /// Human readable location for logs
    fn describe(&self) -> String;
}

/// A typed JSON document read and rewritten wholesale.
///
/// A missing or unparsable document reads as `T::default()`.
pub struct JsonDocument<T> {
    backend: Arc<dyn DocumentBackend>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for JsonDocument<T> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for JsonDocument<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonDocument")
            .field("backend", &self.backend.describe())
            .finish()
    }
}

impl<T> JsonDocument<T>
where
    T: Serialize + DeserializeOwned + Default + Send,
{
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self {
            backend,
            _marker: PhantomData,
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(JsonFileBackend::new(path)))
    }

    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryBackend::default()))
    }

    pub async fn load(&self) -> T {
        let raw = match self.backend.load().await {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", self.backend.describe(), e);
                return T::default();
            }
        };
        if raw.trim().is_empty() {
            return T::default();
        }
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Ignoring unreadable document {}: {}", self.backend.describe(), e);
                T::default()
            }
        }
    }

    pub async fn save(&self, value: &T) -> Result<()> {
        let raw = serde_json::to_string_pretty(value)?;
        self.backend.save(&raw).await
    }

    pub fn describe(&self) -> String {
        self.backend.describe()
    }
}

use crate::{DocumentBackend, JsonDocument};
use ag_core::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadLogEntry {
    pub source: String,
    pub payload: Value,
    #[serde(default = "Utc::now")]
    pub logged_at: DateTime<Utc>,
}

/// Local copy of every payload handed to the dashboard.
#[derive(Debug, Clone)]
pub struct PayloadLog {
    doc: JsonDocument<Vec<PayloadLogEntry>>,
}

impl PayloadLog {
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

    pub async fn entries(&self) -> Vec<PayloadLogEntry> {
        self.doc.load().await
    }

    pub async fn append(&self, source: &str, payload: &Value) -> Result<()> {
        let mut entries = self.entries().await;
        entries.push(PayloadLogEntry {
            source: source.to_string(),
            payload: payload.clone(),
            logged_at: Utc::now(),
        });
        self.doc.save(&entries).await
    }
}

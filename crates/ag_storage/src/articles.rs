use crate::{DocumentBackend, JsonDocument};
use ag_core::{Result, ScrapedArticle};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Output file of the article scraper; also the processed-URL set.
#[derive(Debug, Clone)]
pub struct ArticleStore {
    doc: JsonDocument<Vec<ScrapedArticle>>,
}

impl ArticleStore {
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

    pub async fn load(&self) -> Vec<ScrapedArticle> {
        self.doc.load().await
    }

    pub async fn processed_urls(&self) -> HashSet<String> {
        self.load().await.into_iter().map(|a| a.url).collect()
    }

    /// Appends articles whose URL is not stored yet. Returns how many were added.
    pub async fn append(&self, articles: &[ScrapedArticle]) -> Result<usize> {
        if articles.is_empty() {
            return Ok(0);
        }
        let mut stored = self.load().await;
        let mut seen: HashSet<String> = stored.iter().map(|a| a.url.clone()).collect();
        let before = stored.len();
        for article in articles {
            if seen.insert(article.url.clone()) {
                stored.push(article.clone());
            }
        }
        let added = stored.len() - before;
        if added > 0 {
            self.doc.save(&stored).await?;
            tracing::info!("Saved {} new articles to {}", added, self.doc.describe());
        }
        Ok(added)
    }
}

use crate::{DocumentBackend, JsonDocument};
use ag_core::{Result, TweetRecord, TweetStatus};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Collected tweets awaiting review, stored as one JSON array.
#[derive(Debug, Clone)]
pub struct TweetStore {
    doc: JsonDocument<Vec<TweetRecord>>,
}

fn dedup_key(tweet: &TweetRecord) -> (String, String) {
    (tweet.tweet_id.trim().to_string(), tweet.text.trim().to_string())
}

impl TweetStore {
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

    pub async fn load_existing(&self) -> Vec<TweetRecord> {
        self.doc.load().await
    }

    /// IDs of every stored tweet regardless of status.
    pub async fn processed_ids(&self) -> HashSet<String> {
        self.load_existing()
            .await
            .into_iter()
            .map(|t| t.tweet_id)
            .collect()
    }

    pub async fn with_status(&self, status: TweetStatus) -> Vec<TweetRecord> {
        self.load_existing()
            .await
            .into_iter()
            .filter(|t| t.status == status)
            .collect()
    }

    /// Appends tweets not already stored under the same `(id, text)`.
    /// Returns how many were added.
    pub async fn save_new_tweets(&self, new_tweets: &[TweetRecord]) -> Result<usize> {
        let mut existing = self.load_existing().await;
        let mut keys: HashSet<(String, String)> = existing.iter().map(dedup_key).collect();

        let mut added = 0;
        for tweet in new_tweets {
            if keys.insert(dedup_key(tweet)) {
                existing.push(tweet.clone());
                added += 1;
            } else {
                tracing::debug!("Skipping duplicate tweet {}", tweet.tweet_id);
            }
        }

        if added == 0 {
            tracing::info!("No new tweets to save");
            return Ok(0);
        }

        self.doc.save(&existing).await?;
        tracing::info!("Saved {} new tweets to {}", added, self.doc.describe());
        Ok(added)
    }

    /// Returns false when no tweet has `tweet_id`.
    pub async fn update_status(&self, tweet_id: &str, status: TweetStatus) -> Result<bool> {
        self.modify(tweet_id, |t| t.status = status).await
    }

    pub async fn add_reply(&self, tweet_id: &str, reply: &str) -> Result<bool> {
        self.modify(tweet_id, |t| t.reply = Some(reply.to_string())).await
    }

    async fn modify<F>(&self, tweet_id: &str, f: F) -> Result<bool>
    where
        F: FnOnce(&mut TweetRecord),
    {
        let mut tweets = self.load_existing().await;
        let Some(tweet) = tweets.iter_mut().find(|t| t.tweet_id == tweet_id) else {
            tracing::warn!("Tweet {} not found", tweet_id);
            return Ok(false);
        };
        f(tweet);
        self.doc.save(&tweets).await?;
        Ok(true)
    }
}

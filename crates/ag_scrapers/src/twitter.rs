//! Profile timeline collection with a per-client "last seen tweet" cursor.

use crate::fetch::Fetcher;
use crate::html::selector;
use ag_core::{
    AppConfig, Error, MonitoredProfile, Result, TweetRecord, TweetStatus, TwitterConfig, TwitterCursor,
};
use ag_storage::{JsonDocument, TweetStore, TwitterStateStore};
use async_trait::async_trait;
use scraper::Html;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// Tweets kept from a profile that has never been scanned.
pub const FIRST_SCAN_LIMIT: usize = 10;

const TWITTER_ROOT: &str = "https://twitter.com";

/// Where rendered timeline HTML comes from.
#[async_trait]
pub trait TimelineSource: Send + Sync {
    /// Rendered HTML of the profile's timeline
    async fn fetch_timeline(&self, profile_url: &str) -> Result<String>;
}

/// Fetches timelines over HTTP, directly or through a headless-render endpoint
/// called as `GET {endpoint}?url={profile_url}`.
#[derive(Debug, Clone)]
pub struct HttpTimelineSource {
    fetcher: Fetcher,
    render_endpoint: Option<String>,
}

impl HttpTimelineSource {
    pub fn new(fetcher: Fetcher, render_endpoint: Option<String>) -> Self {
        Self {
            fetcher,
            render_endpoint,
        }
    }
}

#[async_trait]
impl TimelineSource for HttpTimelineSource {
    async fn fetch_timeline(&self, profile_url: &str) -> Result<String> {
        let url = match &self.render_endpoint {
            Some(endpoint) => Url::parse_with_params(endpoint, &[("url", profile_url)])?.to_string(),
            None => profile_url.to_string(),
        };
        self.fetcher
            .get_html(&url)
            .await
            .ok_or_else(|| Error::Scraping(format!("Timeline unavailable for {}", profile_url)))
    }
}

/// Tweets of a rendered timeline in page order, newest first on a normal profile.
pub fn parse_timeline(html: &str, client_name: &str) -> Vec<TweetRecord> {
    let document = Html::parse_document(html);
    let article = selector("article[data-testid='tweet']");
    let status_link = selector("a[href*='/status/']");
    let text_div = selector("div[data-testid='tweetText']");
    let time = selector("time[datetime]");
    let Ok(root) = Url::parse(TWITTER_ROOT) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut tweets = Vec::new();
    for node in document.select(&article) {
        let Some(url) = node
            .select(&status_link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| root.join(href).ok())
        else {
            continue;
        };
        let Some(tweet_id) = status_id(&url) else {
            continue;
        };

        let text = node
            .select(&text_div)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();
        if text.is_empty() || !seen.insert(tweet_id.clone()) {
            continue;
        }
        let created_at = node
            .select(&time)
            .next()
            .and_then(|t| t.value().attr("datetime"))
            .unwrap_or_default()
            .to_string();

        tweets.push(TweetRecord {
            tweet_id,
            client_name: client_name.to_string(),
            text,
            url: url.to_string(),
            created_at,
            status: TweetStatus::Pending,
            reply: None,
        });
    }
    tweets
}

/// The segment following `/status/` in a tweet permalink.
fn status_id(url: &Url) -> Option<String> {
    let segments: Vec<&str> = url.path_segments()?.collect();
    let pos = segments.iter().position(|s| *s == "status")?;
    segments
        .get(pos + 1)
        .filter(|id| !id.is_empty())
        .map(|id| id.to_string())
}

/// Newest tweet by `created_at`, ties broken by numeric id.
fn newest(tweets: &[TweetRecord]) -> Option<&TweetRecord> {
    tweets.iter().max_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| numeric_id(&a.tweet_id).cmp(&numeric_id(&b.tweet_id)))
    })
}

fn numeric_id(id: &str) -> Option<u64> {
    id.parse().ok()
}

/// Whether `candidate` should replace the stored cursor.
fn advances_cursor(stored: Option<&str>, candidate: &str) -> bool {
    match (stored.and_then(numeric_id), numeric_id(candidate)) {
        (Some(stored), Some(candidate)) => candidate > stored,
        _ => stored != Some(candidate),
    }
}

/// Reads the monitored-profile list; a missing file means nothing to monitor.
pub async fn load_twitter_config(path: &Path) -> TwitterConfig {
    JsonDocument::<TwitterConfig>::file(path).load().await
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TwitterRunSummary {
    pub profiles: usize,
    pub scraped: usize,
    pub saved: usize,
    /// Tweets collected in this run, for classification downstream.
    pub tweets: Vec<TweetRecord>,
}

pub struct TwitterScraper {
    source: Arc<dyn TimelineSource>,
    cursors: TwitterStateStore,
    tweets: TweetStore,
}

impl TwitterScraper {
    pub fn new(source: Arc<dyn TimelineSource>, cursors: TwitterStateStore, tweets: TweetStore) -> Self {
        Self {
            source,
            cursors,
            tweets,
        }
    }

    /// HTTP timeline source plus the data-directory stores named by `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let source = HttpTimelineSource::new(Fetcher::new()?, config.render_endpoint.clone());
        Ok(Self::new(
            Arc::new(source),
            TwitterStateStore::open(config.twitter_state_path()),
            TweetStore::open(config.tweets_path()),
        ))
    }

    /// New tweets of one profile, stopping at `last_id` or, on a first scan,
    /// after [`FIRST_SCAN_LIMIT`] tweets.
    pub async fn scrape_profile(&self, profile: &MonitoredProfile, last_id: Option<&str>) -> Vec<TweetRecord> {
        match last_id {
            Some(id) => tracing::info!("Checking {} -> {} from tweet {}", profile.client_name, profile.profile_url, id),
            None => tracing::info!("First scan of {} -> {}", profile.client_name, profile.profile_url),
        }
        let html = match self.source.fetch_timeline(&profile.profile_url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Could not load {}: {}", profile.profile_url, e);
                return Vec::new();
            }
        };

        let mut collected = Vec::new();
        for tweet in parse_timeline(&html, &profile.client_name) {
            if Some(tweet.tweet_id.as_str()) == last_id {
                tracing::info!("Reached last scraped tweet {}", tweet.tweet_id);
                break;
            }
            collected.push(tweet);
            if last_id.is_none() && collected.len() >= FIRST_SCAN_LIMIT {
                break;
            }
        }
        collected
    }

    /// Scans every monitored profile, stores new tweets and advances cursors.
    pub async fn run(&self, config: &TwitterConfig) -> Result<TwitterRunSummary> {
        let mut summary = TwitterRunSummary::default();
        if config.monitored_urls.is_empty() {
            tracing::warn!("No monitored profiles configured");
            return Ok(summary);
        }

        let mut cursors = self.cursors.load().await;
        let mut cursors_changed = false;

        for profile in &config.monitored_urls {
            if profile.client_name.trim().is_empty() || profile.profile_url.trim().is_empty() {
                continue;
            }
            summary.profiles += 1;
            let stored = cursors
                .get(&profile.client_name)
                .and_then(|c| c.last_scraped_tweet_id.clone());
            let tweets = self.scrape_profile(profile, stored.as_deref()).await;

            if let Some(latest) = newest(&tweets) {
                if advances_cursor(stored.as_deref(), &latest.tweet_id) {
                    tracing::info!("Cursor for {} is now {}", profile.client_name, latest.tweet_id);
                    cursors.insert(
                        profile.client_name.clone(),
                        TwitterCursor {
                            last_scraped_tweet_id: Some(latest.tweet_id.clone()),
                        },
                    );
                    cursors_changed = true;
                }
            }
            summary.tweets.extend(tweets);
        }

        summary.scraped = summary.tweets.len();
        summary.saved = self.tweets.save_new_tweets(&summary.tweets).await?;
        if cursors_changed {
            self.cursors.save(&cursors).await?;
        }
        Ok(summary)
    }
}

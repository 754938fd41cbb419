//! Incremental article collection per client site.

use crate::articles::{fetch_article, find_individual_article_links};
use crate::blog_index::BlogIndexProcessor;
use crate::fetch::Fetcher;
use crate::html::{self, SELECTOR_NOISE};
use crate::logging::Logger;
use ag_core::{client_key, AppConfig, Result, ScrapedArticle, SiteState, DATE_FORMAT};
use ag_inference::Classifier;
use ag_storage::{ArticleStore, ScrapingStateStore};
use chrono::{Duration, NaiveDate, Utc};
use scraper::Html;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Lookback for a site without a stored cursor.
pub const LOOKBACK_DAYS: i64 = 30;
pub const FIRST_SCAN_LIMIT: usize = 50;
pub const INCREMENTAL_LIMIT: usize = 20;
/// An index is abandoned after this many consecutive articles older than the cutoff.
pub const MAX_CONSECUTIVE_OLD: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScrapeSummary {
    pub client_key: String,
    pub indexes: usize,
    pub new_articles: usize,
    pub latest_article_date: Option<String>,
    /// Articles collected by this run.
    #[serde(skip)]
    pub articles: Vec<ScrapedArticle>,
}

/// A candidate article, with the date its feed entry announced if it came from a feed.
struct Candidate {
    url: String,
    feed_date: Option<NaiveDate>,
}

pub struct ArticleScraper {
    processor: BlogIndexProcessor,
    state: ScrapingStateStore,
    articles: ArticleStore,
    processed_urls: HashSet<String>,
    today: Option<NaiveDate>,
}

impl ArticleScraper {
    /// Loads the processed-URL set from the article store.
    pub async fn new(processor: BlogIndexProcessor, state: ScrapingStateStore, articles: ArticleStore) -> Self {
        let processed_urls = articles.processed_urls().await;
        tracing::info!("Loaded {} processed article URLs", processed_urls.len());
        Self {
            processor,
            state,
            articles,
            processed_urls,
            today: None,
        }
    }

    /// Scraper over the data-directory stores named by `config`.
    pub async fn from_config(config: &AppConfig, classifier: Classifier) -> Result<Self> {
        let processor = BlogIndexProcessor::new(Fetcher::new()?, classifier);
        Ok(Self::new(
            processor,
            ScrapingStateStore::open(config.scraping_state_path()),
            ArticleStore::open(config.articles_path()),
        )
        .await)
    }

    /// Pins "today" for the lookback window.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    async fn save_site(&self, state: &mut BTreeMap<String, SiteState>, key: &str, site: &SiteState) -> Result<()> {
        state.insert(key.to_string(), site.clone());
        self.state.save(state).await
    }

    /// Asks the model for a date selector using the first article of `index_url`.
    async fn infer_date_selector(&self, index_url: &str, rejected: &HashSet<String>, logger: &Logger) -> Option<String> {
        let fetcher = self.processor.fetcher();
        let links = find_individual_article_links(fetcher, index_url, rejected, FIRST_SCAN_LIMIT).await;
        let Some(first) = links.first() else {
            logger.warn(&format!("No article links on {} to infer a date selector", index_url));
            return None;
        };
        let body = fetcher.get_html(first).await?;
        let text = {
            let document = Html::parse_document(&body);
            html::visible_text(&document, SELECTOR_NOISE)
        };
        self.processor.classifier().find_date_selector(first, &text).await
    }

    /// Entries of the first feed that parses, newest first as the feed lists them.
    async fn feed_candidates(&self, feed_urls: &[String], limit: usize) -> Vec<Candidate> {
        for feed_url in feed_urls {
            let Some(bytes) = self.processor.fetcher().get_bytes(feed_url).await else {
                continue;
            };
            let feed = match feed_rs::parser::parse(bytes.as_slice()) {
                Ok(feed) => feed,
                Err(e) => {
                    tracing::warn!("Unparsable feed {}: {}", feed_url, e);
                    continue;
                }
            };
            return feed
                .entries
                .into_iter()
                .filter_map(|entry| {
                    let url = entry.links.first()?.href.clone();
                    let feed_date = entry.published.or(entry.updated).map(|dt| dt.date_naive());
                    Some(Candidate { url, feed_date })
                })
                .take(limit)
                .collect();
        }
        Vec::new()
    }

    /// Collects articles published since the site's cursor and advances it.
    ///
    /// Runs index discovery first when the site has no state yet.
    pub async fn run(&mut self, base_url: &str, client_name: &str) -> Result<ScrapeSummary> {
        let key = client_key(client_name, base_url);
        let logger = Logger::new().with_prefix(format!("[{}]", key));
        let mut state = self.state.load().await;

        if !state.contains_key(&key) {
            logger.info("No scraping state yet, running index discovery");
            self.processor.process_website(base_url, client_name, &mut state).await;
            self.state.save(&state).await?;
        }
        let mut site = state.get(&key).cloned().unwrap_or_default();
        let mut summary = ScrapeSummary {
            client_key: key.clone(),
            indexes: site.blog_index_urls.len(),
            latest_article_date: site.latest_article_date.clone(),
            ..Default::default()
        };

        if site.blog_index_urls.is_empty() {
            logger.warn("No blog index URLs found");
            return Ok(summary);
        }
        let rejected: HashSet<String> = site.rejected_index_urls.iter().cloned().collect();

        if site.date_selector.is_none() {
            logger.info("No date selector stored, asking the model");
            if let Some(selector) = self.infer_date_selector(&site.blog_index_urls[0], &rejected, &logger).await {
                site.date_selector = Some(selector);
                self.save_site(&mut state, &key, &site).await?;
            }
        }

        let stored_cursor = site.latest_date();
        let cutoff = stored_cursor.unwrap_or_else(|| self.today() - Duration::days(LOOKBACK_DAYS));
        let limit = if stored_cursor.is_none() { FIRST_SCAN_LIMIT } else { INCREMENTAL_LIMIT };
        logger.info(&format!("Using cutoff {} and limit {}", cutoff.format(DATE_FORMAT), limit));

        let fetcher = self.processor.fetcher().clone();
        let mut new_articles: Vec<ScrapedArticle> = Vec::new();
        let mut newest: Option<NaiveDate> = None;

        for index_url in &site.blog_index_urls {
            let links = find_individual_article_links(&fetcher, index_url, &rejected, limit).await;
            let candidates = if links.is_empty() && !site.feed_urls.is_empty() {
                logger.info(&format!("No article links on {}, reading feeds", index_url));
                self.feed_candidates(&site.feed_urls, limit).await
            } else {
                links
                    .into_iter()
                    .map(|url| Candidate { url, feed_date: None })
                    .collect()
            };
            logger.info(&format!("{} potential articles in {}", candidates.len(), index_url));

            let mut consecutive_old = 0;
            for candidate in candidates {
                if self.processed_urls.contains(&candidate.url) {
                    continue;
                }
                let Some(mut article) = fetch_article(&fetcher, &candidate.url, site.date_selector.as_deref()).await else {
                    continue;
                };
                article.publish_date = candidate.feed_date.or(article.publish_date);
                let Some(date) = article.publish_date else {
                    logger.debug(&format!("No publish date for {}", candidate.url));
                    continue;
                };

                if date < cutoff {
                    consecutive_old += 1;
                    if consecutive_old >= MAX_CONSECUTIVE_OLD {
                        logger.info(&format!("{} old articles in a row, leaving {}", consecutive_old, index_url));
                        break;
                    }
                    continue;
                }
                consecutive_old = 0;

                article.client_name = client_name.to_string();
                self.processed_urls.insert(candidate.url);
                newest = newest.max(Some(date));
                new_articles.push(article);
            }
        }

        if new_articles.is_empty() {
            logger.info("No new articles found meeting the criteria");
        } else {
            summary.new_articles = self.articles.append(&new_articles).await?;
        }
        summary.articles = new_articles;

        if let Some(newest) = newest {
            if site.advance_latest_date(newest) {
                logger.info(&format!("Updated latest_article_date to {}", newest.format(DATE_FORMAT)));
                self.save_site(&mut state, &key, &site).await?;
            }
        }
        summary.latest_article_date = site.latest_article_date.clone();
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::Fetcher;
    use ag_inference::prelude::ScriptedModel;
    use ag_inference::Classifier;
    use mockito::{Server, ServerGuard};
    use std::sync::Arc;

    fn page(date: &str) -> String {
        format!(
            r#"<html><head><title>Post</title></head><body><time class="published" datetime="{}">x</time><p>Body</p></body></html>"#,
            date
        )
    }

    async fn serve(server: &mut ServerGuard, path: &str, body: String) {
        server
            .mock("GET", path)
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;
    }

    fn processor(model: ScriptedModel) -> BlogIndexProcessor {
        BlogIndexProcessor::new(Fetcher::new().unwrap(), Classifier::new(Arc::new(model)))
    }

    fn site(index: String, selector: Option<&str>, latest: Option<&str>) -> SiteState {
        SiteState {
            blog_index_urls: vec![index],
            date_selector: selector.map(str::to_string),
            latest_article_date: latest.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_incremental_run_stops_after_old_streak() {
        let mut server = Server::new_async().await;
        let links: String = [
            "seen", "new-1", "undated", "new-2", "old-1", "old-2", "old-3", "old-4", "old-5", "new-3",
        ]
        .iter()
        .map(|slug| format!(r#"<a href="/blog/{}">{}</a>"#, slug, slug))
        .collect();
        serve(&mut server, "/blog", links).await;
        serve(&mut server, "/blog/new-1", page("2025-03-10")).await;
        serve(&mut server, "/blog/new-2", page("2025-03-05")).await;
        serve(&mut server, "/blog/undated", "<html><body>no date</body></html>".into()).await;
        for i in 1..=5 {
            serve(&mut server, &format!("/blog/old-{}", i), page("2025-01-15")).await;
        }
        let never = server.mock("GET", "/blog/new-3").expect(0).create_async().await;
        let seen_mock = server.mock("GET", "/blog/seen").expect(0).create_async().await;

        let base_url = server.url();
        let key = client_key("Acme", &base_url);
        let state = ScrapingStateStore::in_memory();
        let mut initial = BTreeMap::new();
        initial.insert(
            key.clone(),
            site(format!("{}/blog", base_url), Some("time.published"), Some("2025-03-01")),
        );
        state.save(&initial).await.unwrap();

        let articles = ArticleStore::in_memory();
        articles
            .append(&[ScrapedArticle {
                url: format!("{}/blog/seen", base_url),
                title: String::new(),
                authors: Vec::new(),
                text: String::new(),
                publish_date: None,
                client_name: "Acme".into(),
                scraped_at: Utc::now(),
            }])
            .await
            .unwrap();

        let mut scraper = ArticleScraper::new(processor(ScriptedModel::failing()), state.clone(), articles.clone()).await;
        let summary = scraper.run(&base_url, "Acme").await.unwrap();

        assert_eq!(summary.new_articles, 2);
        assert_eq!(summary.articles.len(), 2);
        assert!(summary.articles.iter().all(|a| a.client_name == "Acme"));
        assert_eq!(summary.latest_article_date.as_deref(), Some("2025-03-10"));
        let stored: Vec<String> = articles.load().await.into_iter().map(|a| a.url).collect();
        assert!(stored.contains(&format!("{}/blog/new-1", base_url)));
        assert!(stored.contains(&format!("{}/blog/new-2", base_url)));
        assert_eq!(stored.len(), 3);
        assert_eq!(
            state.get(&key).await.unwrap().latest_article_date.as_deref(),
            Some("2025-03-10")
        );
        never.assert_async().await;
        seen_mock.assert_async().await;

        // A second run finds nothing new and leaves the cursor alone.
        let summary = scraper.run(&base_url, "Acme").await.unwrap();
        assert_eq!(summary.new_articles, 0);
        assert!(summary.articles.is_empty());
        assert_eq!(summary.latest_article_date.as_deref(), Some("2025-03-10"));
    }

    #[tokio::test]
    async fn test_first_run_infers_selector() {
        let mut server = Server::new_async().await;
        serve(&mut server, "/news", r#"<a href="/news/launch">Launch</a>"#.into()).await;
        serve(
            &mut server,
            "/news/launch",
            r#"<html><body><span class="date">2025-05-20</span><p>2019-01-01 archive</p></body></html>"#.into(),
        )
        .await;

        let base_url = server.url();
        let key = client_key("Acme", &base_url);
        let state = ScrapingStateStore::in_memory();
        let mut initial = BTreeMap::new();
        initial.insert(key.clone(), site(format!("{}/news", base_url), None, None));
        state.save(&initial).await.unwrap();

        let model = ScriptedModel::new([r#"{"selector": "span.date"}"#]);
        let mut scraper = ArticleScraper::new(processor(model), state.clone(), ArticleStore::in_memory())
            .await
            .with_today(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        let summary = scraper.run(&base_url, "Acme").await.unwrap();

        assert_eq!(summary.new_articles, 1);
        let saved = state.get(&key).await.unwrap();
        assert_eq!(saved.date_selector.as_deref(), Some("span.date"));
        assert_eq!(saved.latest_article_date.as_deref(), Some("2025-05-20"));
    }

    #[tokio::test]
    async fn test_feed_fallback_supplies_dates() {
        let mut server = Server::new_async().await;
        let base_url = server.url();
        serve(&mut server, "/blog", "<html><body>Rendered client-side</body></html>".into()).await;
        let rss = format!(
            r#"<?xml version="1.0"?><rss version="2.0"><channel><title>Acme</title>
            <item><title>Launch</title><link>{}/blog/launch</link><pubDate>Tue, 20 May 2025 10:00:00 GMT</pubDate></item>
            </channel></rss>"#,
            base_url
        );
        server
            .mock("GET", "/blog/feed")
            .with_status(200)
            .with_header("content-type", "application/rss+xml")
            .with_body(rss)
            .create_async()
            .await;
        serve(&mut server, "/blog/launch", "<html><body><h1>Launch</h1></body></html>".into()).await;

        let key = client_key("Acme", &base_url);
        let state = ScrapingStateStore::in_memory();
        let mut entry = site(format!("{}/blog", base_url), Some("time"), Some("2025-05-01"));
        entry.feed_urls = vec![format!("{}/blog/feed", base_url)];
        let mut initial = BTreeMap::new();
        initial.insert(key.clone(), entry);
        state.save(&initial).await.unwrap();

        let articles = ArticleStore::in_memory();
        let mut scraper = ArticleScraper::new(processor(ScriptedModel::failing()), state.clone(), articles.clone()).await;
        let summary = scraper.run(&base_url, "Acme").await.unwrap();

        assert_eq!(summary.new_articles, 1);
        let stored = articles.load().await;
        assert_eq!(stored[0].title, "Launch");
        assert_eq!(stored[0].publish_date, NaiveDate::from_ymd_opt(2025, 5, 20));
        assert_eq!(stored[0].client_name, "Acme");
    }

    #[tokio::test]
    async fn test_no_indexes_is_not_an_error() {
        let state = ScrapingStateStore::in_memory();
        let mut initial = BTreeMap::new();
        initial.insert(client_key("Acme", "https://acme.invalid"), SiteState::default());
        state.save(&initial).await.unwrap();

        let mut scraper = ArticleScraper::new(processor(ScriptedModel::failing()), state, ArticleStore::in_memory()).await;
        let summary = scraper.run("https://acme.invalid", "Acme").await.unwrap();
        assert_eq!(summary.indexes, 0);
        assert_eq!(summary.new_articles, 0);
    }
}

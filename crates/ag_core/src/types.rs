use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Date format used for article dates in state and output files.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Builds the scraping-state key for a client/site pair.
pub fn client_key(client_name: &str, base_url: &str) -> String {
    if client_name.is_empty() {
        base_url.to_string()
    } else {
        format!("{}|{}", client_name, base_url)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TweetStatus {
    #[default]
    Pending,
    Posted,
    Rejected,
}

impl TweetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TweetStatus::Pending => "pending",
            TweetStatus::Posted => "posted",
            TweetStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for TweetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TweetStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(TweetStatus::Pending),
            "posted" => Ok(TweetStatus::Posted),
            "rejected" => Ok(TweetStatus::Rejected),
            other => Err(crate::Error::Validation(format!("Unknown tweet status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TweetRecord {
    #[serde(alias = "id")]
    pub tweet_id: String,
    #[serde(default)]
    pub client_name: String,
    #[serde(alias = "content")]
    pub text: String,
    #[serde(default)]
    pub url: String,
    /// ISO-8601 timestamp as rendered by the timeline; compared lexically.
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub status: TweetStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
}

/// Website record as the dashboard stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub url: String,
    pub title: String,
    pub content: String,
    pub client_name: String,
    pub short_description: String,
    pub actionable: bool,
    pub opportunity_type: String,
    pub suggested_action: String,
    pub relevance: String,
    pub read: bool,
    pub scraped_at: DateTime<Utc>,
}

/// Article as extracted from a site, before classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedArticle {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub publish_date: Option<NaiveDate>,
    #[serde(default)]
    pub client_name: String,
    #[serde(default = "Utc::now")]
    pub scraped_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmailRecord {
    pub id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default, alias = "from")]
    pub sender: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, rename = "labelIds")]
    pub label_ids: Vec<String>,
    #[serde(default)]
    pub actionable: bool,
    #[serde(default)]
    pub suggested_action: String,
    #[serde(default)]
    pub relevance: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_reply: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageType {
    BlogIndex,
    ResourcesMix,
    SingleArticle,
    ProductPage,
    Other,
}

impl PageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::BlogIndex => "BLOG_INDEX",
            PageType::ResourcesMix => "RESOURCES_MIX",
            PageType::SingleArticle => "SINGLE_ARTICLE",
            PageType::ProductPage => "PRODUCT_PAGE",
            PageType::Other => "OTHER",
        }
    }

    /// Lenient parse of an LLM label; anything unrecognised is `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_uppercase().replace([' ', '-'], "_").as_str() {
            "BLOG_INDEX" => PageType::BlogIndex,
            "RESOURCES_MIX" => PageType::ResourcesMix,
            "SINGLE_ARTICLE" => PageType::SingleArticle,
            "PRODUCT_PAGE" => PageType::ProductPage,
            _ => PageType::Other,
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageAnalysis {
    pub page_type: PageType,
    pub reason: String,
}

impl PageAnalysis {
    pub fn new(page_type: PageType, reason: impl Into<String>) -> Self {
        Self {
            page_type,
            reason: reason.into(),
        }
    }

    pub fn other(reason: impl Into<String>) -> Self {
        Self::new(PageType::Other, reason)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDecision {
    pub url: String,
    pub analysis: PageAnalysis,
}

/// Per client/site crawl bookmark.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SiteState {
    #[serde(default)]
    pub blog_index_urls: Vec<String>,
    #[serde(default)]
    pub rejected_index_urls: Vec<String>,
    #[serde(default)]
    pub blog_index_details: Vec<IndexDecision>,
    #[serde(default)]
    pub rejected_index_details: Vec<IndexDecision>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feed_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_article_date: Option<String>,
}

impl SiteState {
    /// Parsed cursor; `None` when absent or malformed.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.latest_article_date
            .as_deref()
            .and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok())
    }

    /// Moves the cursor forward to `date`. Returns false when `date` is not newer.
    pub fn advance_latest_date(&mut self, date: NaiveDate) -> bool {
        match self.latest_date() {
            Some(current) if date <= current => false,
            _ => {
                self.latest_article_date = Some(date.format(DATE_FORMAT).to_string());
                true
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TwitterCursor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_scraped_tweet_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredProfile {
    pub client_name: String,
    pub profile_url: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TwitterConfig {
    #[serde(default)]
    pub monitored_urls: Vec<MonitoredProfile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_key() {
        assert_eq!(client_key("Acme", "https://acme.com"), "Acme|https://acme.com");
        assert_eq!(client_key("", "https://acme.com"), "https://acme.com");
    }

    #[test]
    fn test_latest_date_never_regresses() {
        let mut state = SiteState::default();
        let may = NaiveDate::from_ymd_opt(2025, 5, 10).unwrap();
        let april = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();

        assert!(state.advance_latest_date(may));
        assert!(!state.advance_latest_date(april));
        assert!(!state.advance_latest_date(may));
        assert_eq!(state.latest_article_date.as_deref(), Some("2025-05-10"));
    }

    #[test]
    fn test_malformed_latest_date_is_replaced() {
        let mut state = SiteState {
            latest_article_date: Some("10/05/2025".to_string()),
            ..Default::default()
        };
        assert!(state.latest_date().is_none());
        assert!(state.advance_latest_date(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()));
        assert_eq!(state.latest_article_date.as_deref(), Some("2025-01-02"));
    }

    #[test]
    fn test_page_type_labels() {
        assert_eq!(PageType::from_label("blog_index"), PageType::BlogIndex);
        assert_eq!(PageType::from_label("Resources Mix"), PageType::ResourcesMix);
        assert_eq!(PageType::from_label("landing"), PageType::Other);
        let json = serde_json::to_string(&PageType::SingleArticle).unwrap();
        assert_eq!(json, "\"SINGLE_ARTICLE\"");
    }

    #[test]
    fn test_tweet_record_accepts_legacy_keys() {
        let tweet: TweetRecord = serde_json::from_str(
            r#"{"id": "42", "content": "hello", "client_name": "Acme"}"#,
        )
        .unwrap();
        assert_eq!(tweet.tweet_id, "42");
        assert_eq!(tweet.text, "hello");
        assert_eq!(tweet.status, TweetStatus::Pending);
    }

    #[test]
    fn test_tweet_status_parse() {
        assert_eq!("Posted".parse::<TweetStatus>().unwrap(), TweetStatus::Posted);
        assert!("archived".parse::<TweetStatus>().is_err());
    }
}

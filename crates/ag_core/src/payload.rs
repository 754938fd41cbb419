use crate::classification::{truncate_chars, Classification, PriorityLevel};
use crate::types::{ArticleRecord, TweetRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

pub const DEFAULT_CLIENT_NAME: &str = "SolarisProAi";

const NO_CONTENT: &str = "No content provided";
const NO_DESCRIPTION: &str = "No description provided";
const NO_ACTION: &str = "No specific action suggested";
const UNKNOWN: &str = "unknown";

const FALLBACK_ACTION: &str = "Review and determine next steps.";
const FALLBACK_RELEVANCE: &str = "Importance requires further review.";
const FALLBACK_REPLY: &str = "Thank you for the update!";
const BLANK: &str = " ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Email,
    Tweet,
    Twitter,
    Website,
    Unknown,
}

impl SourceType {
    pub fn from_item(item: &Value) -> Self {
        match item.get("type").and_then(Value::as_str) {
            Some(t) => Self::from_label(t),
            None => SourceType::Unknown,
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "email" => SourceType::Email,
            "tweet" => SourceType::Tweet,
            "twitter" => SourceType::Twitter,
            "website" => SourceType::Website,
            _ => SourceType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Email => "email",
            SourceType::Tweet => "tweet",
            SourceType::Twitter => "twitter",
            SourceType::Website => "website",
            SourceType::Unknown => "unknown",
        }
    }

    /// Dashboard endpoint family; tweets and twitter items share one.
    pub fn channel(&self) -> Option<Channel> {
        match self {
            SourceType::Email => Some(Channel::Email),
            SourceType::Tweet | SourceType::Twitter => Some(Channel::Twitter),
            SourceType::Website => Some(Channel::Website),
            SourceType::Unknown => None,
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Email,
    Twitter,
    Website,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailPayload {
    pub content: String,
    pub client_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub message_id: String,
    pub subject: String,
    pub processed_at: DateTime<Utc>,
    pub actionable: bool,
    pub suggested_action: String,
    pub short_description: String,
    pub relevance: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TweetPayload {
    pub url: String,
    pub text: String,
    pub actionable: bool,
    pub client_name: String,
    pub tweet_id: String,
    pub relevance: String,
    pub suggested_action: String,
    pub short_description: String,
    pub status: String,
    pub reply: String,
}

/// Shape expected by the dashboard's twitter endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwitterPayload {
    pub client_name: String,
    pub short_description: String,
    pub relevance: String,
    pub actionable: bool,
    pub suggested_action: String,
    pub tweet_id: String,
    pub url: String,
    pub text: String,
    pub suggested_reply: String,
    pub urgency: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericPayload {
    pub client_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    pub actionable: bool,
    pub short_description: String,
    pub suggested_action: String,
    pub relevance: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DashboardPayload {
    Email(EmailPayload),
    Tweet(TweetPayload),
    Website(ArticleRecord),
    Generic(GenericPayload),
}

impl DashboardPayload {
    pub fn actionable(&self) -> bool {
        match self {
            DashboardPayload::Email(p) => p.actionable,
            DashboardPayload::Tweet(p) => p.actionable,
            DashboardPayload::Website(p) => p.actionable,
            DashboardPayload::Generic(p) => p.actionable,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn item_str<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| item.get(*k).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
}

fn or_default(value: &str, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

/// Maps a raw item plus its classification into the dashboard shape for the
/// item's source type.
pub fn build_dashboard_payload(
    item: &Value,
    classification: &Classification,
) -> (DashboardPayload, SourceType) {
    let source_type = SourceType::from_item(item);
    let actionable = classification.actionable;
    let description = or_default(&classification.short_description, NO_DESCRIPTION);
    let action = or_default(&classification.suggested_action, NO_ACTION);
    let relevance = or_default(&classification.relevance, UNKNOWN);

    let payload = match source_type {
        SourceType::Email => DashboardPayload::Email(EmailPayload {
            content: item_str(item, &["body", "content"]).unwrap_or(NO_CONTENT).to_string(),
            client_name: item_str(item, &["client_name"])
                .unwrap_or(DEFAULT_CLIENT_NAME)
                .to_string(),
            kind: source_type.as_str().to_string(),
            message_id: Uuid::new_v4().to_string(),
            subject: item_str(item, &["subject"]).unwrap_or("No Subject").to_string(),
            processed_at: Utc::now(),
            actionable,
            suggested_action: action,
            short_description: description,
            relevance,
        }),
        SourceType::Tweet | SourceType::Twitter => {
            let tweet_id = item_str(item, &["tweet_id", "id"])
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            DashboardPayload::Tweet(TweetPayload {
                url: item_str(item, &["url"])
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("https://twitter.com/someuser/status/{}", tweet_id)),
                text: item_str(item, &["content", "text"]).unwrap_or(NO_CONTENT).to_string(),
                actionable,
                client_name: item_str(item, &["client_name"])
                    .unwrap_or(DEFAULT_CLIENT_NAME)
                    .to_string(),
                tweet_id,
                relevance,
                suggested_action: action,
                short_description: description,
                status: item_str(item, &["status"]).unwrap_or("new").to_string(),
                reply: item_str(item, &["reply"]).unwrap_or_default().to_string(),
            })
        }
        SourceType::Website => DashboardPayload::Website(ArticleRecord {
            url: item_str(item, &["url"]).unwrap_or_default().to_string(),
            title: item_str(item, &["title"]).unwrap_or("No Title").to_string(),
            content: item_str(item, &["content", "text"]).unwrap_or(NO_CONTENT).to_string(),
            client_name: item_str(item, &["client_name"])
                .unwrap_or(DEFAULT_CLIENT_NAME)
                .to_string(),
            short_description: description,
            actionable,
            opportunity_type: or_default(&classification.opportunity_type, UNKNOWN),
            suggested_action: action,
            relevance,
            read: false,
            scraped_at: Utc::now(),
        }),
        SourceType::Unknown => DashboardPayload::Generic(GenericPayload {
            client_name: item_str(item, &["client_name"])
                .unwrap_or(DEFAULT_CLIENT_NAME)
                .to_string(),
            kind: item_str(item, &["type"]).unwrap_or(UNKNOWN).to_string(),
            content: item_str(item, &["content", "text", "body"])
                .unwrap_or(NO_CONTENT)
                .to_string(),
            actionable,
            short_description: description,
            suggested_action: action,
            relevance,
        }),
    };

    (payload, source_type)
}

/// Builds the twitter-endpoint payload, filling gaps left by the classifier.
pub fn build_twitter_payload(tweet: &TweetRecord, classification: &Classification) -> TwitterPayload {
    let actionable = classification.actionable;
    let text = or_default(&tweet.text, NO_CONTENT);

    let short_description = if classification.short_description.trim().is_empty() {
        if text.chars().count() > 50 {
            format!("{}...", truncate_chars(&text, 47))
        } else {
            text.clone()
        }
    } else {
        classification.short_description.clone()
    };

    let fill = |value: &str, fallback: &str| {
        if !actionable {
            BLANK.to_string()
        } else {
            or_default(value, fallback)
        }
    };

    let urgency = if actionable {
        classification.priority_level.urgency()
    } else {
        PriorityLevel::Neutral.urgency()
    };

    TwitterPayload {
        client_name: or_default(&tweet.client_name, DEFAULT_CLIENT_NAME),
        short_description: truncate_chars(&short_description, 50),
        relevance: fill(&classification.relevance, FALLBACK_RELEVANCE),
        actionable,
        suggested_action: fill(&classification.suggested_action, FALLBACK_ACTION),
        tweet_id: or_default(&tweet.tweet_id, "000000000"),
        url: or_default(&tweet.url, "https://twitter.com/unknown/status/00000"),
        text,
        suggested_reply: fill(&classification.suggested_reply, FALLBACK_REPLY),
        urgency,
    }
}

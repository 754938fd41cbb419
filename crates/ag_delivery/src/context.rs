use crate::api_client::API_KEY_HEADER;
use ag_core::classification::truncate_chars;
use ag_core::{AppConfig, ContextProvider, EndpointConfig, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

pub const CONTEXT_LIMIT: u32 = 3;
pub const MAX_ITEM_CHARS: usize = 1000;
pub const MAX_CONTEXT_CHARS: usize = 6000;

const CONTEXT_TIMEOUT: Duration = Duration::from_secs(10);

/// Reads recent dashboard records about a client to ground classification.
#[derive(Debug, Clone)]
pub struct ClientContextFetcher {
    client: Client,
    website: EndpointConfig,
    twitter: EndpointConfig,
}

impl ClientContextFetcher {
    pub fn new(website: EndpointConfig, twitter: EndpointConfig) -> Result<Self> {
        let client = Client::builder().timeout(CONTEXT_TIMEOUT).build()?;
        Ok(Self {
            client,
            website,
            twitter,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.website_endpoint.clone(), config.twitter_endpoint.clone())
    }

    async fn try_fetch(&self, endpoint: &EndpointConfig, client_name: &str) -> Result<Value> {
        Ok(self
            .client
            .get(&endpoint.url)
            .header(API_KEY_HEADER, &endpoint.api_key)
            .query(&[("client_name", client_name.to_string()), ("limit", CONTEXT_LIMIT.to_string())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    async fn fetch(&self, endpoint: &EndpointConfig, client_name: &str) -> Vec<Value> {
        if !endpoint.is_configured() {
            return Vec::new();
        }
        match self.try_fetch(endpoint, client_name).await {
            Ok(Value::Object(mut body)) => match body.remove("data") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            Ok(_) => Vec::new(),
            Err(e) => {
                tracing::warn!("Could not fetch context from {}: {}", endpoint.url, e);
                Vec::new()
            }
        }
    }
}

fn non_empty<'a>(item: &'a Value, key: &str) -> Option<&'a str> {
    item.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Joins website and twitter records into `[Website] ...` / `[Twitter] ...`
/// lines, each cut to [`MAX_ITEM_CHARS`], stopping before [`MAX_CONTEXT_CHARS`].
pub fn format_context(website: &[Value], twitter: &[Value]) -> String {
    let lines = website
        .iter()
        .filter_map(|item| non_empty(item, "content").or_else(|| non_empty(item, "title")))
        .map(|text| format!("[Website] {}", text))
        .chain(
            twitter
                .iter()
                .filter_map(|item| non_empty(item, "text"))
                .map(|text| format!("[Twitter] {}", text)),
        );

    let mut joined = String::new();
    let mut length = 0;
    for line in lines {
        let trimmed = truncate_chars(&line, MAX_ITEM_CHARS);
        let chars = trimmed.chars().count();
        if length + chars > MAX_CONTEXT_CHARS {
            break;
        }
        joined.push_str(&trimmed);
        joined.push('\n');
        length += chars + 1;
    }
    joined.trim().to_string()
}

#[async_trait]
impl ContextProvider for ClientContextFetcher {
    async fn client_context(&self, client_name: &str) -> String {
        let website = self.fetch(&self.website, client_name).await;
        let twitter = self.fetch(&self.twitter, client_name).await;
        format_context(&website, &twitter)
    }
}

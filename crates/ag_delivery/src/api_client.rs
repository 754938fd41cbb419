use ag_core::{EndpointConfig, Error, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Header carrying the static dashboard/RAG key.
pub const API_KEY_HEADER: &str = "X-API-key";

/// Posts JSON payloads to one endpoint, retrying transient failures.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    endpoint: EndpointConfig,
    retries: u32,
    delay: Duration,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("endpoint", &self.endpoint)
            .field("retries", &self.retries)
            .field("delay", &self.delay)
            .finish()
    }
}

fn item_id(data: &Value) -> &str {
    ["tweet_id", "url"]
        .iter()
        .filter_map(|k| data.get(*k).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .unwrap_or("N/A")
}

impl ApiClient {
    pub fn new(endpoint: EndpointConfig) -> Result<Self> {
        if !endpoint.is_configured() {
            return Err(Error::Config("API endpoint URL is not set".to_string()));
        }
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint,
            retries: DEFAULT_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        })
    }

    pub fn with_retry(mut self, retries: u32, delay: Duration) -> Self {
        self.retries = retries.max(1);
        self.delay = delay;
        self
    }

    pub fn url(&self) -> &str {
        &self.endpoint.url
    }

    /// POSTs `data`, returning whether the endpoint accepted it.
    ///
    /// 4xx and 5xx answers are final. Other non-2xx statuses and transport
    /// errors are retried after a fixed delay.
    pub async fn send_data(&self, data: &Value) -> bool {
        let id = item_id(data);
        for attempt in 1..=self.retries {
            tracing::info!("Sending item {} (attempt {}/{})", id, attempt, self.retries);
            tracing::debug!("Payload: {}", data);

            let result = self
                .client
                .post(&self.endpoint.url)
                .header(API_KEY_HEADER, &self.endpoint.api_key)
                .json(data)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    tracing::info!("✅ Item {} sent (attempt {})", id, attempt);
                    return true;
                }
                Ok(response) if response.status().is_client_error() || response.status().is_server_error() => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    tracing::warn!("API answered {} for item {}, not retrying: {}", status, id, body);
                    return false;
                }
                Ok(response) => {
                    tracing::warn!("API answered {} for item {} (attempt {})", response.status(), id, attempt);
                }
                Err(e) => {
                    tracing::error!("Error sending item {} (attempt {}): {}", id, attempt, e);
                }
            }

            if attempt < self.retries {
                tokio::time::sleep(self.delay).await;
            }
        }
        tracing::error!("All {} attempts to send item {} failed", self.retries, id);
        false
    }
}

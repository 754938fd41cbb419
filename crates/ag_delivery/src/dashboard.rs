use crate::api_client::ApiClient;
use ag_core::{AppConfig, Channel, Result, SourceType};
use ag_storage::PayloadLog;
use serde_json::Value;
use std::time::Duration;

/// Routes payloads to the dashboard endpoint of their source type.
///
/// Every payload is appended to the local payload log before it is posted,
/// whether or not an endpoint is configured for it.
#[derive(Debug, Clone)]
pub struct DashboardSender {
    email: Option<ApiClient>,
    twitter: Option<ApiClient>,
    website: Option<ApiClient>,
    log: PayloadLog,
}

impl DashboardSender {
    pub fn new(config: &AppConfig, log: PayloadLog) -> Self {
        let client = |channel| ApiClient::new(config.dashboard_endpoint(channel).clone()).ok();
        Self {
            email: client(Channel::Email),
            twitter: client(Channel::Twitter),
            website: client(Channel::Website),
            log,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config, PayloadLog::open(config.payload_log_path()))
    }

    pub fn with_retry(mut self, retries: u32, delay: Duration) -> Self {
        for client in [&mut self.email, &mut self.twitter, &mut self.website] {
            *client = client.take().map(|c| c.with_retry(retries, delay));
        }
        self
    }

    pub fn log(&self) -> &PayloadLog {
        &self.log
    }

    fn client(&self, channel: Channel) -> Option<&ApiClient> {
        match channel {
            Channel::Email => self.email.as_ref(),
            Channel::Twitter => self.twitter.as_ref(),
            Channel::Website => self.website.as_ref(),
        }
    }

    /// Logs then posts `payload`; `Ok(false)` when it was not delivered.
    pub async fn send(&self, payload: &Value, source_type: SourceType) -> Result<bool> {
        self.log.append(source_type.as_str(), payload).await?;

        let Some(channel) = source_type.channel() else {
            tracing::warn!("No dashboard endpoint for source type {}", source_type);
            return Ok(false);
        };
        match self.client(channel) {
            Some(client) => Ok(client.send_data(payload).await),
            None => {
                tracing::warn!("Dashboard endpoint for {} is not configured", source_type);
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ag_core::EndpointConfig;
    use mockito::Server;
    use serde_json::json;

    #[tokio::test]
    async fn test_routes_by_source_and_logs() {
        let mut server = Server::new_async().await;
        let twitter = server
            .mock("POST", "/twitter")
            .match_header("x-api-key", "tw")
            .with_status(200)
            .expect(2)
            .create_async()
            .await;
        let config = AppConfig {
            twitter_endpoint: EndpointConfig::new(format!("{}/twitter", server.url()), "tw"),
            ..Default::default()
        };
        let sender = DashboardSender::new(&config, PayloadLog::in_memory())
            .with_retry(1, Duration::from_millis(1));

        assert!(sender.send(&json!({"tweet_id": "1"}), SourceType::Tweet).await.unwrap());
        assert!(sender.send(&json!({"tweet_id": "2"}), SourceType::Twitter).await.unwrap());
        assert!(!sender.send(&json!({"subject": "s"}), SourceType::Email).await.unwrap());
        assert!(!sender.send(&json!({}), SourceType::Unknown).await.unwrap());
        twitter.assert_async().await;

        let sources: Vec<String> = sender.log().entries().await.into_iter().map(|e| e.source).collect();
        assert_eq!(sources, vec!["tweet", "twitter", "email", "unknown"]);
    }
}

//! Client for the retrieval service holding past correspondence.

use crate::api_client::API_KEY_HEADER;
use ag_core::{EndpointConfig, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const RAG_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Default, Deserialize)]
struct RetrieveResponse {
    #[serde(default)]
    data: RetrieveData,
}

#[derive(Debug, Default, Deserialize)]
struct RetrieveData {
    #[serde(default)]
    documents: Vec<RagDocument>,
}

#[derive(Debug, Default, Deserialize)]
struct RagDocument {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Clone)]
pub struct RagClient {
    client: Client,
    endpoint: EndpointConfig,
}

impl RagClient {
    pub fn new(endpoint: EndpointConfig) -> Result<Self> {
        let client = Client::builder().timeout(RAG_TIMEOUT).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_configured()
    }

    /// Documents relevant to `text`, one per line; empty on any failure.
    pub async fn retrieve(&self, text: &str) -> String {
        if !self.is_configured() || text.trim().is_empty() {
            return String::new();
        }
        match self.try_retrieve(text).await {
            Ok(context) => context,
            Err(e) => {
                tracing::warn!("RAG retrieval failed: {}", e);
                String::new()
            }
        }
    }

    async fn try_retrieve(&self, text: &str) -> Result<String> {
        let response: RetrieveResponse = self
            .client
            .get(&self.endpoint.url)
            .header(API_KEY_HEADER, &self.endpoint.api_key)
            .query(&[("text", text)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response
            .data
            .documents
            .into_iter()
            .map(|d| d.content)
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Adds `content` to the index; `false` when unconfigured or rejected.
    pub async fn index(&self, content: &str) -> bool {
        if !self.is_configured() || content.trim().is_empty() {
            return false;
        }
        let result = self
            .client
            .post(&self.endpoint.url)
            .header(API_KEY_HEADER, &self.endpoint.api_key)
            .json(&json!({ "input": content }))
            .send()
            .await
            .and_then(|r| r.error_for_status());
        match result {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("RAG indexing failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_retrieve_joins_documents() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/rag")
            .match_query(Matcher::UrlEncoded("text".into(), "new offer".into()))
            .match_header("x-api-key", "rk")
            .with_status(200)
            .with_body(r#"{"data": {"documents": [{"content": "first"}, {"content": "second"}]}}"#)
            .create_async()
            .await;
        let rag = RagClient::new(EndpointConfig::new(format!("{}/rag", server.url()), "rk")).unwrap();
        assert_eq!(rag.retrieve("new offer").await, "first\nsecond");
    }

    #[tokio::test]
    async fn test_retrieve_failures_are_empty() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/rag")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;
        let rag = RagClient::new(EndpointConfig::new(format!("{}/rag", server.url()), "rk")).unwrap();
        assert_eq!(rag.retrieve("x").await, "");

        let unconfigured = RagClient::new(EndpointConfig::default()).unwrap();
        assert_eq!(unconfigured.retrieve("x").await, "");
        assert!(!unconfigured.index("x").await);
    }

    #[tokio::test]
    async fn test_index_posts_input() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/rag")
            .match_body(Matcher::Json(serde_json::json!({"input": "body text"})))
            .with_status(200)
            .create_async()
            .await;
        let rag = RagClient::new(EndpointConfig::new(format!("{}/rag", server.url()), "rk")).unwrap();
        assert!(rag.index("body text").await);
        mock.assert_async().await;
    }
}

use ag_core::{ChatMessage, Error, LanguageModel, LlmConfig, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

/// Chat completions against an Azure OpenAI deployment.
pub struct AzureOpenAiModel {
    client: Client,
    config: LlmConfig,
}

impl AzureOpenAiModel {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.deployment,
            self.config.api_version
        )
    }
}

impl fmt::Debug for AzureOpenAiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureOpenAiModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.config.endpoint)
            .field("deployment", &self.config.deployment)
            .finish()
    }
}

#[async_trait]
impl LanguageModel for AzureOpenAiModel {
    fn name(&self) -> &str {
        "azure-openai"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatRequest {
            messages,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(self.completions_url())
            .header("api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "Azure OpenAI returned {}: {}",
                status, body
            )));
        }

        let response = response.json::<ChatResponse>().await?;
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Inference("Azure OpenAI returned no choices".to_string()))?;

        tracing::debug!("LLM reply ({} chars)", content.len());
        Ok(content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn config(endpoint: String) -> LlmConfig {
        LlmConfig {
            endpoint,
            api_key: "test-key".to_string(),
            api_version: "2024-05-01-preview".to_string(),
            deployment: "gpt-4o".to_string(),
            temperature: 0.2,
        }
    }

    #[tokio::test]
    async fn test_complete_posts_to_deployment() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/openai/deployments/gpt-4o/chat/completions")
            .match_query(Matcher::UrlEncoded(
                "api-version".into(),
                "2024-05-01-preview".into(),
            ))
            .match_header("api-key", "test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"  {\"ok\": true} "}}]}"#)
            .create_async()
            .await;

        let model = AzureOpenAiModel::new(config(server.url())).unwrap();
        let reply = model.prompt("hello").await.unwrap();
        assert_eq!(reply, "{\"ok\": true}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_is_inference_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Any)
            .match_query(Matcher::Any)
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let model = AzureOpenAiModel::new(config(server.url())).unwrap();
        let err = model.prompt("hello").await.unwrap_err();
        assert!(matches!(err, Error::Inference(ref m) if m.contains("429")));
    }

    #[test]
    fn test_debug_redacts_key() {
        let model = AzureOpenAiModel::new(config("https://example.openai.azure.com".into())).unwrap();
        assert!(!format!("{:?}", model).contains("test-key"));
    }
}

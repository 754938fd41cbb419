use crate::payload::Channel;
use crate::{Error, Result};
use std::path::{Path, PathBuf};

pub const SCRAPING_STATE_FILE: &str = "scraping_state.json";
pub const TWITTER_STATE_FILE: &str = "twitter_state.json";
pub const TWEETS_FILE: &str = "tweets.json";
pub const ARTICLES_FILE: &str = "scraped_articles.json";
pub const PAYLOAD_LOG_FILE: &str = "api_payloads.json";
pub const TWITTER_CONFIG_FILE: &str = "twitter_config.json";

#[derive(Clone, Default)]
pub struct LlmConfig {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    pub deployment: String,
    pub temperature: f32,
}

impl LlmConfig {
    pub fn is_configured(&self) -> bool {
        !self.endpoint.is_empty() && !self.api_key.is_empty()
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .field("deployment", &self.deployment)
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// A remote endpoint authenticated with a static `X-API-key`.
#[derive(Clone, Default, PartialEq)]
pub struct EndpointConfig {
    pub url: String,
    pub api_key: String,
}

impl EndpointConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.url.is_empty()
    }
}

impl std::fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub llm: LlmConfig,

    // Dashboard agents; the same endpoints serve client context on GET.
    pub email_endpoint: EndpointConfig,
    pub twitter_endpoint: EndpointConfig,
    pub website_endpoint: EndpointConfig,

    pub rag: EndpointConfig,

    pub data_dir: PathBuf,
    pub render_endpoint: Option<String>,
    pub gmail_access_token: Option<String>,
}

impl AppConfig {
    /// Loads `.env` when present, then reads the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = Self::from_vars(|key| std::env::var(key).ok())?;
        config.log_keys();
        Ok(config)
    }

    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| var(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let endpoint = |url: &str, key: &str| {
            EndpointConfig::new(get(url).unwrap_or_default(), get(key).unwrap_or_default())
        };

        let temperature = match get("AZURE_TEMPERATURE") {
            Some(raw) => raw
                .parse::<f32>()
                .map_err(|_| Error::Config(format!("AZURE_TEMPERATURE is not a number: {}", raw)))?,
            None => 0.2,
        };

        Ok(Self {
            llm: LlmConfig {
                endpoint: get("AZURE_OPENAI_ENDPOINT").unwrap_or_default(),
                api_key: get("AZURE_OPENAI_API_KEY").unwrap_or_default(),
                api_version: get("API_VERSION").unwrap_or_else(|| "2024-05-01-preview".to_string()),
                deployment: get("DEPLOYMENT_NAME").unwrap_or_else(|| "gpt-4o".to_string()),
                temperature,
            },
            email_endpoint: endpoint("EMAIL_AGENT_URL", "EMAIL_AGENT_API_KEY"),
            twitter_endpoint: endpoint("TWITTER_AGENT_URL", "TWITTER_AGENT_API_KEY"),
            website_endpoint: endpoint("WEBSITE_AGENT_URL", "WEBSITE_AGENT_API_KEY"),
            rag: endpoint("RAG_API_URL", "RAG_API_KEY"),
            data_dir: PathBuf::from(get("AG_DATA_DIR").unwrap_or_else(|| "data".to_string())),
            render_endpoint: get("RENDER_ENDPOINT"),
            gmail_access_token: get("GMAIL_ACCESS_TOKEN"),
        })
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn dashboard_endpoint(&self, channel: Channel) -> &EndpointConfig {
        match channel {
            Channel::Email => &self.email_endpoint,
            Channel::Twitter => &self.twitter_endpoint,
            Channel::Website => &self.website_endpoint,
        }
    }

    pub fn data_file(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    pub fn scraping_state_path(&self) -> PathBuf {
        self.data_file(SCRAPING_STATE_FILE)
    }

    pub fn twitter_state_path(&self) -> PathBuf {
        self.data_file(TWITTER_STATE_FILE)
    }

    pub fn tweets_path(&self) -> PathBuf {
        self.data_file(TWEETS_FILE)
    }

    pub fn articles_path(&self) -> PathBuf {
        self.data_file(ARTICLES_FILE)
    }

    pub fn payload_log_path(&self) -> PathBuf {
        self.data_file(PAYLOAD_LOG_FILE)
    }

    pub fn twitter_config_path(&self) -> PathBuf {
        self.data_file(TWITTER_CONFIG_FILE)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn log_keys(&self) {
        fn preview(val: &str) -> String {
            if val.is_empty() {
                return "<not set>".to_string();
            }
            let prefix: String = val.chars().take(5).collect();
            format!("{}...({} chars)", prefix, val.chars().count())
        }

        tracing::info!("Config loaded:");
        tracing::info!("  AZURE_OPENAI_ENDPOINT: {}", preview(&self.llm.endpoint));
        tracing::info!("  AZURE_OPENAI_API_KEY: {}", preview(&self.llm.api_key));
        tracing::info!("  EMAIL_AGENT_URL: {}", preview(&self.email_endpoint.url));
        tracing::info!("  TWITTER_AGENT_URL: {}", preview(&self.twitter_endpoint.url));
        tracing::info!("  WEBSITE_AGENT_URL: {}", preview(&self.website_endpoint.url));
        tracing::info!("  RAG_API_URL: {}", preview(&self.rag.url));
        tracing::info!("  AG_DATA_DIR: {}", self.data_dir.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config.llm.api_version, "2024-05-01-preview");
        assert_eq!(config.llm.deployment, "gpt-4o");
        assert!((config.llm.temperature - 0.2).abs() < f32::EPSILON);
        assert!(!config.llm.is_configured());
        assert!(!config.rag.is_configured());
        assert_eq!(config.tweets_path(), PathBuf::from("data/tweets.json"));
    }

    #[test]
    fn test_reads_endpoints() {
        let config = AppConfig::from_vars(vars(&[
            ("TWITTER_AGENT_URL", "https://dash.example/api/twitter"),
            ("TWITTER_AGENT_API_KEY", "secret"),
            ("AG_DATA_DIR", "/tmp/agents"),
            ("AZURE_TEMPERATURE", "0.5"),
        ]))
        .unwrap();
        let twitter = config.dashboard_endpoint(Channel::Twitter);
        assert_eq!(twitter.url, "https://dash.example/api/twitter");
        assert_eq!(twitter.api_key, "secret");
        assert!(!config.dashboard_endpoint(Channel::Email).is_configured());
        assert_eq!(config.scraping_state_path(), PathBuf::from("/tmp/agents/scraping_state.json"));
        assert!(!format!("{:?}", twitter).contains("secret"));
    }

    #[test]
    fn test_bad_temperature() {
        let result = AppConfig::from_vars(vars(&[("AZURE_TEMPERATURE", "warm")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}

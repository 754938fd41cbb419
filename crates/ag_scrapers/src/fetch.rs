use ag_core::Result;
use reqwest::{Client, StatusCode};
use std::time::Duration;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Copy)]
pub struct FetchTimeouts {
    pub get: Duration,
    pub head: Duration,
    pub probe: Duration,
}

impl Default for FetchTimeouts {
    fn default() -> Self {
        Self {
            get: Duration::from_secs(10),
            head: Duration::from_secs(7),
            probe: Duration::from_secs(5),
        }
    }
}

/// Browser-looking HTTP client. Every failure is logged and collapses to `None`/`false`.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeouts: FetchTimeouts,
}

fn reachable(status: StatusCode) -> bool {
    status.is_success() || status.is_redirection()
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeouts(FetchTimeouts::default())
    }

    pub fn with_timeouts(timeouts: FetchTimeouts) -> Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client, timeouts })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Body of a `200 OK` response.
    pub async fn get_html(&self, url: &str) -> Option<String> {
        let response = match self.client.get(url).timeout(self.timeouts.get).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Failed to fetch {}: {}", url, e);
                return None;
            }
        };
        if response.status() != StatusCode::OK {
            tracing::debug!("{} returned {}", url, response.status());
            return None;
        }
        match response.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::error!("Failed to read {}: {}", url, e);
                None
            }
        }
    }

    pub async fn get_bytes(&self, url: &str) -> Option<Vec<u8>> {
        let response = self.client.get(url).timeout(self.timeouts.get).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.bytes().await.ok().map(|b| b.to_vec())
    }

    /// Final URL after redirects when the page exists (2xx/3xx).
    ///
    /// Tries `HEAD` first and falls back to a `GET` whose body is never read
    /// when the server refuses `HEAD` (403/405) or the request errors.
    pub async fn resolve_final_url(&self, url: &str) -> Option<String> {
        match self.client.head(url).timeout(self.timeouts.head).send().await {
            Ok(response) if reachable(response.status()) => return Some(response.url().to_string()),
            Ok(response)
                if response.status() == StatusCode::FORBIDDEN
                    || response.status() == StatusCode::METHOD_NOT_ALLOWED => {}
            Ok(_) => return None,
            Err(e) => tracing::debug!("HEAD {} failed: {}", url, e),
        }

        match self.client.get(url).timeout(self.timeouts.get).send().await {
            Ok(response) if reachable(response.status()) => Some(response.url().to_string()),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("GET {} failed: {}", url, e);
                None
            }
        }
    }

    /// Short `HEAD` probe used for feed discovery.
    pub async fn probe(&self, url: &str) -> bool {
        match self.client.head(url).timeout(self.timeouts.probe).send().await {
            Ok(response) => reachable(response.status()),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn test_get_html_only_accepts_ok() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/ok")
            .match_header("user-agent", USER_AGENT)
            .with_status(200)
            .with_body("<html>hi</html>")
            .create_async()
            .await;
        server.mock("GET", "/gone").with_status(404).create_async().await;

        let fetcher = Fetcher::new().unwrap();
        let ok = fetcher.get_html(&format!("{}/ok", server.url())).await;
        assert_eq!(ok.as_deref(), Some("<html>hi</html>"));
        assert!(fetcher.get_html(&format!("{}/gone", server.url())).await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_final_url_follows_head_redirect() {
        let mut server = Server::new_async().await;
        server
            .mock("HEAD", "/blog")
            .with_status(301)
            .with_header("location", "/blog/")
            .create_async()
            .await;
        server.mock("HEAD", "/blog/").with_status(200).create_async().await;

        let fetcher = Fetcher::new().unwrap();
        let resolved = fetcher.resolve_final_url(&format!("{}/blog", server.url())).await;
        assert_eq!(resolved, Some(format!("{}/blog/", server.url())));
    }

    #[tokio::test]
    async fn test_resolve_final_url_falls_back_to_get() {
        let mut server = Server::new_async().await;
        server.mock("HEAD", "/news").with_status(405).create_async().await;
        let get = server
            .mock("GET", "/news")
            .with_status(200)
            .with_body("news")
            .create_async()
            .await;
        server.mock("HEAD", "/missing").with_status(404).create_async().await;

        let fetcher = Fetcher::new().unwrap();
        let resolved = fetcher.resolve_final_url(&format!("{}/news", server.url())).await;
        assert_eq!(resolved, Some(format!("{}/news", server.url())));
        get.assert_async().await;
        assert!(fetcher
            .resolve_final_url(&format!("{}/missing", server.url()))
            .await
            .is_none());
    }
}

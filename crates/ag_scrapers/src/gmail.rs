//! Unread-mail collection over the Gmail REST API.

use crate::html::{visible_text, CODE_NOISE};
use ag_core::{EmailRecord, Error, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use reqwest::Client;
use scraper::Html;
use serde::Deserialize;
use std::time::Duration;

pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";
pub const PAGE_SIZE: u32 = 50;

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartBody {
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagePart {
    #[serde(default, rename = "mimeType")]
    pub mime_type: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub body: PartBody,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GmailMessage {
    pub id: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default, rename = "labelIds")]
    pub label_ids: Vec<String>,
    #[serde(default)]
    pub payload: MessagePart,
}

fn decode_base64url(data: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(data.trim().trim_end_matches('=')).ok()?;
    String::from_utf8(bytes).ok()
}

fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    visible_text(&document, CODE_NOISE)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn collect_text(part: &MessagePart, level: usize, out: &mut String) {
    if !part.parts.is_empty() {
        for child in &part.parts {
            collect_text(child, level + 1, out);
        }
        return;
    }
    let Some(decoded) = part.body.data.as_deref().and_then(decode_base64url) else {
        return;
    };
    match part.mime_type.as_str() {
        "text/plain" => out.push_str(&decoded),
        // HTML is only read from single-part messages; multipart mail carries a plain twin.
        "text/html" if level == 0 => out.push_str(&html_to_text(&decoded)),
        _ => {}
    }
}

/// Plain text of a message payload, recursing through MIME parts.
pub fn plain_text(payload: &MessagePart) -> String {
    let mut out = String::new();
    collect_text(payload, 0, &mut out);
    out
}

fn header<'a>(part: &'a MessagePart, name: &str) -> Option<&'a str> {
    part.headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

impl GmailMessage {
    pub fn to_email_record(&self) -> EmailRecord {
        let sender = header(&self.payload, "from").unwrap_or("(No Sender)");
        EmailRecord {
            id: self.id.clone(),
            subject: header(&self.payload, "subject")
                .unwrap_or("(No Subject)")
                .to_string(),
            sender: sender.split('<').next().unwrap_or(sender).trim().to_string(),
            body: plain_text(&self.payload),
            label_ids: self.label_ids.clone(),
            ..Default::default()
        }
    }
}

/// Bearer-token Gmail client for the authenticated user.
#[derive(Clone)]
pub struct GmailClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl std::fmt::Debug for GmailClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GmailClient")
            .field("base_url", &self.base_url)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl GmailClient {
    pub fn new(access_token: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self {
            client,
            base_url: GMAIL_API_BASE.to_string(),
            access_token: access_token.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Scraping(format!("Gmail returned {}: {}", status, body)));
        }
        Ok(response.json().await?)
    }

    /// Ids of every unread message, following page tokens.
    pub async fn list_unread(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut query = vec![
                ("q", "is:unread".to_string()),
                ("labelIds", "UNREAD".to_string()),
                ("maxResults", PAGE_SIZE.to_string()),
            ];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }
            let page: ListResponse = self.get_json("/messages", &query).await?;
            ids.extend(page.messages.into_iter().map(|m| m.id));
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(ids)
    }

    pub async fn get_message(&self, id: &str) -> Result<GmailMessage> {
        self.get_json(&format!("/messages/{}", id), &[("format", "full".to_string())])
            .await
    }

    /// Every unread message as an [`EmailRecord`]. Messages that fail to load are skipped.
    pub async fn fetch_unread(&self) -> Result<Vec<EmailRecord>> {
        let ids = self.list_unread().await?;
        tracing::info!("{} unread messages", ids.len());
        let mut emails = Vec::with_capacity(ids.len());
        for id in ids {
            match self.get_message(&id).await {
                Ok(message) => emails.push(message.to_email_record()),
                Err(e) => tracing::error!("Error fetching message {}: {}", id, e),
            }
        }
        Ok(emails)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn encode(s: &str) -> String {
        URL_SAFE_NO_PAD.encode(s)
    }

    #[test]
    fn test_plain_text_multipart() {
        let payload: MessagePart = serde_json::from_value(json!({
            "mimeType": "multipart/alternative",
            "parts": [
                {"mimeType": "text/plain", "body": {"data": encode("Hello ")}},
                {"mimeType": "text/html", "body": {"data": encode("<p>ignored</p>")}},
                {"mimeType": "multipart/related", "parts": [
                    {"mimeType": "text/plain", "body": {"data": encode("again")}}
                ]}
            ]
        }))
        .unwrap();
        assert_eq!(plain_text(&payload), "Hello again");
    }

    #[test]
    fn test_single_part_html_fallback() {
        let payload: MessagePart = serde_json::from_value(json!({
            "mimeType": "text/html",
            "body": {"data": encode("<html><body><p>Hi\n  there</p><script>x()</script><p>team</p></body></html>")}
        }))
        .unwrap();
        assert_eq!(plain_text(&payload), "Hi there team");
    }

    #[test]
    fn test_to_email_record() {
        let message: GmailMessage = serde_json::from_value(json!({
            "id": "m1",
            "labelIds": ["UNREAD", "INBOX"],
            "payload": {
                "mimeType": "text/plain",
                "headers": [
                    {"name": "From", "value": "Ana Pop <ana@acme.com>"},
                    {"name": "Subject", "value": "Offer"}
                ],
                "body": {"data": encode("Body text")}
            }
        }))
        .unwrap();
        let email = message.to_email_record();
        assert_eq!(email.sender, "Ana Pop");
        assert_eq!(email.subject, "Offer");
        assert_eq!(email.body, "Body text");
        assert_eq!(email.label_ids, vec!["UNREAD", "INBOX"]);

        let bare = GmailMessage::default().to_email_record();
        assert_eq!(bare.subject, "(No Subject)");
        assert_eq!(bare.sender, "(No Sender)");
    }

    #[tokio::test]
    async fn test_fetch_unread_pages() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("GET", "/messages")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "is:unread".into()),
                Matcher::UrlEncoded("labelIds".into(), "UNREAD".into()),
                Matcher::UrlEncoded("maxResults".into(), "50".into()),
                Matcher::Missing("pageToken".into()),
            ]))
            .match_header("authorization", "Bearer token-1")
            .with_status(200)
            .with_body(r#"{"messages": [{"id": "a"}], "nextPageToken": "p2"}"#)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/messages")
            .match_query(Matcher::UrlEncoded("pageToken".into(), "p2".into()))
            .with_status(200)
            .with_body(r#"{"messages": [{"id": "b"}]}"#)
            .create_async()
            .await;
        for id in ["a", "b"] {
            server
                .mock("GET", format!("/messages/{}", id).as_str())
                .match_query(Matcher::UrlEncoded("format".into(), "full".into()))
                .with_status(200)
                .with_body(
                    json!({
                        "id": id,
                        "payload": {"mimeType": "text/plain", "body": {"data": encode(id)}}
                    })
                    .to_string(),
                )
                .create_async()
                .await;
        }

        let client = GmailClient::new("token-1").unwrap().with_base_url(server.url());
        let emails = client.fetch_unread().await.unwrap();
        let bodies: Vec<&str> = emails.iter().map(|e| e.body.as_str()).collect();
        assert_eq!(bodies, vec!["a", "b"]);
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_error_is_reported() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/messages")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body("invalid credentials")
            .create_async()
            .await;
        let client = GmailClient::new("bad").unwrap().with_base_url(server.url());
        let err = client.fetch_unread().await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }
}

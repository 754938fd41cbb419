//! Classify-then-deliver pipelines over collected items.

use crate::dashboard::DashboardSender;
use crate::rag::RagClient;
use ag_core::{
    build_dashboard_payload, build_twitter_payload, AppConfig, ArticleRecord, Classification,
    ContextProvider, DashboardPayload, EmailRecord, ScrapedArticle, SourceType, TweetRecord,
};
use ag_inference::Classifier;
use ag_storage::JsonDocument;
use serde::Serialize;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

pub const USER_PROFILE_FILE: &str = "user_profile.json";
pub const CONTEXT_ITEMS_FILE: &str = "context_items.json";
/// Articles with less body text than this are not classified.
pub const MIN_ARTICLE_CHARS: usize = 100;
const UNTITLED: &str = "Untitled";

/// Counts reported by one agent run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliverySummary {
    pub processed: usize,
    pub actionable: usize,
    pub sent: usize,
    pub failed: usize,
}

impl DeliverySummary {
    fn record(&mut self, actionable: bool, delivered: bool) {
        self.processed += 1;
        if actionable {
            self.actionable += 1;
        }
        if delivered {
            self.sent += 1;
        } else {
            self.failed += 1;
        }
    }
}

async fn deliver(sender: &DashboardSender, payload: &Value, source_type: SourceType) -> bool {
    match sender.send(payload, source_type).await {
        Ok(sent) => sent,
        Err(e) => {
            tracing::error!("Could not record {} payload: {}", source_type, e);
            false
        }
    }
}

fn item_text(item: &Value) -> &str {
    ["content", "body", "text"]
        .iter()
        .filter_map(|k| item.get(*k).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
        .unwrap_or_default()
}

/// The user profile from the data directory; `{}` when missing or not an object.
pub async fn load_user_profile(config: &AppConfig) -> Value {
    let profile = JsonDocument::<Value>::file(config.data_file(USER_PROFILE_FILE)).load().await;
    if profile.is_object() {
        profile
    } else {
        json!({})
    }
}

/// Reads the user profile and pending items from the data directory.
///
/// A missing profile reads as `{}`; missing items as an empty list.
pub async fn load_context_inputs(config: &AppConfig) -> (Value, Vec<Value>) {
    let profile = load_user_profile(config).await;
    let items = JsonDocument::<Vec<Value>>::file(config.data_file(CONTEXT_ITEMS_FILE))
        .load()
        .await;
    (profile, items)
}

/// Analyses items against RAG history and forwards the actionable ones.
pub struct ContextAgent {
    classifier: Classifier,
    rag: RagClient,
    sender: DashboardSender,
}

impl ContextAgent {
    pub fn new(classifier: Classifier, rag: RagClient, sender: DashboardSender) -> Self {
        Self {
            classifier,
            rag,
            sender,
        }
    }

    /// Each item is indexed in RAG after analysis so later items see it as history.
    pub async fn run(&self, profile: &Value, items: &[Value]) -> DeliverySummary {
        let mut summary = DeliverySummary::default();
        for item in items {
            let text = item_text(item);
            let history = self.rag.retrieve(text).await;

            match self.classifier.analyze_item(profile, &history, item).await {
                Some(analysis) => {
                    let (payload, source_type) =
                        build_dashboard_payload(&analysis.original_item, &analysis.analysis);
                    let sent = deliver(&self.sender, &payload.to_value(), source_type).await;
                    summary.record(true, sent);
                }
                None => {
                    tracing::info!("Item not actionable: {}", ag_core::classification::truncate_chars(text, 60));
                    summary.processed += 1;
                }
            }

            if !text.is_empty() && !self.rag.index(text).await {
                tracing::debug!("Item was not indexed");
            }
        }
        tracing::info!(
            "Context agent: {} items, {} actionable, {} sent",
            summary.processed,
            summary.actionable,
            summary.sent
        );
        summary
    }
}

/// Classifies collected tweets and posts them to the twitter dashboard.
pub struct TwitterAgent {
    classifier: Classifier,
    context: Arc<dyn ContextProvider>,
    profile: Option<Value>,
    sender: DashboardSender,
}

impl TwitterAgent {
    pub fn new(classifier: Classifier, context: Arc<dyn ContextProvider>, sender: DashboardSender) -> Self {
        Self {
            classifier,
            context,
            profile: None,
            sender,
        }
    }

    pub fn with_profile(mut self, profile: Value) -> Self {
        self.profile = Some(profile).filter(|p| p.is_object());
        self
    }

    pub async fn classify(&self, tweet: &TweetRecord) -> Classification {
        let client = Some(tweet.client_name.as_str()).filter(|c| !c.is_empty());
        self.classifier
            .classify_tweet(&tweet.text, self.profile.as_ref(), client, self.context.as_ref())
            .await
    }

    pub async fn run(&self, tweets: &[TweetRecord]) -> DeliverySummary {
        let mut summary = DeliverySummary::default();
        for tweet in tweets {
            let classification = self.classify(tweet).await;
            let payload = build_twitter_payload(tweet, &classification);
            let value = serde_json::to_value(&payload).unwrap_or(Value::Null);
            let sent = deliver(&self.sender, &value, SourceType::Twitter).await;
            summary.record(classification.actionable, sent);
        }
        summary
    }
}

/// Classifies freshly scraped articles and posts them to the website dashboard.
pub struct WebsiteAgent {
    classifier: Classifier,
    context: Arc<dyn ContextProvider>,
    profile: Option<Value>,
    sender: DashboardSender,
}

impl WebsiteAgent {
    pub fn new(classifier: Classifier, context: Arc<dyn ContextProvider>, sender: DashboardSender) -> Self {
        Self {
            classifier,
            context,
            profile: None,
            sender,
        }
    }

    pub fn with_profile(mut self, profile: Value) -> Self {
        self.profile = Some(profile).filter(|p| p.as_object().is_some_and(|o| !o.is_empty()));
        self
    }

    /// Dashboard record for `article` under `classification`.
    pub fn article_record(article: &ScrapedArticle, classification: Classification) -> ArticleRecord {
        let title = article.title.trim();
        ArticleRecord {
            url: article.url.clone(),
            title: if title.is_empty() { UNTITLED.to_string() } else { title.to_string() },
            content: article.text.clone(),
            client_name: article.client_name.clone(),
            short_description: classification.short_description,
            actionable: classification.actionable,
            opportunity_type: classification.opportunity_type,
            suggested_action: classification.suggested_action,
            relevance: classification.relevance,
            read: false,
            scraped_at: Utc::now(),
        }
    }

    /// Articles whose text is shorter than [`MIN_ARTICLE_CHARS`] are skipped
    /// and not counted.
    pub async fn run(&self, articles: &[ScrapedArticle]) -> DeliverySummary {
        let mut summary = DeliverySummary::default();
        for article in articles {
            if article.text.trim().chars().count() < MIN_ARTICLE_CHARS {
                tracing::info!("Skipping {}: not enough content", article.url);
                continue;
            }
            let classification = self
                .classifier
                .analyze_article(
                    &article.client_name,
                    &article.title,
                    &article.text,
                    self.profile.as_ref(),
                    self.context.as_ref(),
                )
                .await;
            let actionable = classification.actionable;
            let record = Self::article_record(article, classification);
            let value = serde_json::to_value(&record).unwrap_or(Value::Null);
            let sent = deliver(&self.sender, &value, SourceType::Website).await;
            summary.record(actionable, sent);
        }
        tracing::info!(
            "Website agent: {} articles, {} actionable, {} sent",
            summary.processed,
            summary.actionable,
            summary.sent
        );
        summary
    }
}

/// Categorises unread emails and posts them to the email dashboard.
pub struct EmailAgent {
    classifier: Classifier,
    sender: DashboardSender,
}

impl EmailAgent {
    pub fn new(classifier: Classifier, sender: DashboardSender) -> Self {
        Self { classifier, sender }
    }

    /// Enriches `emails` in place and delivers each one.
    pub async fn run(&self, emails: &mut [EmailRecord]) -> DeliverySummary {
        let mut summary = DeliverySummary::default();
        for email in emails.iter_mut() {
            let enhancement = self.classifier.enhance_email(&email.body, "").await;
            enhancement.apply_to(email);

            let classification = Classification {
                short_description: email.short_description.clone(),
                actionable: email.actionable,
                suggested_action: email.suggested_action.clone(),
                relevance: email.relevance.clone(),
                suggested_reply: email.suggested_reply.clone().unwrap_or_default(),
                ..Default::default()
            };
            let item = json!({
                "type": "email",
                "body": email.body,
                "client_name": email.sender,
                "subject": email.subject,
            });
            let (mut payload, source_type) = build_dashboard_payload(&item, &classification);
            if let DashboardPayload::Email(p) = &mut payload {
                p.message_id = email.id.clone();
            }
            let sent = deliver(&self.sender, &payload.to_value(), source_type).await;
            summary.record(email.actionable, sent);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ag_core::{EndpointConfig, NoContext, TweetStatus};
    use ag_inference::prelude::ScriptedModel;
    use ag_storage::PayloadLog;
    use mockito::{Matcher, Server};
    use std::time::Duration;

    fn sender(config: &AppConfig) -> DashboardSender {
        DashboardSender::new(config, PayloadLog::in_memory()).with_retry(1, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_context_agent_sends_actionable_items() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/rag")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"data": {"documents": [{"content": "signed NDA last year"}]}}"#)
            .create_async()
            .await;
        let indexed = server
            .mock("POST", "/rag")
            .with_status(200)
            .expect(2)
            .create_async()
            .await;
        let email = server
            .mock("POST", "/email")
            .match_body(Matcher::PartialJson(json!({"actionable": true, "subject": "RFP"})))
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let config = AppConfig {
            email_endpoint: EndpointConfig::new(format!("{}/email", server.url()), "ek"),
            ..Default::default()
        };
        let model = Arc::new(ScriptedModel::new([
            r#"{"analysis": {"actionable": true, "short_description": "RFP", "priority_level": "high"}}"#,
            "{}",
        ]));
        let agent = ContextAgent::new(
            Classifier::new(model.clone()),
            RagClient::new(EndpointConfig::new(format!("{}/rag", server.url()), "rk")).unwrap(),
            sender(&config),
        );
        let items = [
            json!({"type": "email", "subject": "RFP", "body": "Please quote"}),
            json!({"type": "email", "subject": "Newsletter", "body": "Weekly digest"}),
        ];
        let summary = agent.run(&json!({"name": "Acme"}), &items).await;

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.actionable, 1);
        assert_eq!(summary.sent, 1);
        assert!(model.prompts()[0].contains("signed NDA last year"));
        email.assert_async().await;
        indexed.assert_async().await;
    }

    #[tokio::test]
    async fn test_twitter_agent() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/twitter")
            .match_body(Matcher::PartialJson(json!({
                "tweet_id": "42",
                "actionable": false,
                "suggested_reply": " "
            })))
            .with_status(200)
            .expect(1)
            .create_async()
            .await;
        let config = AppConfig {
            twitter_endpoint: EndpointConfig::new(format!("{}/twitter", server.url()), "tk"),
            ..Default::default()
        };
        let agent = TwitterAgent::new(
            Classifier::new(Arc::new(ScriptedModel::failing())),
            Arc::new(NoContext),
            sender(&config),
        );
        let tweet = TweetRecord {
            tweet_id: "42".into(),
            client_name: "Acme".into(),
            text: "Quarterly results are out".into(),
            url: "https://twitter.com/acme/status/42".into(),
            created_at: String::new(),
            status: TweetStatus::Pending,
            reply: None,
        };
        let summary = agent.run(&[tweet]).await;
        assert_eq!(summary, DeliverySummary { processed: 1, actionable: 0, sent: 1, failed: 0 });
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_email_agent_keeps_message_id() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/email")
            .match_body(Matcher::PartialJson(json!({
                "message_id": "m-1",
                "client_name": "Ana Pop",
                "actionable": true,
                "type": "email"
            })))
            .with_status(200)
            .create_async()
            .await;
        let config = AppConfig {
            email_endpoint: EndpointConfig::new(format!("{}/email", server.url()), "ek"),
            ..Default::default()
        };
        let model = ScriptedModel::new([r#"{
            "category": "Actionable",
            "short_description": "Meeting request",
            "actionable": true,
            "suggested_action": "Confirm slot",
            "relevance": "Client meeting",
            "suggested_reply": "Tuesday works"
        }"#]);
        let agent = EmailAgent::new(Classifier::new(Arc::new(model)), sender(&config));
        let mut emails = vec![EmailRecord {
            id: "m-1".into(),
            subject: "Meeting".into(),
            sender: "Ana Pop".into(),
            body: "Can we meet?".into(),
            ..Default::default()
        }];
        let summary = agent.run(&mut emails).await;
        assert_eq!(summary.sent, 1);
        assert_eq!(emails[0].category.as_deref(), Some("Actionable"));
        assert_eq!(emails[0].suggested_reply.as_deref(), Some("Tuesday works"));
        mock.assert_async().await;
    }

    fn scraped(slug: &str, text: &str) -> ScrapedArticle {
        ScrapedArticle {
            url: format!("https://acme.com/blog/{}", slug),
            title: format!("Post {}", slug),
            authors: Vec::new(),
            text: text.to_string(),
            publish_date: None,
            client_name: "Acme".into(),
            scraped_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_website_agent_sends_classified_articles() {
        let mut server = Server::new_async().await;
        let actionable = server
            .mock("POST", "/website")
            .match_header("x-api-key", "wk")
            .match_body(Matcher::PartialJson(json!({
                "url": "https://acme.com/blog/rfp",
                "client_name": "Acme",
                "actionable": true,
                "opportunity_type": "New business opportunity",
                "read": false
            })))
            .with_status(201)
            .expect(1)
            .create_async()
            .await;
        let quiet = server
            .mock("POST", "/website")
            .match_body(Matcher::PartialJson(json!({
                "url": "https://acme.com/blog/party",
                "actionable": false,
                "opportunity_type": "",
                "suggested_action": ""
            })))
            .with_status(201)
            .expect(1)
            .create_async()
            .await;

        let config = AppConfig {
            website_endpoint: EndpointConfig::new(format!("{}/website", server.url()), "wk"),
            ..Default::default()
        };
        let model = Arc::new(ScriptedModel::new([
            r#"{"short_description": "RFP for automation", "actionable": true,
                "opportunity_type": "New business opportunity", "suggested_action": "Send proposal",
                "relevance": "Direct request"}"#,
            r#"{"short_description": "Team party", "actionable": false,
                "opportunity_type": "Culture", "suggested_action": "None"}"#,
        ]));
        let sender = sender(&config);
        let log = sender.log().clone();
        let agent = WebsiteAgent::new(Classifier::new(model.clone()), Arc::new(NoContext), sender)
            .with_profile(json!({"name": "Digital Excellence"}));

        let articles = [
            scraped("rfp", &"Acme is looking for an automation partner. ".repeat(5)),
            scraped("stub", "Too short"),
            scraped("party", &"Photos from our summer party are up. ".repeat(5)),
        ];
        let summary = agent.run(&articles).await;

        assert_eq!(summary, DeliverySummary { processed: 2, actionable: 1, sent: 2, failed: 0 });
        assert_eq!(model.call_count(), 2);
        assert!(model.prompts()[0].contains("Digital Excellence"));
        assert_eq!(log.entries().await.len(), 2);
        actionable.assert_async().await;
        quiet.assert_async().await;
    }

    #[test]
    fn test_article_record_defaults_title() {
        let mut article = scraped("x", "body");
        article.title = "  ".into();
        let record = WebsiteAgent::article_record(&article, Classification::neutral());
        assert_eq!(record.title, "Untitled");
        assert_eq!(record.content, "body");
        assert!(!record.read);
    }

    #[tokio::test]
    async fn test_load_context_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::default().with_data_dir(dir.path());
        let (profile, items) = load_context_inputs(&config).await;
        assert_eq!(profile, json!({}));
        assert!(items.is_empty());

        std::fs::write(dir.path().join(USER_PROFILE_FILE), r#"{"name": "Acme"}"#).unwrap();
        std::fs::write(dir.path().join(CONTEXT_ITEMS_FILE), r#"[{"type": "tweet", "text": "hi"}]"#).unwrap();
        let (profile, items) = load_context_inputs(&config).await;
        assert_eq!(profile["name"], "Acme");
        assert_eq!(items.len(), 1);
    }
}

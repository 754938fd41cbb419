use crate::AppState;
use ag_core::Result;
use ag_delivery::{
    load_context_inputs, load_user_profile, ClientContextFetcher, ContextAgent, DashboardSender,
    RagClient, TwitterAgent, WebsiteAgent,
};
use ag_scrapers::twitter::load_twitter_config;
use ag_scrapers::{ArticleScraper, TwitterScraper};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// Body shared by every trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerResponse {
    pub status: String,
    pub output: Value,
    pub error: Option<String>,
}

fn respond(code: StatusCode, output: Value, error: Option<String>) -> Response {
    let status = if code.is_success() { "success" } else { "error" };
    let body = TriggerResponse {
        status: status.to_string(),
        output,
        error,
    };
    (code, Json(body)).into_response()
}

fn finish(result: Result<Value>) -> Response {
    match result {
        Ok(output) => respond(StatusCode::OK, output, None),
        Err(e) => {
            tracing::error!("Trigger failed: {}", e);
            respond(StatusCode::INTERNAL_SERVER_ERROR, Value::Null, Some(e.to_string()))
        }
    }
}

#[derive(Debug, Deserialize)]
struct ArticleRequest {
    base_url: Option<String>,
    client_name: Option<String>,
}

fn required(field: Option<String>) -> Option<String> {
    field.map(|f| f.trim().to_string()).filter(|f| !f.is_empty())
}

pub async fn twitter_scraper(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let _guard = state.run_lock.lock().await;
    finish(run_twitter(&state).await)
}

async fn run_twitter(state: &AppState) -> Result<Value> {
    let config = &state.config;
    let twitter_config = load_twitter_config(&config.twitter_config_path()).await;
    let scraped = TwitterScraper::from_config(config)?.run(&twitter_config).await?;

    let context = Arc::new(ClientContextFetcher::from_config(config)?);
    let agent = TwitterAgent::new(state.classifier.clone(), context, DashboardSender::from_config(config));
    let delivered = agent.run(&scraped.tweets).await;
    Ok(json!({
        "profiles": scraped.profiles,
        "scraped": scraped.scraped,
        "saved": scraped.saved,
        "delivery": delivered,
    }))
}

pub async fn article_scraper(State(state): State<Arc<AppState>>, body: Bytes) -> impl IntoResponse {
    let request: ArticleRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            return respond(StatusCode::BAD_REQUEST, Value::Null, Some(format!("Invalid JSON body: {}", e)));
        }
    };
    let (Some(base_url), Some(client_name)) = (required(request.base_url), required(request.client_name)) else {
        return respond(
            StatusCode::BAD_REQUEST,
            Value::Null,
            Some("base_url and client_name are required".to_string()),
        );
    };

    let _guard = state.run_lock.lock().await;
    finish(run_articles(&state, &base_url, &client_name).await)
}

async fn run_articles(state: &AppState, base_url: &str, client_name: &str) -> Result<Value> {
    let config = &state.config;
    let mut scraper = ArticleScraper::from_config(config, state.classifier.clone()).await?;
    let summary = scraper.run(base_url, client_name).await?;

    let context = Arc::new(ClientContextFetcher::from_config(config)?);
    let agent = WebsiteAgent::new(state.classifier.clone(), context, DashboardSender::from_config(config))
        .with_profile(load_user_profile(config).await);
    let delivered = agent.run(&summary.articles).await;

    let mut output = serde_json::to_value(&summary)?;
    output["delivery"] = serde_json::to_value(delivered)?;
    Ok(output)
}

pub async fn run_context_agent(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let _guard = state.run_lock.lock().await;
    finish(run_context(&state).await)
}

async fn run_context(state: &AppState) -> Result<Value> {
    let config = &state.config;
    let (profile, items) = load_context_inputs(config).await;
    let agent = ContextAgent::new(
        state.classifier.clone(),
        RagClient::new(config.rag.clone())?,
        DashboardSender::from_config(config),
    );
    let summary = agent.run(&profile, &items).await;
    Ok(serde_json::to_value(summary)?)
}

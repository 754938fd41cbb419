use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod handlers;
pub mod state;

pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/twitter_scraper", post(handlers::twitter_scraper))
        .route("/article_scraper", post(handlers::article_scraper))
        .route("/run-context-agent", get(handlers::run_context_agent))
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Serves the triggers until the process is stopped.
pub async fn serve(state: AppState, addr: &str) -> ag_core::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("🌐 Listening on {}", listener.local_addr()?);
    axum::serve(listener, create_app(state)).await?;
    Ok(())
}

pub mod prelude {
    pub use crate::AppState;
    pub use ag_core::{Error, Result};
}

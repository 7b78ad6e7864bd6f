// src/api.rs
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use crate::news::feed::NewsFeed;
use crate::news::types::{FeedResult, FeedState};

#[derive(Clone)]
pub struct AppState {
    pub feed: Arc<NewsFeed>,
}

/// `/health`, `/news`, `/news/refetch`, `/news/state`.
pub fn router(feed: Arc<NewsFeed>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/news", get(get_news))
        .route("/news/refetch", post(refetch_news))
        .route("/news/state", get(news_state))
        .layer(CorsLayer::very_permissive())
        .with_state(AppState { feed })
}

#[derive(Debug, Deserialize)]
struct NewsQuery {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

/// Parameter changes go through `watch`, so state follows the latest request;
/// unchanged parameters are served by a plain `fetch` (usually a cache hit).
async fn get_news(State(state): State<AppState>, Query(q): Query<NewsQuery>) -> Json<FeedResult> {
    let cfg = state.feed.config();
    let query = q.query.unwrap_or_else(|| cfg.default_query.clone());
    let limit = q.limit.unwrap_or(cfg.default_limit);

    let result = match state.feed.watch(&query, limit).await {
        Some(r) => r,
        None => state.feed.fetch(&query, limit).await,
    };
    Json(result)
}

async fn refetch_news(State(state): State<AppState>) -> Json<FeedResult> {
    Json(state.feed.refetch().await)
}

async fn news_state(State(state): State<AppState>) -> Json<FeedState> {
    Json(state.feed.state())
}

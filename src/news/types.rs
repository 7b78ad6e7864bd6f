// src/news/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display name of the publication an article came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArticleSource {
    pub name: String,
}

/// Normalized article handed to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub image_url: String,
    pub published_at: DateTime<Utc>,
    pub source: ArticleSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Loosely-typed record produced by an adapter before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawArticle {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub published_at: Option<String>,
    pub source_name: Option<String>,
    pub author: Option<String>,
}

/// Persisted result of one successful live fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub articles: Vec<Article>,
    /// Creation time, epoch millis.
    pub timestamp: i64,
    pub query: String,
    pub limit: usize,
}

impl CacheEntry {
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.timestamp)
    }

    pub fn matches(&self, query: &str, limit: usize) -> bool {
        self.query == query && self.limit == limit
    }
}

/// How a `FeedResult` was produced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FeedMode {
    /// Served by a provider in this call.
    Live,
    /// Fresh cache hit for the same query and limit.
    Cached,
    /// Quota exhausted; newest cache entry of any query reused.
    StaleCache,
    /// Quota exhausted and nothing cached; built-in placeholders.
    Static,
    /// Every provider failed or was skipped.
    Failed,
}

impl FeedMode {
    pub fn is_degraded(self) -> bool {
        matches!(self, FeedMode::StaleCache | FeedMode::Static)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeedResult {
    pub articles: Vec<Article>,
    pub active_provider: Option<String>,
    pub error: Option<String>,
    pub mode: FeedMode,
}

/// Observable snapshot of the feed, updated as requests complete.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeedState {
    pub query: String,
    pub limit: usize,
    pub articles: Vec<Article>,
    pub loading: bool,
    pub error: Option<String>,
    pub active_provider: Option<String>,
}

// src/news/providers/newsdata.rs
use async_trait::async_trait;
use serde_json::Value;

use crate::news::error::{mentions_quota, ProviderError};
use crate::news::providers::{send_for_json, str_field, NewsProvider};
use crate::news::types::RawArticle;

const DEFAULT_BASE: &str = "https://newsdata.io/api/1/news";
/// Free tier rejects larger pages.
const MAX_PAGE: usize = 10;

/// NewsData.io latest-news search.
pub struct NewsDataProvider {
    http: reqwest::Client,
    base_url: String,
}

impl NewsDataProvider {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: DEFAULT_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn parse_response(v: &Value) -> Result<Vec<RawArticle>, ProviderError> {
        if v.get("status").and_then(Value::as_str) == Some("error") {
            let msg = str_field(v, "/results/message")
                .or_else(|| str_field(v, "/results/code"))
                .unwrap_or_else(|| "NewsData.io error".to_string());
            let code = str_field(v, "/results/code").unwrap_or_default();
            return Err(if mentions_quota(&msg) || mentions_quota(&code) {
                ProviderError::RateLimited(msg)
            } else {
                ProviderError::Upstream(format!("NewsData.io failed: {msg}"))
            });
        }

        let results = v
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::Parse("NewsData.io invalid response".into()))?;

        let out: Vec<RawArticle> = results
            .iter()
            .map(|a| RawArticle {
                id: str_field(a, "/article_id"),
                title: str_field(a, "/title"),
                description: str_field(a, "/description"),
                url: str_field(a, "/link"),
                image_url: str_field(a, "/image_url"),
                published_at: str_field(a, "/pubDate"),
                source_name: str_field(a, "/source_name").or_else(|| str_field(a, "/source_id")),
                author: str_field(a, "/creator/0").or_else(|| str_field(a, "/source_id")),
            })
            .collect();

        if out.is_empty() {
            return Err(ProviderError::Empty);
        }
        Ok(out)
    }
}

#[async_trait]
impl NewsProvider for NewsDataProvider {
    fn name(&self) -> &'static str {
        "NewsData.io"
    }

    async fn fetch(
        &self,
        query: &str,
        limit: usize,
        credential: Option<&str>,
    ) -> Result<Vec<RawArticle>, ProviderError> {
        let key = credential.ok_or(ProviderError::MissingCredential)?;
        let size = limit.clamp(1, MAX_PAGE).to_string();
        let req = self.http.get(&self.base_url).query(&[
            ("apikey", key),
            ("q", query),
            ("language", "en"),
            ("size", size.as_str()),
        ]);
        let body = send_for_json(req).await?;
        Self::parse_response(&body)
    }
}

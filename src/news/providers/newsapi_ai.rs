// src/news/providers/newsapi_ai.rs
use async_trait::async_trait;
use serde_json::Value;

use crate::news::error::{mentions_quota, ProviderError};
use crate::news::providers::{send_for_json, str_field, NewsProvider};
use crate::news::truncate_chars;
use crate::news::types::RawArticle;

const DEFAULT_BASE: &str = "https://eventregistry.org/api/v1/article/getArticles";
const BODY_CAP: usize = 200;

/// NewsAPI.ai (Event Registry) article search.
pub struct NewsApiAiProvider {
    http: reqwest::Client,
    base_url: String,
}

impl NewsApiAiProvider {
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
        if let Some(msg) = v.get("error").and_then(Value::as_str) {
            return Err(if mentions_quota(msg) || msg.to_ascii_lowercase().contains("tokens") {
                ProviderError::RateLimited(msg.to_string())
            } else {
                ProviderError::Upstream(format!("NewsAPI.ai failed: {msg}"))
            });
        }

        let results = v
            .pointer("/articles/results")
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::Parse("NewsAPI.ai invalid response".into()))?;

        let out: Vec<RawArticle> = results
            .iter()
            .map(|a| RawArticle {
                id: str_field(a, "/uri"),
                title: str_field(a, "/title"),
                description: str_field(a, "/body").map(|b| truncate_chars(&b, BODY_CAP)),
                url: str_field(a, "/url"),
                image_url: str_field(a, "/image"),
                published_at: str_field(a, "/dateTime").or_else(|| str_field(a, "/date")),
                source_name: str_field(a, "/source/title"),
                author: str_field(a, "/authors/0/name"),
            })
            .collect();

        if out.is_empty() {
            return Err(ProviderError::Empty);
        }
        Ok(out)
    }
}

#[async_trait]
impl NewsProvider for NewsApiAiProvider {
    fn name(&self) -> &'static str {
        "NewsAPI.ai"
    }

    async fn fetch(
        &self,
        query: &str,
        limit: usize,
        credential: Option<&str>,
    ) -> Result<Vec<RawArticle>, ProviderError> {
        let key = credential.ok_or(ProviderError::MissingCredential)?;
        let count = limit.to_string();
        let req = self.http.get(&self.base_url).query(&[
            ("keyword", query),
            ("resultType", "articles"),
            ("articlesSortBy", "date"),
            ("articlesCount", count.as_str()),
            ("lang", "eng"),
            ("apiKey", key),
        ]);
        let body = send_for_json(req).await?;
        Self::parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_results_and_caps_body() {
        let v = json!({
            "articles": {
                "results": [{
                    "uri": "8123",
                    "title": "Chip exports tighten",
                    "body": "b".repeat(400),
                    "url": "https://wire.test/chips",
                    "image": "https://wire.test/chips.jpg",
                    "date": "2025-06-14",
                    "dateTime": "2025-06-14T07:00:00Z",
                    "source": {"title": "Wire"},
                    "authors": [{"name": "A. Writer"}]
                }]
            }
        });
        let out = NewsApiAiProvider::parse_response(&v).unwrap();
        assert_eq!(out[0].description.as_ref().unwrap().len(), 200);
        assert_eq!(out[0].published_at.as_deref(), Some("2025-06-14T07:00:00Z"));
        assert_eq!(out[0].author.as_deref(), Some("A. Writer"));
    }

    #[test]
    fn missing_results_is_invalid() {
        let v = json!({"info": "nothing here"});
        assert!(matches!(
            NewsApiAiProvider::parse_response(&v).unwrap_err(),
            ProviderError::Parse(_)
        ));
    }

    #[test]
    fn exhausted_tokens_is_quota() {
        let v = json!({"error": "You have used all available tokens for unsubscribed users."});
        assert!(NewsApiAiProvider::parse_response(&v).unwrap_err().is_quota());
    }
}

// src/news/providers/mediastack.rs
use async_trait::async_trait;
use serde_json::Value;

use crate::news::error::{mentions_quota, ProviderError};
use crate::news::providers::{send_for_json, str_field, NewsProvider};
use crate::news::types::RawArticle;

const DEFAULT_BASE: &str = "https://api.mediastack.com/v1/news";
const MIN_KEY_LEN: usize = 10;

/// mediastack live news. Errors arrive as HTTP 200 with an `error` object.
pub struct MediaStackProvider {
    http: reqwest::Client,
    base_url: String,
}

impl MediaStackProvider {
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
        if let Some(err) = v.get("error") {
            let code = str_field(err, "/code").unwrap_or_default();
            let msg = str_field(err, "/message").unwrap_or_else(|| code.clone());
            return Err(match code.as_str() {
                "usage_limit_reached" | "rate_limit_reached" => ProviderError::RateLimited(msg),
                "invalid_access_key" | "missing_access_key" | "inactive_user" => {
                    ProviderError::InvalidCredential(msg)
                }
                _ if mentions_quota(&msg) => ProviderError::RateLimited(msg),
                _ => ProviderError::Upstream(format!("Media Stack API failed: {msg}")),
            });
        }

        let data = v
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::Parse("Media Stack API invalid response".into()))?;

        let out: Vec<RawArticle> = data
            .iter()
            .map(|a| RawArticle {
                id: str_field(a, "/url"),
                title: str_field(a, "/title"),
                description: str_field(a, "/description"),
                url: str_field(a, "/url"),
                image_url: str_field(a, "/image"),
                published_at: str_field(a, "/published_at"),
                source_name: str_field(a, "/source"),
                author: str_field(a, "/author"),
            })
            .collect();

        if out.is_empty() {
            return Err(ProviderError::Empty);
        }
        Ok(out)
    }
}

#[async_trait]
impl NewsProvider for MediaStackProvider {
    fn name(&self) -> &'static str {
        "Media Stack API"
    }

    async fn fetch(
        &self,
        query: &str,
        limit: usize,
        credential: Option<&str>,
    ) -> Result<Vec<RawArticle>, ProviderError> {
        let key = credential.ok_or(ProviderError::MissingCredential)?;
        if key.len() < MIN_KEY_LEN {
            return Err(ProviderError::InvalidCredential(
                "Media Stack API key invalid".into(),
            ));
        }
        let limit = limit.to_string();
        let req = self.http.get(&self.base_url).query(&[
            ("access_key", key),
            ("keywords", query),
            ("languages", "en"),
            ("sort", "published_desc"),
            ("limit", limit.as_str()),
        ]);
        let body = send_for_json(req).await?;
        Self::parse_response(&body)
    }
}

// src/news/providers/newsapi.rs
use async_trait::async_trait;
use serde_json::Value;

use crate::news::error::{mentions_quota, ProviderError};
use crate::news::providers::{classify_status, str_field, NewsProvider};
use crate::news::types::RawArticle;

const DEFAULT_BASE: &str = "https://newsapi.org/v2/everything";

/// newsapi.org `everything` endpoint.
pub struct NewsApiProvider {
    http: reqwest::Client,
    base_url: String,
}

impl NewsApiProvider {
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

    /// Status-aware parse: 426 means the plan cannot call this endpoint.
    pub fn parse_response(status: u16, body: &str) -> Result<Vec<RawArticle>, ProviderError> {
        if status == 426 {
            return Err(ProviderError::Upstream("News API requires paid plan".into()));
        }
        let v: Value = match serde_json::from_str(body) {
            Ok(v) => v,
            Err(e) => {
                classify_status(status, body)?;
                return Err(e.into());
            }
        };
        if v.get("status").and_then(Value::as_str) == Some("error") {
            let code = str_field(&v, "/code").unwrap_or_default();
            let msg = str_field(&v, "/message").unwrap_or_else(|| code.clone());
            if status == 429 || mentions_quota(&msg) {
                return Err(ProviderError::RateLimited(msg));
            }
            return Err(match code.as_str() {
                "rateLimited" | "maximumResultsReached" | "apiKeyExhausted" => {
                    ProviderError::RateLimited(msg)
                }
                "apiKeyInvalid" | "apiKeyDisabled" | "apiKeyMissing" => {
                    ProviderError::InvalidCredential(msg)
                }
                _ => ProviderError::Upstream(format!("News API failed: {msg}")),
            });
        }
        classify_status(status, body)?;

        let articles = v
            .get("articles")
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::Parse("News API invalid response".into()))?;

        let out: Vec<RawArticle> = articles
            .iter()
            // Removed stories come back as "[Removed]" stubs.
            .filter(|a| str_field(a, "/title").as_deref() != Some("[Removed]"))
            .map(|a| RawArticle {
                id: str_field(a, "/url"),
                title: str_field(a, "/title"),
                description: str_field(a, "/description"),
                url: str_field(a, "/url"),
                image_url: str_field(a, "/urlToImage"),
                published_at: str_field(a, "/publishedAt"),
                source_name: str_field(a, "/source/name"),
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
impl NewsProvider for NewsApiProvider {
    fn name(&self) -> &'static str {
        "News API"
    }

    async fn fetch(
        &self,
        query: &str,
        limit: usize,
        credential: Option<&str>,
    ) -> Result<Vec<RawArticle>, ProviderError> {
        let key = credential.ok_or(ProviderError::MissingCredential)?;
        let page_size = limit.to_string();
        let resp = self
            .http
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("language", "en"),
                ("sortBy", "publishedAt"),
                ("pageSize", page_size.as_str()),
            ])
            .header("X-Api-Key", key)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Self::parse_response(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upgrade_required_is_reported() {
        let err = NewsApiProvider::parse_response(426, "{}").unwrap_err();
        assert_eq!(err.to_string(), "News API requires paid plan");
        assert!(!err.is_quota());
    }

    #[test]
    fn rate_limited_code_is_quota() {
        let body = r#"{"status":"error","code":"rateLimited","message":"You have made too many requests"}"#;
        assert!(NewsApiProvider::parse_response(429, body).unwrap_err().is_quota());
    }

    #[test]
    fn exhausted_key_is_quota_not_bad_credential() {
        let body = r#"{"status":"error","code":"apiKeyExhausted","message":"Your API key has no more requests available."}"#;
        let err = NewsApiProvider::parse_response(429, body).unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited(_)));
        assert!(NewsApiProvider::parse_response(200, body).unwrap_err().is_quota());
    }

    #[test]
    fn status_429_wins_over_unknown_error_code() {
        let body = r#"{"status":"error","code":"somethingNew","message":"slow down"}"#;
        assert!(NewsApiProvider::parse_response(429, body).unwrap_err().is_quota());
    }

    #[test]
    fn invalid_key_stays_a_credential_error() {
        let body = r#"{"status":"error","code":"apiKeyInvalid","message":"Your API key is invalid or incorrect."}"#;
        let err = NewsApiProvider::parse_response(401, body).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidCredential(_)));
        assert!(!err.is_quota());
    }

    #[test]
    fn non_json_rate_limit_body_is_still_quota() {
        let err = NewsApiProvider::parse_response(429, "<html>Too Many Requests</html>").unwrap_err();
        assert!(err.is_quota());
    }

    #[test]
    fn removed_stubs_are_dropped() {
        let body = r#"{"status":"ok","totalResults":2,"articles":[
            {"source":{"id":null,"name":"[Removed]"},"title":"[Removed]","url":"https://removed.com"},
            {"source":{"id":"wired","name":"Wired"},"author":"Sam","title":"GPU prices fall",
             "description":"Finally","url":"https://wired.test/gpu","urlToImage":null,
             "publishedAt":"2025-06-14T08:00:00Z"}
        ]}"#;
        let out = NewsApiProvider::parse_response(200, body).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].source_name.as_deref(), Some("Wired"));
    }
}

// src/news/providers/gnews.rs
use async_trait::async_trait;
use serde::Deserialize;

use crate::news::error::ProviderError;
use crate::news::providers::{send_for_text, NewsProvider};
use crate::news::types::RawArticle;

const DEFAULT_BASE: &str = "https://gnews.io/api/v4/search";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    articles: Vec<GArticle>,
    #[serde(default)]
    errors: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    image: Option<String>,
    published_at: Option<String>,
    source: Option<GSource>,
}

#[derive(Debug, Deserialize)]
struct GSource {
    name: Option<String>,
}

/// GNews search API.
pub struct GNewsProvider {
    http: reqwest::Client,
    base_url: String,
}

impl GNewsProvider {
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

    pub fn parse_response(body: &str) -> Result<Vec<RawArticle>, ProviderError> {
        let resp: SearchResponse = serde_json::from_str(body)?;
        if let Some(errors) = resp.errors {
            return Err(ProviderError::Upstream(format!("GNews API failed: {errors}")));
        }
        let out: Vec<RawArticle> = resp
            .articles
            .into_iter()
            .map(|a| RawArticle {
                id: a.url.clone(),
                title: a.title,
                description: a.description,
                url: a.url,
                image_url: a.image,
                published_at: a.published_at,
                source_name: a.source.and_then(|s| s.name),
                author: None,
            })
            .collect();

        if out.is_empty() {
            return Err(ProviderError::Empty);
        }
        Ok(out)
    }
}

#[async_trait]
impl NewsProvider for GNewsProvider {
    fn name(&self) -> &'static str {
        "GNews API"
    }

    async fn fetch(
        &self,
        query: &str,
        limit: usize,
        credential: Option<&str>,
    ) -> Result<Vec<RawArticle>, ProviderError> {
        let key = credential.ok_or(ProviderError::MissingCredential)?;
        let max = limit.to_string();
        let req = self.http.get(&self.base_url).query(&[
            ("q", query),
            ("lang", "en"),
            ("max", max.as_str()),
            ("apikey", key),
        ]);
        let body = send_for_text(req).await?;
        Self::parse_response(&body)
    }
}

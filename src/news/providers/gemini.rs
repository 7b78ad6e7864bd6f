// src/news/providers/gemini.rs
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::news::error::{mentions_quota, ProviderError};
use crate::news::extract::try_extract_json_array;
use crate::news::providers::{send_for_json, str_field, NewsProvider};
use crate::news::types::RawArticle;

const DEFAULT_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Asks a Gemini model for recent articles and mines its answer for JSON.
pub struct GeminiProvider {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}
#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Req<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

impl GeminiProvider {
    pub fn new(http: reqwest::Client, model: &str) -> Self {
        Self {
            http,
            base_url: DEFAULT_BASE.to_string(),
            model: model.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn prompt(query: &str, limit: usize) -> String {
        format!(
            "List {limit} recent, real news articles about \"{query}\". \
             Respond with ONLY a JSON array. Each element must be an object with the keys \
             \"title\", \"description\" (one or two sentences), \"url\" (the article's absolute URL), \
             \"source\" (publication name) and \"publishedAt\" (ISO-8601 date). \
             No commentary, no markdown."
        )
    }

    /// Concatenated text parts of the first candidate.
    pub fn response_text(v: &Value) -> Result<String, ProviderError> {
        if let Some(block) = str_field(v, "/promptFeedback/blockReason") {
            return Err(ProviderError::Upstream(format!("Gemini blocked the prompt: {block}")));
        }
        let parts = v
            .pointer("/candidates/0/content/parts")
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::Parse("Gemini response has no candidates".into()))?;
        let text: String = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n");
        if text.trim().is_empty() {
            return Err(ProviderError::Empty);
        }
        Ok(text)
    }

    /// Map whatever keys the model chose onto a `RawArticle`.
    pub fn parse_model_text(text: &str) -> Result<Vec<RawArticle>, ProviderError> {
        let objects = try_extract_json_array(text)
            .ok_or_else(|| ProviderError::Parse("no JSON array in Gemini output".into()))?;

        let first = |o: &Value, keys: &[&str]| keys.iter().find_map(|k| str_field(o, k));

        let out: Vec<RawArticle> = objects
            .iter()
            .map(|o| RawArticle {
                id: None,
                title: first(o, &["/title", "/headline"]),
                description: first(o, &["/description", "/summary"]),
                url: first(o, &["/url", "/link"]),
                image_url: first(o, &["/imageUrl", "/image"]),
                published_at: first(o, &["/publishedAt", "/published_at", "/date"]),
                source_name: first(o, &["/source", "/source/name", "/publication"]),
                author: first(o, &["/author"]),
            })
            .filter(|r| r.title.is_some())
            .collect();

        if out.is_empty() {
            return Err(ProviderError::Empty);
        }
        Ok(out)
    }
}

#[async_trait]
impl NewsProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "Gemini AI"
    }

    async fn fetch(
        &self,
        query: &str,
        limit: usize,
        credential: Option<&str>,
    ) -> Result<Vec<RawArticle>, ProviderError> {
        let key = credential.ok_or(ProviderError::MissingCredential)?;
        let prompt = Self::prompt(query, limit);
        let req = Req {
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.3,
                max_output_tokens: 4096,
            },
        };
        let url = format!("{}/{}:generateContent", self.base_url, self.model);
        let body = send_for_json(self.http.post(url).header("x-goog-api-key", key).json(&req)).await?;

        if let Some(status) = str_field(&body, "/error/status") {
            let msg = str_field(&body, "/error/message").unwrap_or_else(|| status.clone());
            return Err(if mentions_quota(&status) || mentions_quota(&msg) {
                ProviderError::RateLimited(msg)
            } else {
                ProviderError::Upstream(format!("Gemini failed: {msg}"))
            });
        }

        let text = Self::response_text(&body)?;
        tracing::debug!(chars = text.len(), "gemini answered");
        Self::parse_model_text(&text)
    }
}

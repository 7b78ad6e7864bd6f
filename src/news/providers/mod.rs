// src/news/providers/mod.rs
pub mod gemini;
pub mod gnews;
pub mod mediastack;
pub mod newsapi;
pub mod newsapi_ai;
pub mod newsdata;
pub mod rss;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{Credentials, NewsConfig};
use crate::news::error::{mentions_quota, ProviderError};
use crate::news::types::RawArticle;

/// One upstream news/content source.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Display name, surfaced as the active provider.
    fn name(&self) -> &'static str;

    /// Adapters that need a key are skipped when none is configured.
    fn requires_credential(&self) -> bool {
        true
    }

    async fn fetch(
        &self,
        query: &str,
        limit: usize,
        credential: Option<&str>,
    ) -> Result<Vec<RawArticle>, ProviderError>;
}

/// Built-in adapters, in their default priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    NewsData,
    MediaStack,
    NewsApiAi,
    NewsApi,
    GNews,
    Gemini,
    Rss,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 7] = [
        ProviderKind::NewsData,
        ProviderKind::MediaStack,
        ProviderKind::NewsApiAi,
        ProviderKind::NewsApi,
        ProviderKind::GNews,
        ProviderKind::Gemini,
        ProviderKind::Rss,
    ];

    /// Identifier used in config files.
    pub fn id(self) -> &'static str {
        match self {
            ProviderKind::NewsData => "newsdata",
            ProviderKind::MediaStack => "mediastack",
            ProviderKind::NewsApiAi => "newsapi_ai",
            ProviderKind::NewsApi => "newsapi",
            ProviderKind::GNews => "gnews",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Rss => "rss",
        }
    }

    /// Env var holding the credential, if the adapter needs one.
    pub fn credential_env(self) -> Option<&'static str> {
        match self {
            ProviderKind::NewsData => Some("NEWSDATA_API_KEY"),
            ProviderKind::MediaStack => Some("MEDIASTACK_API_KEY"),
            ProviderKind::NewsApiAi => Some("NEWSAPI_AI_KEY"),
            ProviderKind::NewsApi => Some("NEWS_API_KEY"),
            ProviderKind::GNews => Some("GNEWS_API_KEY"),
            ProviderKind::Gemini => Some("GEMINI_API_KEY"),
            ProviderKind::Rss => None,
        }
    }

    fn build(self, http: reqwest::Client, cfg: &NewsConfig) -> Box<dyn NewsProvider> {
        match self {
            ProviderKind::NewsData => Box::new(newsdata::NewsDataProvider::new(http)),
            ProviderKind::MediaStack => Box::new(mediastack::MediaStackProvider::new(http)),
            ProviderKind::NewsApiAi => Box::new(newsapi_ai::NewsApiAiProvider::new(http)),
            ProviderKind::NewsApi => Box::new(newsapi::NewsApiProvider::new(http)),
            ProviderKind::GNews => Box::new(gnews::GNewsProvider::new(http)),
            ProviderKind::Gemini => Box::new(gemini::GeminiProvider::new(http, &cfg.gemini_model)),
            ProviderKind::Rss => Box::new(rss::RssProvider::new(
                http,
                cfg.rss.feeds.clone(),
                cfg.rss.cors_proxy.clone(),
            )),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', '.', ' '], "_");
        ProviderKind::ALL
            .into_iter()
            .find(|k| k.id() == wanted)
            .ok_or_else(|| anyhow::anyhow!("unknown news provider: {s}"))
    }
}

/// An adapter plus the credential configured for it.
pub struct ProviderSlot {
    pub provider: Arc<dyn NewsProvider>,
    pub credential: Option<String>,
}

/// Ordered list of adapters, tried first to last.
#[derive(Default)]
pub struct ProviderChain {
    slots: Vec<ProviderSlot>,
}

impl ProviderChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an adapter. Unusable credentials are treated as absent.
    pub fn with<P: NewsProvider + 'static>(mut self, provider: P, credential: Option<&str>) -> Self {
        self.push(Arc::new(provider), credential);
        self
    }

    pub fn push(&mut self, provider: Arc<dyn NewsProvider>, credential: Option<&str>) {
        self.slots.push(ProviderSlot {
            provider,
            credential: credential.and_then(usable_credential).map(String::from),
        });
    }

    /// Real adapters in configured order with credentials from the environment.
    pub fn from_config(cfg: &NewsConfig, creds: &Credentials) -> anyhow::Result<Self> {
        let http = build_http_client(cfg)?;
        let mut chain = Self::new();
        for kind in cfg.provider_kinds()? {
            let provider: Arc<dyn NewsProvider> = Arc::from(kind.build(http.clone(), cfg));
            chain.push(provider, creds.get(kind));
        }
        Ok(chain)
    }

    pub fn slots(&self) -> &[ProviderSlot] {
        &self.slots
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.slots.iter().map(|s| s.provider.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Blank values and the `...` placeholder from example env files don't count.
pub fn usable_credential(raw: &str) -> Option<&str> {
    let t = raw.trim();
    if t.is_empty() || t == "..." {
        None
    } else {
        Some(t)
    }
}

pub fn build_http_client(cfg: &NewsConfig) -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("newsfeed/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
        .timeout(Duration::from_secs(cfg.request_timeout_secs))
        .build()?;
    Ok(client)
}

/// Send and return the body, mapping non-2xx statuses onto `ProviderError`.
pub(crate) async fn send_for_text(req: reqwest::RequestBuilder) -> Result<String, ProviderError> {
    let resp = req.send().await?;
    let status = resp.status().as_u16();
    let body = resp.text().await?;
    classify_status(status, &body)?;
    Ok(body)
}

pub(crate) async fn send_for_json(req: reqwest::RequestBuilder) -> Result<Value, ProviderError> {
    let body = send_for_text(req).await?;
    Ok(serde_json::from_str(&body)?)
}

/// Shared status policy: 429 and quota wording are rate limits.
pub fn classify_status(status: u16, body: &str) -> Result<(), ProviderError> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    let message = upstream_message(body).unwrap_or_else(|| format!("status {status}"));
    match status {
        429 => Err(ProviderError::RateLimited(message)),
        401 | 402 | 403 if mentions_quota(body) => Err(ProviderError::RateLimited(message)),
        401 | 403 => Err(ProviderError::Unauthorized { status, message }),
        _ if mentions_quota(body) => Err(ProviderError::RateLimited(message)),
        _ => Err(ProviderError::Http { status, message }),
    }
}

/// Pull a human-readable message out of a JSON error body.
fn upstream_message(body: &str) -> Option<String> {
    let v: Value = serde_json::from_str(body).ok()?;
    let candidates = [
        v.get("message"),
        v.pointer("/error/message"),
        v.pointer("/results/message"),
        v.get("error"),
    ];
    let found = candidates
        .into_iter()
        .flatten()
        .find_map(|m| m.as_str().map(String::from));
    found
}

/// String field lookup that tolerates missing keys and non-string values.
pub(crate) fn str_field(v: &Value, pointer: &str) -> Option<String> {
    v.pointer(pointer)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_parse_from_config_ids() {
        assert_eq!("newsdata".parse::<ProviderKind>().unwrap(), ProviderKind::NewsData);
        assert_eq!("NewsAPI.ai".parse::<ProviderKind>().unwrap(), ProviderKind::NewsApiAi);
        assert_eq!("newsapi-ai".parse::<ProviderKind>().unwrap(), ProviderKind::NewsApiAi);
        assert!("bing".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn placeholder_credentials_are_unusable() {
        assert_eq!(usable_credential("  "), None);
        assert_eq!(usable_credential("..."), None);
        assert_eq!(usable_credential(" abc123 "), Some("abc123"));
    }

    #[test]
    fn status_classification() {
        assert!(classify_status(200, "").is_ok());
        assert!(classify_status(429, "").unwrap_err().is_quota());
        assert!(classify_status(403, r#"{"message":"Daily quota exceeded"}"#)
            .unwrap_err()
            .is_quota());
        assert_eq!(
            classify_status(401, r#"{"message":"Invalid key"}"#).unwrap_err(),
            ProviderError::Unauthorized {
                status: 401,
                message: "Invalid key".into()
            }
        );
        assert_eq!(
            classify_status(500, "oops").unwrap_err(),
            ProviderError::Http {
                status: 500,
                message: "status 500".into()
            }
        );
    }

    #[test]
    fn nested_error_messages_are_surfaced() {
        assert_eq!(
            classify_status(400, r#"{"error":{"message":"Bad query"}}"#).unwrap_err(),
            ProviderError::Http {
                status: 400,
                message: "Bad query".into()
            }
        );
        assert_eq!(
            classify_status(500, r#"{"status":"error","results":{"message":"Backend down"}}"#).unwrap_err(),
            ProviderError::Http {
                status: 500,
                message: "Backend down".into()
            }
        );
    }
}

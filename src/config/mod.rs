// src/config/mod.rs
//! Runtime configuration: `NewsConfig` from file + env, credentials from env.

mod credentials;

pub use credentials::Credentials;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::news::providers::ProviderKind;
use crate::news::NormalizeOptions;

pub const ENV_CONFIG_PATH: &str = "NEWSFEED_CONFIG_PATH";
const ENV_FRESHNESS: &str = "NEWSFEED_FRESHNESS_SECS";
const ENV_CACHE_DIR: &str = "NEWSFEED_CACHE_DIR";
const ENV_BIND: &str = "NEWSFEED_BIND";

const MIN_FRESHNESS_SECS: u64 = 60;
pub const MAX_LIMIT: usize = 100;

/// One RSS/Atom feed of the last-resort adapter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedSpec {
    pub name: String,
    pub url: String,
}

impl FeedSpec {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RssConfig {
    /// Prefix the URL-encoded feed URL is appended to, e.g. `https://api.allorigins.win/raw?url=`.
    pub cors_proxy: Option<String>,
    pub feeds: Vec<FeedSpec>,
}

impl Default for RssConfig {
    fn default() -> Self {
        Self {
            cors_proxy: None,
            feeds: vec![
                FeedSpec::new("TechCrunch", "https://techcrunch.com/feed/"),
                FeedSpec::new("The Verge", "https://www.theverge.com/rss/index.xml"),
                FeedSpec::new("Ars Technica", "https://feeds.arstechnica.com/arstechnica/index"),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NewsConfig {
    pub default_query: String,
    pub default_limit: usize,
    /// How long a cache entry satisfies a plain fetch.
    pub freshness_secs: u64,
    /// Provider dates older than this are replaced with "now".
    pub stale_after_days: i64,
    pub max_description_chars: usize,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Provider ids in priority order.
    pub providers: Vec<String>,
    pub gemini_model: String,
    /// Empty string keeps the cache in memory only.
    pub cache_dir: String,
    pub bind: String,
    pub rss: RssConfig,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            default_query: "technology".to_string(),
            default_limit: 10,
            freshness_secs: 4 * 3600,
            stale_after_days: 30,
            max_description_chars: 500,
            request_timeout_secs: 10,
            connect_timeout_secs: 4,
            providers: ProviderKind::ALL.iter().map(|k| k.id().to_string()).collect(),
            gemini_model: "gemini-2.5-flash".to_string(),
            cache_dir: "cache/news".to_string(),
            bind: "0.0.0.0:8080".to_string(),
            rss: RssConfig::default(),
        }
    }
}

impl NewsConfig {
    /// Load from an explicit path. TOML or JSON, chosen by extension.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading news config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg: NewsConfig = match ext.as_str() {
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?,
            _ => toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?,
        };
        Ok(cfg.sanitized())
    }

    /// Load using env var + fallbacks, then apply env overrides:
    /// 1) $NEWSFEED_CONFIG_PATH
    /// 2) config/newsfeed.toml
    /// 3) config/newsfeed.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        let base = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let toml_p = PathBuf::from("config/newsfeed.toml");
            let json_p = PathBuf::from("config/newsfeed.json");
            if toml_p.exists() {
                Self::load_from(&toml_p)?
            } else if json_p.exists() {
                Self::load_from(&json_p)?
            } else {
                Self::default()
            }
        };
        base.with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(v) = std::env::var(ENV_FRESHNESS) {
            self.freshness_secs = v
                .trim()
                .parse()
                .with_context(|| format!("{ENV_FRESHNESS} must be an integer, got {v:?}"))?;
        }
        if let Ok(v) = std::env::var(ENV_CACHE_DIR) {
            self.cache_dir = v;
        }
        if let Ok(v) = std::env::var(ENV_BIND) {
            self.bind = v;
        }
        Ok(self.sanitized())
    }

    fn sanitized(mut self) -> Self {
        if self.freshness_secs < MIN_FRESHNESS_SECS {
            self.freshness_secs = MIN_FRESHNESS_SECS;
        }
        self.default_limit = self.default_limit.clamp(1, MAX_LIMIT);
        if self.stale_after_days <= 0 {
            self.stale_after_days = 30;
        }
        if self.default_query.trim().is_empty() {
            self.default_query = "technology".to_string();
        }
        self
    }

    /// Provider ids resolved to kinds; unknown ids are an error, duplicates dropped.
    pub fn provider_kinds(&self) -> Result<Vec<ProviderKind>> {
        let mut out: Vec<ProviderKind> = Vec::with_capacity(self.providers.len());
        for id in &self.providers {
            let kind: ProviderKind = id.parse()?;
            if !out.contains(&kind) {
                out.push(kind);
            }
        }
        Ok(out)
    }

    pub fn freshness_ms(&self) -> i64 {
        i64::try_from(self.freshness_secs.saturating_mul(1000)).unwrap_or(i64::MAX)
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            max_description_chars: self.max_description_chars,
            stale_after_days: self.stale_after_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: NewsConfig = toml::from_str(
            r#"
freshness_secs = 28800
providers = ["rss", "gemini"]

[rss]
cors_proxy = "https://api.allorigins.win/raw?url="
"#,
        )
        .unwrap();
        assert_eq!(cfg.freshness_secs, 8 * 3600);
        assert_eq!(cfg.default_limit, 10);
        assert_eq!(cfg.rss.feeds.len(), 3);
        assert_eq!(
            cfg.provider_kinds().unwrap(),
            vec![ProviderKind::Rss, ProviderKind::Gemini]
        );
    }

    #[test]
    fn sanitize_clamps_out_of_range_values() {
        let cfg = NewsConfig {
            freshness_secs: 1,
            default_limit: 0,
            stale_after_days: -3,
            default_query: "  ".into(),
            ..Default::default()
        }
        .sanitized();
        assert_eq!(cfg.freshness_secs, MIN_FRESHNESS_SECS);
        assert_eq!(cfg.default_limit, 1);
        assert_eq!(cfg.stale_after_days, 30);
        assert_eq!(cfg.default_query, "technology");
    }

    #[test]
    fn unknown_provider_is_rejected_and_duplicates_dropped() {
        let cfg = NewsConfig {
            providers: vec!["rss".into(), "bogus".into()],
            ..Default::default()
        };
        assert!(cfg.provider_kinds().is_err());

        let cfg = NewsConfig {
            providers: vec!["rss".into(), "RSS".into()],
            ..Default::default()
        };
        assert_eq!(cfg.provider_kinds().unwrap(), vec![ProviderKind::Rss]);
    }
}

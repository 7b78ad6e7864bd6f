// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod metrics;
pub mod news;

use std::sync::Arc;

use anyhow::Context;

pub use crate::api::router;
pub use crate::config::{Credentials, NewsConfig};
pub use crate::news::feed::NewsFeed;
pub use crate::news::types::{Article, FeedMode, FeedResult, FeedState};

use crate::news::cache::{CacheStore, FileCache, MemoryCache};
use crate::news::providers::ProviderChain;

/// Cache backend selected by `cache_dir`: a directory of JSON files, or memory when empty.
pub fn cache_from_config(cfg: &NewsConfig) -> anyhow::Result<Arc<dyn CacheStore>> {
    if cfg.cache_dir.trim().is_empty() {
        return Ok(Arc::new(MemoryCache::new()));
    }
    let cache = FileCache::new(&cfg.cache_dir)
        .with_context(|| format!("creating cache dir {}", cfg.cache_dir))?;
    Ok(Arc::new(cache))
}

/// Feed wired with the real adapters and the configured cache.
pub fn build_feed(cfg: NewsConfig, creds: &Credentials) -> anyhow::Result<NewsFeed> {
    let chain = ProviderChain::from_config(&cfg, creds)?;
    let cache = cache_from_config(&cfg)?;
    Ok(NewsFeed::new(cfg, chain, cache))
}

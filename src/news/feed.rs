// src/news/feed.rs
//! `NewsFeed`: cache check, ordered provider chain, degraded fallbacks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use chrono::{DateTime, Utc};
use metrics::{counter, histogram};

use crate::config::{NewsConfig, MAX_LIMIT};
use crate::news::cache::{cache_key, CacheStore};
use crate::news::error::{NewsError, ProviderError};
use crate::news::fallback::{placeholder_articles, FALLBACK_PROVIDER};
use crate::news::providers::ProviderChain;
use crate::news::types::{CacheEntry, FeedMode, FeedResult, FeedState, RawArticle};
use crate::news::{ensure_metrics_described, normalize_batch};

/// Provider tag for fresh cache hits.
pub const CACHED_PROVIDER: &str = "cached";
/// Provider tag when another query's cache entry stands in after quota exhaustion.
pub const STALE_CACHE_PROVIDER: &str = "cached (fallback)";

const STALE_CACHE_MESSAGE: &str =
    "News providers are over their usage limits. Showing previously cached articles.";
const STATIC_MESSAGE: &str =
    "News providers are over their usage limits. Showing placeholder content.";

#[derive(Debug, Default)]
struct Inner {
    state: FeedState,
    /// Parameters of the most recent request, if any.
    requested: Option<(String, usize)>,
}

pub struct NewsFeed {
    config: NewsConfig,
    chain: ProviderChain,
    cache: Arc<dyn CacheStore>,
    generation: AtomicU64,
    inner: RwLock<Inner>,
}

impl NewsFeed {
    pub fn new(config: NewsConfig, chain: ProviderChain, cache: Arc<dyn CacheStore>) -> Self {
        ensure_metrics_described();
        let inner = Inner {
            state: FeedState {
                query: config.default_query.clone(),
                limit: config.default_limit,
                ..Default::default()
            },
            requested: None,
        };
        Self {
            config,
            chain,
            cache,
            generation: AtomicU64::new(0),
            inner: RwLock::new(inner),
        }
    }

    pub fn config(&self) -> &NewsConfig {
        &self.config
    }

    pub fn chain(&self) -> &ProviderChain {
        &self.chain
    }

    /// Blank queries fall back to the configured default; limit is clamped to 1..=100.
    pub fn resolve_params(&self, query: &str, limit: usize) -> (String, usize) {
        let q = query.trim();
        let q = if q.is_empty() { self.config.default_query.trim() } else { q };
        (q.to_string(), limit.clamp(1, MAX_LIMIT))
    }

    /// Cached result when fresh, otherwise the provider chain.
    pub async fn fetch(&self, query: &str, limit: usize) -> FeedResult {
        let (query, limit) = self.resolve_params(query, limit);
        self.request(query, limit, false).await
    }

    /// Re-run the chain for the last requested parameters, bypassing the cache.
    pub async fn refetch(&self) -> FeedResult {
        let (query, limit) = self
            .read_inner(|i| i.requested.clone())
            .unwrap_or_else(|| (self.config.default_query.clone(), self.config.default_limit));
        self.request(query, limit, true).await
    }

    /// Fetch only when the parameters differ from the last request.
    pub async fn watch(&self, query: &str, limit: usize) -> Option<FeedResult> {
        let wanted = self.resolve_params(query, limit);
        let unchanged = self.read_inner(|i| i.requested.as_ref() == Some(&wanted));
        if unchanged {
            return None;
        }
        Some(self.request(wanted.0, wanted.1, false).await)
    }

    pub fn state(&self) -> FeedState {
        self.read_inner(|i| i.state.clone())
    }

    fn read_inner<T>(&self, f: impl FnOnce(&Inner) -> T) -> T {
        f(&self.inner.read().expect("feed state lock poisoned"))
    }

    async fn request(&self, query: String, limit: usize, force: bool) -> FeedResult {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut inner = self.inner.write().expect("feed state lock poisoned");
            inner.requested = Some((query.clone(), limit));
            inner.state.query = query.clone();
            inner.state.limit = limit;
            inner.state.loading = true;
        }

        let result = self.resolve(&query, limit, force).await;

        let mode = match result.mode {
            FeedMode::Live => "live",
            FeedMode::Cached => "cached",
            FeedMode::StaleCache => "stale-cache",
            FeedMode::Static => "static",
            FeedMode::Failed => "failed",
        };
        counter!("news_fetch_total", "mode" => mode).increment(1);
        if result.mode.is_degraded() {
            counter!("news_degraded_total").increment(1);
        }

        self.commit(generation, &result);
        result
    }

    /// Publish `result` unless a newer request has started since.
    fn commit(&self, generation: u64, result: &FeedResult) {
        let mut inner = self.inner.write().expect("feed state lock poisoned");
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, "superseded request; state left untouched");
            return;
        }
        inner.state.articles = result.articles.clone();
        inner.state.error = result.error.clone();
        inner.state.active_provider = result.active_provider.clone();
        inner.state.loading = false;
    }

    async fn resolve(&self, query: &str, limit: usize, force: bool) -> FeedResult {
        let now = Utc::now();
        let key = cache_key(query, limit);

        if !force {
            if let Some(hit) = self.fresh_cache(&key, query, limit, now) {
                counter!("news_cache_hits_total").increment(1);
                tracing::debug!(query, limit, articles = hit.articles.len(), "cache hit");
                return FeedResult {
                    articles: hit.articles,
                    active_provider: Some(CACHED_PROVIDER.to_string()),
                    error: None,
                    mode: FeedMode::Cached,
                };
            }
        }

        let started = Instant::now();
        let outcome = self.run_chain(query, limit).await;
        histogram!("news_fetch_ms").record(started.elapsed().as_secs_f64() * 1000.0);

        match outcome {
            Ok((provider, raw)) => {
                let raw: Vec<RawArticle> = raw.into_iter().take(limit).collect();
                let articles = normalize_batch(raw, &self.config.normalize_options(), now);
                let entry = CacheEntry {
                    articles: articles.clone(),
                    timestamp: now.timestamp_millis(),
                    query: query.to_string(),
                    limit,
                };
                if let Err(e) = self.cache.put(&key, &entry) {
                    tracing::warn!(error = %e, key, "cache write failed");
                }
                tracing::info!(provider, query, limit, articles = articles.len(), "news fetched");
                FeedResult {
                    articles,
                    active_provider: Some(provider.to_string()),
                    error: None,
                    mode: FeedMode::Live,
                }
            }
            Err(err) => self.degrade(err, limit, now),
        }
    }

    /// Entry for exactly this (query, limit) within the freshness window.
    /// Expired or mismatched entries are dropped on the way.
    fn fresh_cache(&self, key: &str, query: &str, limit: usize, now: DateTime<Utc>) -> Option<CacheEntry> {
        let entry = self.cache.get(key)?;
        if entry.matches(query, limit) && entry.age_ms(now.timestamp_millis()) <= self.config.freshness_ms() {
            return Some(entry);
        }
        tracing::debug!(key, age_ms = entry.age_ms(now.timestamp_millis()), "dropping expired cache entry");
        if let Err(e) = self.cache.remove(key) {
            tracing::warn!(error = %e, key, "cache remove failed");
        }
        None
    }

    /// Try each provider in order; the first non-empty answer wins.
    pub async fn run_chain(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<(&'static str, Vec<RawArticle>), NewsError> {
        let mut last_error: Option<String> = None;
        let mut quota_exhausted = false;

        for slot in self.chain.slots() {
            let provider = slot.provider.name();
            if slot.provider.requires_credential() && slot.credential.is_none() {
                let skipped = NewsError::ProviderUnavailable { provider };
                tracing::debug!(%skipped, "skipping provider");
                counter!("news_provider_skipped_total", "provider" => provider).increment(1);
                continue;
            }

            let outcome = match slot.provider.fetch(query, limit, slot.credential.as_deref()).await {
                Ok(raw) if raw.is_empty() => Err(ProviderError::Empty),
                other => other,
            };
            match outcome {
                Ok(raw) => return Ok((provider, raw)),
                Err(source) => {
                    let err = NewsError::ProviderCallFailed { provider, source };
                    tracing::warn!(error = %err, provider, "provider failed, trying next");
                    counter!("news_provider_errors_total", "provider" => provider).increment(1);
                    quota_exhausted |= err.is_quota_exhausted();
                    last_error = Some(err.to_string());
                }
            }
        }

        Err(NewsError::AllProvidersFailed {
            last_error,
            quota_exhausted,
        })
    }

    fn degrade(&self, err: NewsError, limit: usize, now: DateTime<Utc>) -> FeedResult {
        if !err.is_quota_exhausted() {
            tracing::error!(error = %err, "all news providers failed");
            return FeedResult {
                articles: Vec::new(),
                active_provider: None,
                error: Some(err.to_string()),
                mode: FeedMode::Failed,
            };
        }

        match self.cache.newest_across_keys() {
            Some(entry) => {
                tracing::warn!(
                    cached_query = %entry.query,
                    "quota exhausted; serving newest cached articles"
                );
                FeedResult {
                    articles: entry.articles.into_iter().take(limit).collect(),
                    active_provider: Some(STALE_CACHE_PROVIDER.to_string()),
                    error: Some(STALE_CACHE_MESSAGE.to_string()),
                    mode: FeedMode::StaleCache,
                }
            }
            None => {
                tracing::warn!("quota exhausted and no cache; serving placeholder articles");
                FeedResult {
                    articles: placeholder_articles(limit, now),
                    active_provider: Some(FALLBACK_PROVIDER.to_string()),
                    error: Some(STATIC_MESSAGE.to_string()),
                    mode: FeedMode::Static,
                }
            }
        }
    }
}

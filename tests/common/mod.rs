// tests/common/mod.rs
//
// Scripted in-process providers shared by the feed tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;

use newsfeed::news::cache::{CacheStore, MemoryCache};
use newsfeed::news::error::ProviderError;
use newsfeed::news::providers::{NewsProvider, ProviderChain};
use newsfeed::news::types::RawArticle;
use newsfeed::{NewsConfig, NewsFeed};

pub enum Script {
    /// Return this many well-formed articles.
    Articles(usize),
    Fail(ProviderError),
    /// Block until `release` is notified, but only for this query.
    GateOn {
        query: &'static str,
        entered: Arc<Notify>,
        release: Arc<Notify>,
    },
}

pub struct MockProvider {
    pub name: &'static str,
    pub needs_key: bool,
    pub script: Script,
    pub calls: Arc<AtomicUsize>,
}

impl MockProvider {
    pub fn ok(name: &'static str, n: usize) -> Self {
        Self::new(name, Script::Articles(n))
    }

    pub fn failing(name: &'static str, err: ProviderError) -> Self {
        Self::new(name, Script::Fail(err))
    }

    pub fn new(name: &'static str, script: Script) -> Self {
        Self {
            name,
            needs_key: true,
            script,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn keyless(mut self) -> Self {
        self.needs_key = false;
        self
    }

    /// Counter that survives moving the provider into a chain.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

pub fn articles(provider: &str, query: &str, n: usize) -> Vec<RawArticle> {
    let now = Utc::now().to_rfc3339();
    (0..n)
        .map(|i| RawArticle {
            id: Some(format!("{provider}-{query}-{i}")),
            title: Some(format!("{provider} story {i} about {query}")),
            description: Some("<p>Body &amp; more</p>".into()),
            url: Some(format!("https://news.test/{query}/{i}")),
            image_url: None,
            published_at: Some(now.clone()),
            source_name: Some(provider.to_string()),
            author: None,
        })
        .collect()
}

#[async_trait]
impl NewsProvider for MockProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn requires_credential(&self) -> bool {
        self.needs_key
    }

    async fn fetch(
        &self,
        query: &str,
        limit: usize,
        _credential: Option<&str>,
    ) -> Result<Vec<RawArticle>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Articles(n) => Ok(articles(self.name, query, *n)),
            Script::Fail(e) => Err(e.clone()),
            Script::GateOn {
                query: gated,
                entered,
                release,
            } => {
                if query == *gated {
                    entered.notify_one();
                    release.notified().await;
                }
                Ok(articles(self.name, query, limit))
            }
        }
    }
}

pub fn calls(c: &Arc<AtomicUsize>) -> usize {
    c.load(Ordering::SeqCst)
}

pub fn feed_with(chain: ProviderChain) -> (NewsFeed, Arc<MemoryCache>) {
    let cache = Arc::new(MemoryCache::new());
    let store: Arc<dyn CacheStore> = cache.clone();
    (NewsFeed::new(NewsConfig::default(), chain, store), cache)
}

pub fn quota() -> ProviderError {
    ProviderError::RateLimited("daily quota exceeded".into())
}

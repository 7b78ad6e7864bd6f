// tests/metrics.rs
//
// Installs the global recorder, so this file keeps a single test.

mod common;

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use common::{feed_with, MockProvider};
use newsfeed::metrics::Metrics;
use newsfeed::news::error::ProviderError;
use newsfeed::news::providers::ProviderChain;
use newsfeed::NewsConfig;

#[tokio::test]
async fn metrics_endpoint_contains_feed_series() {
    let metrics = Metrics::init(&NewsConfig::default()).expect("install recorder");

    let chain = ProviderChain::new()
        .with(MockProvider::failing("Flaky", ProviderError::Network("timeout".into())), Some("k"))
        .with(MockProvider::ok("NoKey", 3), None)
        .with(MockProvider::ok("Wire", 3), Some("k"));
    let (feed, _) = feed_with(chain);
    feed.fetch("rust", 3).await;
    feed.fetch("rust", 3).await;

    let resp = metrics
        .router()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // axum::body::to_bytes requires an explicit limit
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    for needle in [
        "news_fetch_total",
        "news_cache_hits_total",
        "news_provider_errors_total",
        "news_provider_skipped_total",
        "news_fetch_ms",
        "news_cache_freshness_secs",
    ] {
        assert!(text.contains(needle), "missing series {needle} in:\n{text}");
    }
    assert!(text.contains(r#"provider="Flaky""#));
}

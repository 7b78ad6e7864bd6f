//! newsfeed binary entrypoint.
//! Boots the Axum HTTP server around a `NewsFeed` wired from config and env.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newsfeed::metrics::Metrics;
use newsfeed::{build_feed, router, Credentials, NewsConfig};

/// Compact logs by default; `NEWSFEED_LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("newsfeed=info,warn"));

    let json = std::env::var("NEWSFEED_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = NewsConfig::load_default().context("loading news config")?;
    let creds = Credentials::from_env();
    tracing::info!(
        providers = ?cfg.providers,
        credentials = creds.configured(),
        cache_dir = %cfg.cache_dir,
        freshness_secs = cfg.freshness_secs,
        "news config loaded"
    );

    let metrics = Metrics::init(&cfg)?;
    let bind = cfg.bind.clone();
    let feed = Arc::new(build_feed(cfg, &creds)?);
    tracing::info!(chain = ?feed.chain().names(), "provider chain ready");
    let app = router(feed).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    tracing::info!(addr = %bind, "listening");
    axum::serve(listener, app).await.context("http server")?;
    Ok(())
}

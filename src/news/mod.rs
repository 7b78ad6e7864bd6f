// src/news/mod.rs
pub mod cache;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod feed;
pub mod providers;
pub mod types;

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;
use rand::{distr::Alphanumeric, Rng};
use sha2::{Digest, Sha256};
use url::Url;

use crate::news::types::{Article, ArticleSource, RawArticle};

pub const UNTITLED: &str = "Untitled article";
pub const UNKNOWN_SOURCE: &str = "News";
const ID_ATTEMPTS: usize = 10;
const PLACEHOLDER_HOSTS: [&str; 4] = ["example.com", "www.example.com", "example.org", "localhost"];

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("news_fetch_total", "Feed requests, labelled by outcome mode.");
        describe_counter!("news_cache_hits_total", "Requests answered from a fresh cache entry.");
        describe_counter!(
            "news_provider_errors_total",
            "Provider calls that failed, labelled by provider."
        );
        describe_counter!(
            "news_provider_skipped_total",
            "Providers skipped for lack of a credential."
        );
        describe_counter!(
            "news_degraded_total",
            "Requests answered with stale cache or placeholder content."
        );
        describe_histogram!("news_fetch_ms", "Provider chain duration in milliseconds.");
    });
}

/// Knobs for turning `RawArticle`s into `Article`s.
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    pub max_description_chars: usize,
    pub stale_after_days: i64,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            max_description_chars: 500,
            stale_after_days: 30,
        }
    }
}

/// Normalize text: strip tags, then decode entities, then collapse whitespace.
/// Escaped markup such as `&lt;T&gt;` survives as literal text.
pub fn normalize_text(s: &str) -> String {
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    let stripped = re_tags.replace_all(s, " ");
    let mut out = html_escape::decode_html_entities(&stripped).to_string();

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out.trim().to_string()
}

/// Cut to at most `max` chars, on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

/// Absolute `http(s)` URL with a host that is not an obvious placeholder.
pub fn usable_url(candidate: &str) -> Option<String> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() || trimmed.contains("...") {
        return None;
    }
    let parsed = Url::parse(trimmed).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?;
    if PLACEHOLDER_HOSTS.contains(&host) {
        return None;
    }
    Some(parsed.to_string())
}

/// Web-search URL standing in for a missing article link.
pub fn search_url(title: &str, source: &str) -> String {
    let q = format!("{title} {source}");
    Url::parse_with_params("https://www.google.com/search", &[("q", q.trim())])
        .map(String::from)
        .unwrap_or_else(|_| "https://www.google.com/".to_string())
}

/// Parse the date shapes providers are known to emit.
pub fn parse_published_at(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Provider date if parseable and recent enough, else `now`.
pub fn published_or_now(raw: Option<&str>, now: DateTime<Utc>, stale_after_days: i64) -> DateTime<Utc> {
    match raw.and_then(parse_published_at) {
        Some(dt) if now - dt <= Duration::days(stale_after_days) => dt,
        _ => now,
    }
}

fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    let out = out.trim_end_matches('-').to_string();
    if out.is_empty() {
        "article".to_string()
    } else {
        out
    }
}

fn title_hash(title: &str) -> String {
    let digest = Sha256::digest(title.as_bytes());
    digest.iter().take(4).map(|b| format!("{b:02x}")).collect()
}

fn random_suffix() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Keep `candidate` if unused in this batch, otherwise mint a fresh id.
fn unique_id(candidate: Option<&str>, title: &str, source: &str, index: usize, used: &mut HashSet<String>) -> String {
    if let Some(c) = candidate.map(str::trim).filter(|c| !c.is_empty()) {
        if used.insert(c.to_string()) {
            return c.to_string();
        }
    }
    let prefix = slug(source);
    let hash = title_hash(title);
    for _ in 0..ID_ATTEMPTS {
        let id = format!("{prefix}-{hash}-{}", random_suffix());
        if used.insert(id.clone()) {
            return id;
        }
    }
    let id = format!("{prefix}-{hash}-{index}");
    used.insert(id.clone());
    id
}

/// Apply the edge-case policy to one provider batch.
pub fn normalize_batch(raw: Vec<RawArticle>, opts: &NormalizeOptions, now: DateTime<Utc>) -> Vec<Article> {
    let mut used = HashSet::with_capacity(raw.len());
    raw.into_iter()
        .enumerate()
        .map(|(index, r)| {
            let title = r
                .title
                .as_deref()
                .map(normalize_text)
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| UNTITLED.to_string());
            let source = r
                .source_name
                .as_deref()
                .map(normalize_text)
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());
            let description = r
                .description
                .as_deref()
                .map(|d| truncate_chars(&normalize_text(d), opts.max_description_chars))
                .unwrap_or_default();
            let url = r
                .url
                .as_deref()
                .and_then(usable_url)
                .unwrap_or_else(|| search_url(&title, &source));
            let image_url = r.image_url.as_deref().and_then(usable_url).unwrap_or_default();
            let published_at = published_or_now(r.published_at.as_deref(), now, opts.stale_after_days);
            let author = r
                .author
                .as_deref()
                .map(normalize_text)
                .filter(|a| !a.is_empty());
            let id = unique_id(r.id.as_deref(), &title, &source, index, &mut used);

            Article {
                id,
                title,
                description,
                url,
                image_url,
                published_at,
                source: ArticleSource { name: source },
                author,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(title: Option<&str>, url: Option<&str>, date: Option<&str>) -> RawArticle {
        RawArticle {
            title: title.map(String::from),
            url: url.map(String::from),
            published_at: date.map(String::from),
            source_name: Some("Ars Technica".into()),
            ..Default::default()
        }
    }

    #[test]
    fn normalize_text_strips_tags_and_entities() {
        let out = normalize_text("  <p>Hello&nbsp;&amp;\n <b>world</b></p> ");
        assert_eq!(out, "Hello & world");
    }

    #[test]
    fn escaped_markup_is_kept_as_text() {
        assert_eq!(normalize_text("Use <code>Vec&lt;T&gt;</code> here"), "Use Vec<T> here");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("žluťoučký", 4), "žluť");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn missing_title_gets_placeholder_and_search_url() {
        let now = Utc::now();
        let out = normalize_batch(vec![raw(None, Some("/relative/path"), None)], &NormalizeOptions::default(), now);
        assert_eq!(out[0].title, UNTITLED);
        assert!(out[0].url.starts_with("https://www.google.com/search?q="));
        assert!(out[0].url.contains("Untitled"));
    }

    #[test]
    fn placeholder_hosts_are_rejected() {
        assert!(usable_url("https://example.com/story").is_none());
        assert!(usable_url("ftp://files.test/x").is_none());
        assert!(usable_url("https://...").is_none());
        assert_eq!(
            usable_url(" https://arstechnica.com/a ").as_deref(),
            Some("https://arstechnica.com/a")
        );
    }

    #[test]
    fn date_formats_and_staleness() {
        let now = DateTime::parse_from_rfc3339("2025-06-15T12:00:00Z").unwrap().with_timezone(&Utc);
        assert_eq!(
            published_or_now(Some("Fri, 13 Jun 2025 08:00:00 +0000"), now, 30).to_rfc3339(),
            "2025-06-13T08:00:00+00:00"
        );
        assert_eq!(
            published_or_now(Some("2025-06-14 09:30:00"), now, 30).to_rfc3339(),
            "2025-06-14T09:30:00+00:00"
        );
        assert_eq!(published_or_now(Some("2025-06-10"), now, 30).date_naive().to_string(), "2025-06-10");
        assert_eq!(published_or_now(Some("2024-01-01T00:00:00Z"), now, 30), now);
        assert_eq!(published_or_now(Some("yesterday-ish"), now, 30), now);
        assert_eq!(published_or_now(None, now, 30), now);
    }

    #[test]
    fn duplicate_and_missing_ids_are_regenerated() {
        let mut a = raw(Some("Same"), Some("https://arstechnica.com/1"), None);
        a.id = Some("dup".into());
        let mut b = raw(Some("Same"), Some("https://arstechnica.com/2"), None);
        b.id = Some("dup".into());
        let c = raw(Some("Other"), Some("https://arstechnica.com/3"), None);

        let out = normalize_batch(vec![a, b, c], &NormalizeOptions::default(), Utc::now());
        let ids: HashSet<_> = out.iter().map(|a| a.id.clone()).collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(out[0].id, "dup");
        assert!(out[1].id.starts_with("ars-technica-"));
        assert!(out[2].id.starts_with("ars-technica-"));
    }

    #[test]
    fn description_is_capped() {
        let mut r = raw(Some("T"), Some("https://arstechnica.com/x"), None);
        r.description = Some("x".repeat(900));
        let opts = NormalizeOptions {
            max_description_chars: 200,
            ..Default::default()
        };
        let out = normalize_batch(vec![r], &opts, Utc::now());
        assert_eq!(out[0].description.chars().count(), 200);
    }
}

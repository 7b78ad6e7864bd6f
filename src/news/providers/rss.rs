// src/news/providers/rss.rs
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::config::FeedSpec;
use crate::news::error::ProviderError;
use crate::news::providers::{send_for_text, NewsProvider};
use crate::news::types::RawArticle;
use crate::news::{normalize_text, truncate_chars};

const DESCRIPTION_CAP: usize = 200;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    guid: Option<Text>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    #[serde(rename = "dc:date")]
    dc_date: Option<String>,
    description: Option<String>,
    author: Option<String>,
    #[serde(rename = "dc:creator")]
    creator: Option<String>,
    enclosure: Option<UrlAttr>,
    #[serde(rename = "media:content", default)]
    media_content: Vec<UrlAttr>,
    #[serde(rename = "media:thumbnail", default)]
    media_thumbnail: Vec<UrlAttr>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    title: Option<Text>,
    #[serde(rename = "link", default)]
    link: Vec<AtomLink>,
    id: Option<String>,
    published: Option<String>,
    updated: Option<String>,
    summary: Option<Text>,
    content: Option<Text>,
    #[serde(rename = "author", default)]
    author: Vec<AtomAuthor>,
    #[serde(rename = "media:thumbnail", default)]
    media_thumbnail: Vec<UrlAttr>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UrlAttr {
    #[serde(rename = "@url")]
    url: Option<String>,
}

/// Element whose text we want regardless of its attributes.
#[derive(Debug, Deserialize)]
struct Text {
    #[serde(rename = "$text", default)]
    value: String,
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn clean_description(s: Option<String>) -> Option<String> {
    s.map(|d| truncate_chars(&normalize_text(&d), DESCRIPTION_CAP))
}

/// Last-resort adapter: public RSS/Atom feeds, tried in order.
pub struct RssProvider {
    http: reqwest::Client,
    feeds: Vec<FeedSpec>,
    cors_proxy: Option<String>,
}

impl RssProvider {
    pub fn new(http: reqwest::Client, feeds: Vec<FeedSpec>, cors_proxy: Option<String>) -> Self {
        Self {
            http,
            feeds,
            cors_proxy: cors_proxy.filter(|p| !p.trim().is_empty()),
        }
    }

    /// Feed URL, routed through the passthrough proxy when one is configured.
    pub fn request_url(&self, feed_url: &str) -> String {
        match &self.cors_proxy {
            Some(proxy) => {
                let encoded: String = url::form_urlencoded::byte_serialize(feed_url.as_bytes()).collect();
                format!("{proxy}{encoded}")
            }
            None => feed_url.to_string(),
        }
    }

    /// Parse RSS 2.0, falling back to Atom. At most `limit` items.
    pub fn parse_feed(xml: &str, feed_name: &str, limit: usize) -> Result<Vec<RawArticle>, ProviderError> {
        let xml_clean = scrub_html_entities_for_xml(xml);

        let items = match from_str::<Rss>(&xml_clean) {
            Ok(rss) => rss
                .channel
                .item
                .into_iter()
                .take(limit)
                .map(|it| rss_item(it, feed_name))
                .collect::<Vec<_>>(),
            Err(rss_err) => match from_str::<AtomFeed>(&xml_clean) {
                Ok(atom) => atom
                    .entry
                    .into_iter()
                    .take(limit)
                    .map(|e| atom_entry(e, feed_name))
                    .collect(),
                Err(_) => return Err(ProviderError::Parse(format!("{feed_name}: {rss_err}"))),
            },
        };

        if items.is_empty() {
            return Err(ProviderError::Empty);
        }
        Ok(items)
    }
}

fn rss_item(it: Item, feed_name: &str) -> RawArticle {
    let link = non_blank(it.link).or_else(|| non_blank(it.guid.map(|g| g.value)));
    let image = it
        .enclosure
        .into_iter()
        .chain(it.media_content)
        .chain(it.media_thumbnail)
        .find_map(|m| non_blank(m.url));
    RawArticle {
        id: link.clone(),
        title: non_blank(it.title),
        description: clean_description(it.description),
        url: link,
        image_url: image,
        published_at: non_blank(it.pub_date).or_else(|| non_blank(it.dc_date)),
        source_name: Some(feed_name.to_string()),
        author: non_blank(it.author)
            .or_else(|| non_blank(it.creator))
            .or_else(|| Some(feed_name.to_string())),
    }
}

fn atom_entry(e: Entry, feed_name: &str) -> RawArticle {
    let link = e
        .link
        .iter()
        .find(|l| l.rel.as_deref().map_or(true, |r| r == "alternate"))
        .or_else(|| e.link.first())
        .and_then(|l| non_blank(l.href.clone()));
    RawArticle {
        id: link.clone().or_else(|| non_blank(e.id)),
        title: non_blank(e.title.map(|t| t.value)),
        description: clean_description(e.summary.or(e.content).map(|t| t.value)),
        url: link,
        image_url: e.media_thumbnail.into_iter().find_map(|m| non_blank(m.url)),
        published_at: non_blank(e.published).or_else(|| non_blank(e.updated)),
        source_name: Some(feed_name.to_string()),
        author: e
            .author
            .into_iter()
            .find_map(|a| non_blank(a.name))
            .or_else(|| Some(feed_name.to_string())),
    }
}

#[async_trait]
impl NewsProvider for RssProvider {
    fn name(&self) -> &'static str {
        "RSS Feed"
    }

    fn requires_credential(&self) -> bool {
        false
    }

    async fn fetch(
        &self,
        _query: &str,
        limit: usize,
        _credential: Option<&str>,
    ) -> Result<Vec<RawArticle>, ProviderError> {
        let mut last_err = ProviderError::Upstream("RSS feed failed: no feeds configured".into());
        for feed in &self.feeds {
            let url = self.request_url(&feed.url);
            let parsed = match send_for_text(self.http.get(&url)).await {
                Ok(body) => Self::parse_feed(&body, &feed.name, limit),
                Err(e) => Err(e),
            };
            match parsed {
                Ok(items) => return Ok(items),
                Err(e) => {
                    tracing::debug!(feed = %feed.name, error = %e, "rss feed failed, trying next");
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&hellip;", "...")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_prefix_encodes_feed_url() {
        let p = RssProvider::new(
            reqwest::Client::new(),
            vec![],
            Some("https://api.allorigins.win/raw?url=".into()),
        );
        assert_eq!(
            p.request_url("https://techcrunch.com/feed/"),
            "https://api.allorigins.win/raw?url=https%3A%2F%2Ftechcrunch.com%2Ffeed%2F"
        );

        let direct = RssProvider::new(reqwest::Client::new(), vec![], Some("  ".into()));
        assert_eq!(direct.request_url("https://x.test/rss"), "https://x.test/rss");
    }

    #[test]
    fn channel_without_items_is_empty() {
        let xml = r#"<rss version="2.0"><channel><title>Quiet</title></channel></rss>"#;
        assert_eq!(
            RssProvider::parse_feed(xml, "Quiet", 5).unwrap_err(),
            ProviderError::Empty
        );
    }
}

// src/ingest/providers/rss_feed.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use crate::article::Category;
use crate::ingest::types::{RawArticle, SourceAdapter, SourceAdapterResult, SourceQuery};

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
    guid: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    author: Option<String>,
    category: Option<String>,
}

/// RFC 2822 `pubDate` as unix seconds; the normalizer takes that form verbatim.
fn rfc2822_to_unix(ts: &str) -> Option<String> {
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp().to_string())
}

/// One configured RSS 2.0 feed.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct RssFeedConfig {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub country: Option<String>,
    /// Applied when items carry no `<category>` of their own.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
}

pub struct RssFeedAdapter {
    feed: RssFeedConfig,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { client: reqwest::Client },
}

impl RssFeedAdapter {
    pub fn from_fixture(feed: RssFeedConfig, s: &str) -> Self {
        Self {
            feed,
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn new(feed: RssFeedConfig, client: reqwest::Client) -> Self {
        Self {
            feed,
            mode: Mode::Http { client },
        }
    }

    fn parse_items_from_str(&self, s: &str) -> Result<Vec<RawArticle>> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(s);
        let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;

        let out = rss
            .channel
            .item
            .into_iter()
            .map(|it| RawArticle {
                native_id: it.guid.as_deref().or(it.link.as_deref()).map(|k| {
                    crate::ingest::normalize::short_hash(&[k])
                }),
                title: it.title,
                summary: it.description,
                content: None,
                author: it.author,
                source_name: Some(self.feed.name.clone()),
                published_at: it.pub_date.as_deref().and_then(rfc2822_to_unix),
                image_url: None,
                category_hint: it.category.or_else(|| self.feed.category.clone()),
                country: self.feed.country.clone(),
                domain: self.feed.domain.clone(),
                url: it.link,
                verified: true,
                publisher_id: None,
            })
            .collect::<Vec<_>>();

        histogram!("aggregator_parse_ms", "provider" => "rss")
            .record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(out)
    }

    async fn fetch(&self) -> Result<Vec<RawArticle>> {
        match &self.mode {
            Mode::Fixture(s) => self.parse_items_from_str(s),
            Mode::Http { client } => {
                let body = client
                    .get(&self.feed.url)
                    .send()
                    .await
                    .with_context(|| format!("{} http get()", self.feed.name))?
                    .error_for_status()
                    .with_context(|| format!("{} http status", self.feed.name))?
                    .text()
                    .await
                    .with_context(|| format!("{} http .text()", self.feed.name))?;
                self.parse_items_from_str(&body)
            }
        }
    }
}

#[async_trait]
impl SourceAdapter for RssFeedAdapter {
    async fn fetch_raw(&self, _query: &SourceQuery) -> SourceAdapterResult {
        SourceAdapterResult::from_outcome(self.name(), self.fetch().await)
    }

    fn name(&self) -> &str {
        &self.feed.name
    }

    /// A feed pinned to a category or country is skipped for queries asking for another.
    fn is_relevant(&self, query: &SourceQuery) -> bool {
        let category_ok = match (query.category, self.feed.category.as_deref()) {
            (Some(want), Some(have)) => Category::parse(have) == Some(want),
            _ => true,
        };
        let country_ok = match (query.country.as_deref(), self.feed.country.as_deref()) {
            (Some(want), Some(have)) => want.eq_ignore_ascii_case(have),
            _ => true,
        };
        category_ok && country_ok
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed() -> RssFeedConfig {
        RssFeedConfig {
            name: "BBC Science".into(),
            url: "https://feeds.test/science.xml".into(),
            country: Some("gb".into()),
            category: Some("science".into()),
            domain: None,
        }
    }

    const XML: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>t</title>
  <item>
    <title>Telescope spots icy moon&nbsp;plumes</title>
    <link>https://feeds.test/a</link>
    <pubDate>Sat, 01 Mar 2025 09:30:00 GMT</pubDate>
    <description>Plumes rise from the south pole.</description>
  </item>
  <item>
    <title>Second item</title>
    <link>https://feeds.test/b</link>
    <pubDate>not a date</pubDate>
  </item>
</channel></rss>"#;

    #[tokio::test]
    async fn parses_items_with_feed_defaults() {
        let res = RssFeedAdapter::from_fixture(feed(), XML)
            .fetch_raw(&SourceQuery::default())
            .await;
        assert!(res.success, "{:?}", res.error);
        assert_eq!(res.source, "BBC Science");
        assert_eq!(res.items.len(), 2);
        let a = &res.items[0];
        assert_eq!(a.published_at.as_deref(), Some("1740821400"));
        assert_eq!(a.category_hint.as_deref(), Some("science"));
        assert_eq!(a.country.as_deref(), Some("gb"));
        assert!(res.items[1].published_at.is_none());
    }

    #[tokio::test]
    async fn broken_xml_is_a_failed_result() {
        let res = RssFeedAdapter::from_fixture(feed(), "<html><body>nope</body></html>")
            .fetch_raw(&SourceQuery::default())
            .await;
        assert!(!res.success);
    }

    #[test]
    fn pinned_feed_skips_other_categories() {
        let a = RssFeedAdapter::from_fixture(feed(), XML);
        let q = SourceQuery {
            category: Some(Category::Sports),
            ..Default::default()
        };
        assert!(!a.is_relevant(&q));
        assert!(a.is_relevant(&SourceQuery::default()));
    }
}

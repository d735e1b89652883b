// src/ingest/providers/hacker_news.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use serde::Deserialize;

use crate::article::Category;
use crate::ingest::types::{RawArticle, SourceAdapter, SourceAdapterResult, SourceQuery};

pub const HN_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";
/// Only the head of the top-stories list is worth the per-item round trips.
pub const TOP_STORIES_LIMIT: usize = 30;

const TECH_TERMS: &[&str] = &[
    "ai", "tech", "software", "programming", "startup", "computer", "code", "data", "cloud",
    "security", "web", "app", "open", "source", "rust", "python", "javascript", "linux", "gpu",
    "chip", "llm", "model", "api", "database",
];

#[derive(Debug, Clone, Deserialize)]
struct Story {
    id: u64,
    title: Option<String>,
    url: Option<String>,
    by: Option<String>,
    /// unix seconds
    time: Option<i64>,
    text: Option<String>,
    #[serde(default)]
    score: i64,
}

pub fn is_tech_title(title: &str) -> bool {
    title
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| TECH_TERMS.contains(&w.to_ascii_lowercase().as_str()))
}

/// Hacker News top stories, tech-titled only.
pub struct HackerNewsAdapter {
    mode: Mode,
}

enum Mode {
    /// JSON array of item objects, as the per-item endpoint returns them.
    Fixture(String),
    Http {
        base_url: String,
        client: reqwest::Client,
    },
}

impl HackerNewsAdapter {
    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn new(client: reqwest::Client) -> Self {
        Self {
            mode: Mode::Http {
                base_url: HN_BASE_URL.to_string(),
                client,
            },
        }
    }

    fn map_stories(stories: Vec<Story>) -> Vec<RawArticle> {
        stories
            .into_iter()
            .filter(|s| s.title.as_deref().is_some_and(is_tech_title))
            .map(|s| {
                let summary = format!("{} points on Hacker News", s.score);
                RawArticle {
                    native_id: Some(s.id.to_string()),
                    title: s.title,
                    summary: Some(summary),
                    content: s.text,
                    author: s.by,
                    source_name: Some("Hacker News".to_string()),
                    published_at: s.time.map(|t| t.to_string()),
                    image_url: None,
                    category_hint: Some(Category::Technology.as_str().to_string()),
                    country: Some("us".to_string()),
                    domain: None,
                    url: s
                        .url
                        .or_else(|| Some(format!("https://news.ycombinator.com/item?id={}", s.id))),
                    verified: true,
                    publisher_id: None,
                }
            })
            .collect()
    }

    fn parse_items_from_str(s: &str) -> Result<Vec<RawArticle>> {
        let t0 = std::time::Instant::now();
        let stories: Vec<Story> = serde_json::from_str(s).context("parsing hn stories json")?;
        let out = Self::map_stories(stories);
        histogram!("aggregator_parse_ms", "provider" => "hacker_news")
            .record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(out)
    }

    async fn fetch(&self) -> Result<Vec<RawArticle>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_items_from_str(s),
            Mode::Http { base_url, client } => {
                let ids: Vec<u64> = client
                    .get(format!("{base_url}/topstories.json"))
                    .send()
                    .await
                    .context("hn topstories get()")?
                    .error_for_status()
                    .context("hn topstories status")?
                    .json()
                    .await
                    .context("hn topstories json")?;

                let calls = ids.into_iter().take(TOP_STORIES_LIMIT).map(|id| {
                    let url = format!("{base_url}/item/{id}.json");
                    async move {
                        let resp = client.get(&url).send().await?.error_for_status()?;
                        resp.json::<Option<Story>>().await
                    }
                });
                // one missing item shouldn't sink the batch
                let stories = futures::future::join_all(calls)
                    .await
                    .into_iter()
                    .filter_map(|r| match r {
                        Ok(story) => story,
                        Err(e) => {
                            tracing::debug!(target: "aggregator", error = ?e, "hn item skipped");
                            None
                        }
                    })
                    .collect::<Vec<_>>();
                Ok(Self::map_stories(stories))
            }
        }
    }
}

#[async_trait]
impl SourceAdapter for HackerNewsAdapter {
    async fn fetch_raw(&self, _query: &SourceQuery) -> SourceAdapterResult {
        SourceAdapterResult::from_outcome(self.name(), self.fetch().await)
    }

    fn name(&self) -> &str {
        "Hacker News"
    }

    /// Only worth calling for technology feeds.
    fn is_relevant(&self, query: &SourceQuery) -> bool {
        let tech_domain = query
            .domain
            .as_deref()
            .is_some_and(|d| Category::parse(d) == Some(Category::Technology));
        let tech_query = query
            .query
            .as_deref()
            .is_some_and(|q| q.to_lowercase().contains("tech"));
        query.category == Some(Category::Technology) || tech_domain || tech_query
    }
}

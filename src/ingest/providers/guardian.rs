// src/ingest/providers/guardian.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use serde::Deserialize;

use crate::article::Category;
use crate::ingest::types::{RawArticle, SourceAdapter, SourceAdapterResult, SourceQuery};

pub const GUARDIAN_SEARCH_URL: &str = "https://content.guardianapis.com/search";

#[derive(Debug, Deserialize)]
struct Envelope {
    response: Response,
}

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    status: String,
    #[serde(default)]
    results: Vec<Item>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Item {
    id: String,
    web_title: Option<String>,
    web_url: Option<String>,
    web_publication_date: Option<String>,
    section_id: Option<String>,
    section_name: Option<String>,
    #[serde(default)]
    fields: Fields,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Fields {
    trail_text: Option<String>,
    byline: Option<String>,
    thumbnail: Option<String>,
    body_text: Option<String>,
}

/// Guardian sections we can ask for directly.
fn section_for(c: Category) -> Option<&'static str> {
    match c {
        Category::Technology => Some("technology"),
        Category::Business => Some("business"),
        Category::Politics => Some("politics"),
        Category::Sports => Some("sport"),
        Category::Science => Some("science"),
        Category::World => Some("world"),
        Category::Environment => Some("environment"),
        Category::Education => Some("education"),
        Category::Entertainment => Some("culture"),
        Category::Health | Category::General => None,
    }
}

/// The Guardian content API.
pub struct GuardianAdapter {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        url: String,
        api_key: String,
        client: reqwest::Client,
    },
}

impl GuardianAdapter {
    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    /// The public "test" key works with tight rate limits.
    pub fn new(api_key: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            mode: Mode::Http {
                url: GUARDIAN_SEARCH_URL.to_string(),
                api_key: api_key.into(),
                client,
            },
        }
    }

    fn parse_items_from_str(s: &str) -> Result<Vec<RawArticle>> {
        let t0 = std::time::Instant::now();
        let env: Envelope = serde_json::from_str(s).context("parsing guardian json")?;
        if !env.response.status.is_empty() && env.response.status != "ok" {
            anyhow::bail!("guardian status {}", env.response.status);
        }

        let out = env
            .response
            .results
            .into_iter()
            .map(|it| RawArticle {
                native_id: Some(it.id),
                title: it.web_title,
                summary: it.fields.trail_text.clone(),
                content: it.fields.body_text.or(it.fields.trail_text),
                author: it.fields.byline.or(Some("Guardian Staff".to_string())),
                source_name: Some("The Guardian".to_string()),
                published_at: it.web_publication_date,
                image_url: it.fields.thumbnail,
                category_hint: it.section_id.or(it.section_name),
                country: Some("gb".to_string()),
                domain: None,
                url: it.web_url,
                verified: true,
                publisher_id: None,
            })
            .collect::<Vec<_>>();

        histogram!("aggregator_parse_ms", "provider" => "guardian")
            .record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(out)
    }

    async fn fetch(&self, q: &SourceQuery) -> Result<Vec<RawArticle>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_items_from_str(s),
            Mode::Http {
                url,
                api_key,
                client,
            } => {
                let mut params: Vec<(&str, String)> = vec![
                    ("api-key", api_key.clone()),
                    ("show-fields", "thumbnail,trailText,byline,bodyText".to_string()),
                    ("page-size", q.page_size.clamp(1, 50).to_string()),
                    ("page", q.page.max(1).to_string()),
                ];
                if let Some(section) = q.category.and_then(section_for) {
                    params.push(("section", section.to_string()));
                }
                if let Some(t) = &q.query {
                    params.push(("q", t.clone()));
                }
                let body = client
                    .get(url.as_str())
                    .query(&params)
                    .send()
                    .await
                    .context("guardian http get()")?
                    .error_for_status()
                    .context("guardian http status")?
                    .text()
                    .await
                    .context("guardian http .text()")?;
                Self::parse_items_from_str(&body)
            }
        }
    }
}

#[async_trait]
impl SourceAdapter for GuardianAdapter {
    async fn fetch_raw(&self, query: &SourceQuery) -> SourceAdapterResult {
        SourceAdapterResult::from_outcome(self.name(), self.fetch(query).await)
    }

    fn name(&self) -> &str {
        "The Guardian"
    }
}

// src/ingest/providers/newsapi.rs
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use serde::Deserialize;

use crate::ingest::types::{RawArticle, SourceAdapter, SourceAdapterResult, SourceQuery};

pub const NEWSAPI_BASE_URL: &str = "https://newsapi.org/v2";

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Item>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Item {
    #[serde(default)]
    source: Option<ItemSource>,
    author: Option<String>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    url_to_image: Option<String>,
    published_at: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemSource {
    id: Option<String>,
    name: Option<String>,
}

/// NewsAPI.org `top-headlines`.
pub struct NewsApiAdapter {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        base_url: String,
        api_key: String,
        client: reqwest::Client,
    },
}

impl NewsApiAdapter {
    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn new(api_key: impl Into<String>, client: reqwest::Client) -> Self {
        Self::with_base_url(NEWSAPI_BASE_URL, api_key, client)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            mode: Mode::Http {
                base_url: base_url.into(),
                api_key: api_key.into(),
                client,
            },
        }
    }

    /// `country` is stamped on every item when the request was country-scoped.
    fn parse_items_from_str(s: &str, country: Option<&str>) -> Result<Vec<RawArticle>> {
        let t0 = std::time::Instant::now();
        let resp: Response = serde_json::from_str(s).context("parsing newsapi json")?;
        if resp.status == "error" {
            bail!(
                "newsapi error: {}",
                resp.message.as_deref().unwrap_or("unknown")
            );
        }

        let out = resp
            .articles
            .into_iter()
            // NewsAPI marks removed items with this literal title
            .filter(|it| it.title.as_deref() != Some("[Removed]"))
            .map(|it| {
                let (source_id, source_name) = it
                    .source
                    .map(|s| (s.id, s.name))
                    .unwrap_or((None, None));
                RawArticle {
                    // url is the only stable per-item key NewsAPI gives us
                    native_id: it.url.as_deref().map(|u| {
                        crate::ingest::normalize::short_hash(&[
                            source_id.as_deref().unwrap_or_default(),
                            u,
                        ])
                    }),
                    title: it.title,
                    summary: it.description,
                    content: it.content,
                    author: it.author,
                    source_name: source_name.or(Some("NewsAPI".to_string())),
                    published_at: it.published_at,
                    image_url: it.url_to_image,
                    category_hint: None,
                    country: country.map(str::to_string),
                    domain: None,
                    url: it.url,
                    verified: true,
                    publisher_id: None,
                }
            })
            .collect::<Vec<_>>();

        histogram!("aggregator_parse_ms", "provider" => "newsapi")
            .record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(out)
    }

    async fn fetch(&self, q: &SourceQuery) -> Result<Vec<RawArticle>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_items_from_str(s, q.country.as_deref()),
            Mode::Http {
                base_url,
                api_key,
                client,
            } => {
                let mut params: Vec<(&str, String)> = vec![
                    ("apiKey", api_key.clone()),
                    ("pageSize", q.page_size.max(1).to_string()),
                    ("page", q.page.max(1).to_string()),
                ];
                if let Some(c) = q.category.filter(|c| *c != crate::article::Category::General)
                {
                    params.push(("category", c.as_str().to_string()));
                }
                if let Some(c) = &q.country {
                    params.push(("country", c.clone()));
                }
                if let Some(t) = &q.query {
                    params.push(("q", t.clone()));
                }
                let url = format!("{base_url}/top-headlines");
                let body = client
                    .get(&url)
                    .query(&params)
                    .send()
                    .await
                    .context("newsapi http get()")?
                    .error_for_status()
                    .context("newsapi http status")?
                    .text()
                    .await
                    .context("newsapi http .text()")?;
                Self::parse_items_from_str(&body, q.country.as_deref())
            }
        }
    }
}

#[async_trait]
impl SourceAdapter for NewsApiAdapter {
    async fn fetch_raw(&self, query: &SourceQuery) -> SourceAdapterResult {
        SourceAdapterResult::from_outcome(self.name(), self.fetch(query).await)
    }

    fn name(&self) -> &str {
        "NewsAPI"
    }
}

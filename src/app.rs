//! Wiring: config → adapters, stores, registry, aggregator, pipeline.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::aggregator::Aggregator;
use crate::article::Article;
use crate::config::AppConfig;
use crate::ingest::providers::{
    GuardianAdapter, HackerNewsAdapter, NewsApiAdapter, PublisherPoolAdapter, RssFeedAdapter,
};
use crate::ingest::types::SourceAdapter;
use crate::publisher::InMemoryPublisherRegistry;
use crate::store::JsonStore;
use crate::submission::{SubmissionPipeline, SubmissionRecord};

/// Everything the HTTP layer serves from.
#[derive(Clone)]
pub struct App {
    pub aggregator: Arc<Aggregator>,
    pub pipeline: Arc<SubmissionPipeline>,
    pub publishers: Arc<InMemoryPublisherRegistry>,
}

impl App {
    /// Build from config. Opens snapshot files when `store.data_dir` is set.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let records: Arc<JsonStore<SubmissionRecord>> = match cfg.store.submissions_path() {
            Some(p) => Arc::new(
                JsonStore::open(&p).with_context(|| format!("opening {}", p.display()))?,
            ),
            None => Arc::new(JsonStore::in_memory()),
        };
        let pool: Arc<JsonStore<Article>> = match cfg.store.articles_path() {
            Some(p) => Arc::new(
                JsonStore::open(&p).with_context(|| format!("opening {}", p.display()))?,
            ),
            None => Arc::new(JsonStore::in_memory()),
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.aggregator.adapter_timeout_ms.max(1)))
            .user_agent(concat!("newsdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building http client")?;

        let adapters = build_adapters(cfg, client, Arc::clone(&pool));
        tracing::info!(
            target: "aggregator",
            adapters = adapters.len(),
            persisted = cfg.store.data_dir.is_some(),
            "app wired"
        );

        let publishers = Arc::new(InMemoryPublisherRegistry::new());
        let pipeline = SubmissionPipeline::new(publishers.clone(), records, pool, cfg.risk);
        Ok(Self {
            aggregator: Arc::new(Aggregator::new(adapters, cfg.aggregator.clone())),
            pipeline: Arc::new(pipeline),
            publishers,
        })
    }
}

/// HTTP adapters per the `[sources]` section, plus the publisher pool.
pub fn build_adapters(
    cfg: &AppConfig,
    client: reqwest::Client,
    pool: Arc<JsonStore<Article>>,
) -> Vec<Arc<dyn SourceAdapter>> {
    let mut out: Vec<Arc<dyn SourceAdapter>> = Vec::new();
    if let Some(key) = &cfg.sources.newsapi_key {
        out.push(Arc::new(NewsApiAdapter::new(key.clone(), client.clone())));
    }
    if let Some(key) = &cfg.sources.guardian_key {
        out.push(Arc::new(GuardianAdapter::new(key.clone(), client.clone())));
    }
    if cfg.sources.hacker_news {
        out.push(Arc::new(HackerNewsAdapter::new(client.clone())));
    }
    for feed in &cfg.sources.rss {
        out.push(Arc::new(RssFeedAdapter::new(feed.clone(), client.clone())));
    }
    out.push(Arc::new(PublisherPoolAdapter::new(pool)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::providers::RssFeedConfig;

    #[test]
    fn adapters_follow_sources_section() {
        let mut cfg = AppConfig::default();
        cfg.sources.hacker_news = false;
        cfg.sources.rss.push(RssFeedConfig {
            name: "Local".into(),
            url: "https://feeds.test/local.xml".into(),
            country: None,
            category: None,
            domain: None,
        });
        let names: Vec<String> = build_adapters(
            &cfg,
            reqwest::Client::new(),
            Arc::new(JsonStore::in_memory()),
        )
        .iter()
        .map(|a| a.name().to_string())
        .collect();
        assert_eq!(names, vec!["The Guardian", "Local", "publisher"]);
    }
}

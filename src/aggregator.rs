//! Feed orchestration: fan out to adapters, normalize, dedup, filter, rank, page.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::article::{Article, Category};
use crate::error::NewsError;
use crate::ingest::dedup::{dedup, DedupParams};
use crate::ingest::fallback::fallback_articles;
use crate::ingest::filter::{filter_and_rank, paginate, FeedFilter, SortKey};
use crate::ingest::normalize::Normalizer;
use crate::ingest::types::{SourceAdapter, SourceQuery};
use crate::ingest::{collect_all, ensure_metrics_described};

/// `[aggregator]` config section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub adapter_timeout_ms: u64,
    pub dedup_similarity: f32,
    /// Restrict near-duplicate matching to articles this close in publish time.
    pub dedup_window_hours: Option<i64>,
    pub fallback_enabled: bool,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
            adapter_timeout_ms: 8_000,
            dedup_similarity: 0.8,
            dedup_window_hours: None,
            fallback_enabled: true,
        }
    }
}

/// Caller options; every field optional, unknown fields ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FetchOptions {
    pub category: Option<String>,
    pub country: Option<String>,
    pub domain: Option<String>,
    #[serde(alias = "q")]
    pub query: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub sort_by: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResult {
    pub articles: Vec<Article>,
    /// Size of the full filtered set, before paging.
    pub total_results: usize,
    /// Adapters that returned at least one item.
    pub source_count: usize,
    pub page: usize,
    pub page_size: usize,
    /// Served from the built-in fallback set.
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryInfo {
    pub code: &'static str,
    pub name: &'static str,
}

pub const COUNTRIES: &[CountryInfo] = &[
    CountryInfo { code: "us", name: "United States" },
    CountryInfo { code: "gb", name: "United Kingdom" },
    CountryInfo { code: "ca", name: "Canada" },
    CountryInfo { code: "au", name: "Australia" },
    CountryInfo { code: "in", name: "India" },
    CountryInfo { code: "de", name: "Germany" },
    CountryInfo { code: "fr", name: "France" },
    CountryInfo { code: "jp", name: "Japan" },
    CountryInfo { code: "cn", name: "China" },
    CountryInfo { code: "br", name: "Brazil" },
    CountryInfo { code: "mx", name: "Mexico" },
    CountryInfo { code: "ru", name: "Russia" },
    CountryInfo { code: "it", name: "Italy" },
    CountryInfo { code: "es", name: "Spain" },
    CountryInfo { code: "kr", name: "South Korea" },
];

pub const DOMAINS: &[&str] = &[
    "technology", "business", "politics", "sports", "entertainment", "science", "health",
    "world", "environment", "education", "finance", "startup", "ai", "blockchain",
    "cybersecurity",
];

pub struct Aggregator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    config: AggregatorConfig,
    normalizer: Normalizer,
}

impl Aggregator {
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>, config: AggregatorConfig) -> Self {
        ensure_metrics_described();
        Self {
            adapters,
            config,
            normalizer: Normalizer::new(),
        }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    pub fn adapter_names(&self) -> Vec<String> {
        self.adapters.iter().map(|a| a.name().to_string()).collect()
    }

    pub fn available_countries(&self) -> &'static [CountryInfo] {
        COUNTRIES
    }

    pub fn available_domains(&self) -> &'static [&'static str] {
        DOMAINS
    }

    pub async fn fetch(&self, opts: &FetchOptions) -> Result<FeedResult, NewsError> {
        self.fetch_at(opts, Utc::now()).await
    }

    /// `now` stamps items with missing timestamps and dates the fallback set.
    pub async fn fetch_at(
        &self,
        opts: &FetchOptions,
        now: DateTime<Utc>,
    ) -> Result<FeedResult, NewsError> {
        let t0 = Instant::now();
        counter!("aggregator_fetch_total").increment(1);

        let max = self.config.max_page_size.max(1);
        let page = opts.page.unwrap_or(1).max(1);
        let page_size = opts
            .page_size
            .unwrap_or(self.config.default_page_size)
            .clamp(1, max);
        let sort = opts.sort_by.as_deref().map(SortKey::parse).unwrap_or_default();
        let filter = FeedFilter {
            category: opts.category.clone(),
            country: opts.country.clone(),
            domain: opts.domain.clone(),
            query: opts.query.clone(),
            from: opts.from,
            to: opts.to,
        }
        .cleaned();

        // adapters page themselves only for the first request; we page the merged set
        let query = SourceQuery {
            query: filter.query.clone(),
            category: filter.category.as_deref().and_then(Category::parse),
            country: filter.country.clone(),
            domain: filter.domain.clone(),
            page: 1,
            page_size: max,
        };
        let relevant: Vec<Arc<dyn SourceAdapter>> = self
            .adapters
            .iter()
            .filter(|a| a.is_relevant(&query))
            .cloned()
            .collect();

        let timeout = Duration::from_millis(self.config.adapter_timeout_ms.max(1));
        let results = collect_all(&relevant, &query, timeout).await;

        let source_count = results
            .iter()
            .filter(|r| r.success && !r.items.is_empty())
            .count();
        let all_failed = results.iter().all(|r| !r.success);

        let mut pooled: Vec<Article> = Vec::new();
        for r in results.into_iter().filter(|r| r.success) {
            let source = r.source;
            pooled.extend(self.normalizer.normalize_all(&source, r.items, now));
        }

        let result = if all_failed || pooled.is_empty() {
            self.serve_fallback(&filter, sort, page, page_size, source_count, now)?
        } else {
            let params = DedupParams {
                similarity_threshold: self.config.dedup_similarity,
                window: self.config.dedup_window_hours.map(chrono::Duration::hours),
            };
            let (unique, dropped) = dedup(pooled, &params);
            counter!("aggregator_dedup_total").increment(dropped as u64);
            let ranked = filter_and_rank(unique, &filter, sort);
            FeedResult {
                articles: paginate(&ranked, page, page_size),
                total_results: ranked.len(),
                source_count,
                page,
                page_size,
                degraded: false,
            }
        };

        histogram!("aggregator_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        info!(
            target: "aggregator",
            sources = source_count,
            adapters = relevant.len(),
            total = result.total_results,
            page,
            degraded = result.degraded,
            "feed served"
        );
        Ok(result)
    }

    fn serve_fallback(
        &self,
        filter: &FeedFilter,
        sort: SortKey,
        page: usize,
        page_size: usize,
        source_count: usize,
        now: DateTime<Utc>,
    ) -> Result<FeedResult, NewsError> {
        if !self.config.fallback_enabled {
            warn!(target: "aggregator", "all sources empty and fallback disabled");
            return Err(NewsError::AggregationEmpty);
        }
        counter!("aggregator_fallback_total").increment(1);
        warn!(target: "aggregator", "all sources empty; serving fallback set");

        let set = fallback_articles(now);
        let mut ranked = filter_and_rank(set.clone(), filter, sort);
        if ranked.is_empty() {
            ranked = filter_and_rank(set, &FeedFilter::default(), sort);
        }
        Ok(FeedResult {
            articles: paginate(&ranked, page, page_size),
            total_results: ranked.len(),
            source_count,
            page,
            page_size,
            degraded: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::{RawArticle, SourceAdapterResult};
    use async_trait::async_trait;

    struct Canned {
        name: &'static str,
        titles: Vec<&'static str>,
        fail: bool,
    }

    #[async_trait]
    impl SourceAdapter for Canned {
        async fn fetch_raw(&self, _q: &SourceQuery) -> SourceAdapterResult {
            if self.fail {
                return SourceAdapterResult::failed(self.name, "boom");
            }
            let items = self
                .titles
                .iter()
                .map(|t| RawArticle {
                    title: Some(t.to_string()),
                    published_at: Some("2025-03-01T10:00:00Z".into()),
                    ..Default::default()
                })
                .collect();
            SourceAdapterResult::ok(self.name, items)
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    fn agg(adapters: Vec<Canned>, cfg: AggregatorConfig) -> Aggregator {
        Aggregator::new(
            adapters
                .into_iter()
                .map(|a| Arc::new(a) as Arc<dyn SourceAdapter>)
                .collect(),
            cfg,
        )
    }

    #[tokio::test]
    async fn page_size_is_clamped_and_page_floored() {
        let a = agg(
            vec![Canned {
                name: "a",
                titles: vec!["One story", "Another thing"],
                fail: false,
            }],
            AggregatorConfig::default(),
        );
        let r = a
            .fetch(&FetchOptions {
                page: Some(0),
                page_size: Some(10_000),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(r.page, 1);
        assert_eq!(r.page_size, 100);
        assert_eq!(r.articles.len(), 2);
        assert_eq!(r.source_count, 1);
        assert!(!r.degraded);
    }

    #[tokio::test]
    async fn fallback_disabled_is_aggregation_empty() {
        let cfg = AggregatorConfig {
            fallback_enabled: false,
            ..Default::default()
        };
        let a = agg(
            vec![Canned {
                name: "a",
                titles: vec![],
                fail: true,
            }],
            cfg,
        );
        let err = a.fetch(&FetchOptions::default()).await.unwrap_err();
        assert!(matches!(err, NewsError::AggregationEmpty));
    }

    #[tokio::test]
    async fn filter_with_no_match_on_live_data_is_empty_not_degraded() {
        let a = agg(
            vec![Canned {
                name: "a",
                titles: vec!["One story"],
                fail: false,
            }],
            AggregatorConfig::default(),
        );
        let r = a
            .fetch(&FetchOptions {
                query: Some("zeppelin".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(r.articles.is_empty());
        assert_eq!(r.total_results, 0);
        assert!(!r.degraded);
    }

    #[test]
    fn fetch_options_ignore_unknown_fields() {
        let o: FetchOptions =
            serde_json::from_str(r#"{"pageSize": 5, "sortBy": "title", "q": "fed", "colour": "red"}"#)
                .unwrap();
        assert_eq!(o.page_size, Some(5));
        assert_eq!(o.query.as_deref(), Some("fed"));
    }
}

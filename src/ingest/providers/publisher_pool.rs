// src/ingest/providers/publisher_pool.rs
use std::sync::Arc;

use async_trait::async_trait;

use crate::article::Article;
use crate::ingest::types::{RawArticle, SourceAdapter, SourceAdapterResult, SourceQuery};
use crate::store::JsonStore;

/// Serves articles promoted from the submission pipeline.
///
/// Items go back through the normalizer like any other source; ids and timestamps were
/// fixed at promotion time and survive the round trip.
pub struct PublisherPoolAdapter {
    pool: Arc<JsonStore<Article>>,
}

impl PublisherPoolAdapter {
    pub fn new(pool: Arc<JsonStore<Article>>) -> Self {
        Self { pool }
    }
}

fn to_raw(a: Article) -> RawArticle {
    RawArticle {
        // normalizer prefixes the adapter slug; strip ours so ids stay stable
        native_id: Some(
            a.id.strip_prefix("publisher-")
                .map(str::to_string)
                .unwrap_or(a.id),
        ),
        title: Some(a.title),
        summary: Some(a.summary),
        content: Some(a.content),
        author: Some(a.author),
        source_name: Some(a.source_name),
        published_at: Some(a.published_at.to_rfc3339()),
        image_url: Some(a.image_url),
        category_hint: Some(a.category.as_str().to_string()),
        country: a.country,
        domain: a.domain,
        url: a.source_url,
        verified: a.verified,
        publisher_id: a.publisher_id,
    }
}

#[async_trait]
impl SourceAdapter for PublisherPoolAdapter {
    async fn fetch_raw(&self, _query: &SourceQuery) -> SourceAdapterResult {
        let items = self.pool.values().into_iter().map(to_raw).collect();
        SourceAdapterResult::ok(self.name(), items)
    }

    fn name(&self) -> &str {
        "publisher"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::Category;
    use crate::ingest::normalize::Normalizer;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn promoted_articles_keep_their_id_through_normalization() {
        let pool = Arc::new(JsonStore::in_memory());
        let a = Article {
            id: "publisher-sub-000001".into(),
            title: "Council approves new bike lanes".into(),
            summary: "Three routes get protected lanes.".into(),
            content: "Three routes get protected lanes next spring.".into(),
            author: "Jo Reporter".into(),
            source_name: "Riverside Gazette".into(),
            published_at: Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap(),
            timestamp_estimated: false,
            image_url: "https://img.test/x.jpg".into(),
            category: Category::Politics,
            country: Some("us".into()),
            domain: None,
            source_url: None,
            verified: true,
            read_time_minutes: 1,
            publisher_id: Some("pub-1".into()),
        };
        pool.insert(a.id.clone(), a.clone()).unwrap();

        let adapter = PublisherPoolAdapter::new(pool);
        let res = adapter.fetch_raw(&SourceQuery::default()).await;
        assert!(res.success);
        let back = Normalizer::new()
            .normalize(adapter.name(), res.items[0].clone(), Utc::now())
            .unwrap();
        assert_eq!(back, a);
    }
}

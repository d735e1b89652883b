// src/ingest/types.rs
use serde::{Deserialize, Serialize};

use crate::article::Category;

/// What the aggregator asks of every adapter. Adapters ignore dimensions they can't filter on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceQuery {
    pub query: Option<String>,
    pub category: Option<Category>,
    pub country: Option<String>,
    pub domain: Option<String>,
    pub page: usize,
    pub page_size: usize,
}

/// Provider item mapped field-for-field, before any defaulting or inference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawArticle {
    pub native_id: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub source_name: Option<String>,
    /// RFC 3339, RFC 2822 or unix seconds, as delivered.
    pub published_at: Option<String>,
    pub image_url: Option<String>,
    pub category_hint: Option<String>,
    pub country: Option<String>,
    pub domain: Option<String>,
    pub url: Option<String>,
    /// Item comes from a trusted provider (or an approved submission).
    pub verified: bool,
    pub publisher_id: Option<String>,
}

/// Outcome of one adapter call. Failures carry no items.
#[derive(Debug, Clone)]
pub struct SourceAdapterResult {
    pub source: String,
    pub success: bool,
    pub items: Vec<RawArticle>,
    pub error: Option<String>,
}

impl SourceAdapterResult {
    pub fn ok(source: impl Into<String>, items: Vec<RawArticle>) -> Self {
        Self {
            source: source.into(),
            success: true,
            items,
            error: None,
        }
    }

    pub fn failed(source: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            success: false,
            items: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Fold a provider's internal result into the never-failing adapter contract.
    pub fn from_outcome(source: &str, outcome: anyhow::Result<Vec<RawArticle>>) -> Self {
        match outcome {
            Ok(items) => Self::ok(source, items),
            Err(e) => {
                let err = crate::error::NewsError::SourceUnavailable {
                    source_name: source.to_string(),
                    message: format!("{e:#}"),
                };
                tracing::warn!(target: "aggregator", error = %err, provider = source, "provider error");
                metrics::counter!("aggregator_source_errors_total").increment(1);
                Self::failed(source, err.to_string())
            }
        }
    }
}

#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Never fails: provider errors come back as `success == false`.
    async fn fetch_raw(&self, query: &SourceQuery) -> SourceAdapterResult;

    fn name(&self) -> &str;

    /// Cheap pre-filter so the aggregator can skip adapters the query can't use.
    fn is_relevant(&self, _query: &SourceQuery) -> bool {
        true
    }
}

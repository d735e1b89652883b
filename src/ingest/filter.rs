//! Feed filtering, ordering and paging.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::article::{Article, Category};

/// Conjunction of optional predicates. `None` dimensions match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedFilter {
    /// Lower-case category label; "all" is treated as no constraint.
    pub category: Option<String>,
    pub country: Option<String>,
    pub domain: Option<String>,
    /// Case-insensitive substring of title, summary or content.
    pub query: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

fn tag(v: &Option<String>) -> Option<String> {
    v.as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
}

impl FeedFilter {
    /// Drop blank values and the "all" category so they impose nothing. Category
    /// aliases ("tech", "sport") fold to the canonical label; unknown labels stay as given.
    pub fn cleaned(mut self) -> Self {
        self.category = tag(&self.category)
            .filter(|c| c != "all")
            .map(|c| Category::parse(&c).map_or(c, |k| k.as_str().to_string()));
        self.country = tag(&self.country);
        self.domain = tag(&self.domain);
        self.query = tag(&self.query);
        self
    }

    pub fn matches(&self, a: &Article) -> bool {
        if let Some(c) = &self.category {
            if a.category.as_str() != c.as_str() {
                return false;
            }
        }
        if let Some(k) = &self.country {
            if a.country.as_deref().map(str::to_lowercase).as_deref() != Some(k.as_str()) {
                return false;
            }
        }
        if let Some(d) = &self.domain {
            if a.domain.as_deref().map(str::to_lowercase).as_deref() != Some(d.as_str()) {
                return false;
            }
        }
        if let Some(q) = &self.query {
            let hit = [&a.title, &a.summary, &a.content]
                .iter()
                .any(|field| field.to_lowercase().contains(q.as_str()));
            if !hit {
                return false;
            }
        }
        if let Some(from) = self.from {
            if a.published_at < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if a.published_at > to {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    /// Newest first.
    #[default]
    PublishedAt,
    Title,
    SourceName,
}

impl SortKey {
    /// Unknown keys fall back to `PublishedAt`.
    pub fn parse(s: &str) -> SortKey {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" => SortKey::Title,
            "source" | "sourcename" | "source_name" => SortKey::SourceName,
            _ => SortKey::PublishedAt,
        }
    }
}

/// Filter then stable-sort; ties keep input order.
pub fn filter_and_rank(articles: Vec<Article>, filter: &FeedFilter, sort: SortKey) -> Vec<Article> {
    let mut out: Vec<Article> = articles.into_iter().filter(|a| filter.matches(a)).collect();
    match sort {
        SortKey::PublishedAt => out.sort_by(|a, b| b.published_at.cmp(&a.published_at)),
        SortKey::Title => out.sort_by_key(|a| a.title.to_lowercase()),
        SortKey::SourceName => out.sort_by_key(|a| a.source_name.to_lowercase()),
    }
    out
}

/// 1-based page slice `[(page-1)*size, page*size)`; out-of-range pages are empty.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Vec<T> {
    let page = page.max(1);
    let size = page_size.max(1);
    let start = (page - 1).saturating_mul(size);
    if start >= items.len() {
        return Vec::new();
    }
    let end = start.saturating_add(size).min(items.len());
    items[start..end].to_vec()
}

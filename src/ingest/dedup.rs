//! Duplicate-story removal.
//!
//! Two articles are the same story if any of:
//! - their normalized titles (lower-cased, punctuation stripped) are equal
//! - their source URLs are equal and non-empty
//! - title-token Jaccard similarity >= `similarity_threshold`
//!
//! Single order-preserving pass: each candidate is compared against the articles kept so
//! far and dropped on the first match. O(n²) in the worst case, fine for feeds of a few
//! hundred items. The first-seen article wins; fields are never merged.

use std::collections::HashSet;

use chrono::Duration;

use crate::article::Article;
use crate::similarity::{jaccard_sets, normalized_title, title_tokens};

#[derive(Clone, Debug)]
pub struct DedupParams {
    /// Jaccard similarity at or above which titles are near-duplicates.
    pub similarity_threshold: f32,
    /// When set, the near-duplicate rule only applies to articles published within this
    /// window of each other. Exact title and URL matches ignore it.
    pub window: Option<Duration>,
}

impl Default for DedupParams {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.8,
            window: None,
        }
    }
}

struct Kept {
    key: String,
    url: Option<String>,
    tokens: HashSet<String>,
    published_at: chrono::DateTime<chrono::Utc>,
}

/// Returns the kept articles (input order) and how many were dropped.
pub fn dedup(articles: Vec<Article>, params: &DedupParams) -> (Vec<Article>, usize) {
    let threshold = params.similarity_threshold.clamp(0.0, 1.0);
    let mut kept: Vec<Kept> = Vec::with_capacity(articles.len());
    let mut out = Vec::with_capacity(articles.len());
    let mut dropped = 0usize;

    for article in articles {
        let key = normalized_title(&article.title);
        let url = article
            .source_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string);
        let tokens = title_tokens(&article.title);

        let is_dup = kept.iter().any(|k| {
            if !key.is_empty() && k.key == key {
                return true;
            }
            if url.is_some() && k.url == url {
                return true;
            }
            let in_window = params
                .window
                .map_or(true, |w| (article.published_at - k.published_at).abs() <= w);
            in_window && jaccard_sets(&tokens, &k.tokens) >= threshold
        });

        if is_dup {
            dropped += 1;
            continue;
        }
        kept.push(Kept {
            key,
            url,
            tokens,
            published_at: article.published_at,
        });
        out.push(article);
    }

    (out, dropped)
}

//! Raw provider items → canonical [`Article`].
//!
//! Defaults applied here, in one place, so every adapter stays a thin field mapping:
//! - summary falls back to truncated content, then to "No description available"
//! - author falls back to "Unknown Author", source name to the adapter name
//! - category comes from the provider hint if recognized, else keyword inference
//! - unparseable timestamps become the fetch time, flagged `timestamp_estimated`
//! - items without a native id get a hash of (source, title, published_at)

use chrono::{DateTime, TimeZone, Utc};

use crate::article::{reading_time_minutes, Article, Category};
use crate::ingest::types::RawArticle;
use crate::ingest::{normalize_text, CONTENT_MAX_CHARS, SUMMARY_MAX_CHARS};

pub const NO_DESCRIPTION: &str = "No description available";
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";
const DERIVED_SUMMARY_CHARS: usize = 200;

/// Ordered keyword table; ties go to the earlier row.
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Technology,
        &[
            "tech", "technology", "ai", "software", "computer", "digital", "internet", "app",
            "startup", "cyber", "chip", "robot", "programming", "blockchain",
        ],
    ),
    (
        Category::Business,
        &[
            "business", "economy", "market", "markets", "finance", "company", "stock", "stocks",
            "earnings", "bank", "trade", "investors", "inflation", "fed", "rates",
        ],
    ),
    (
        Category::Politics,
        &[
            "politics", "government", "election", "policy", "minister", "senate", "congress",
            "parliament", "president", "vote", "bill", "legislature",
        ],
    ),
    (
        Category::Sports,
        &[
            "sports", "sport", "football", "basketball", "soccer", "game", "match", "league",
            "championship", "tournament", "olympics",
        ],
    ),
    (
        Category::Entertainment,
        &[
            "entertainment", "film", "movie", "music", "celebrity", "album", "hollywood",
            "box", "streaming", "series",
        ],
    ),
    (
        Category::Science,
        &[
            "science", "research", "study", "discovery", "experiment", "nasa", "space",
            "physics", "scientists", "exoplanet",
        ],
    ),
    (
        Category::Health,
        &[
            "health", "medical", "doctor", "hospital", "disease", "vaccine", "cancer",
            "treatment", "patients", "virus",
        ],
    ),
    (
        Category::World,
        &[
            "world", "international", "global", "united", "nations", "war", "summit",
            "foreign", "embassy",
        ],
    ),
    (
        Category::Environment,
        &[
            "environment", "climate", "renewable", "emissions", "carbon", "wildlife", "ocean",
            "conservation", "pollution",
        ],
    ),
    (
        Category::Education,
        &[
            "education", "school", "schools", "university", "students", "teachers", "learning",
            "literacy", "college",
        ],
    ),
];

/// Most keyword hits wins; ties by table order; no hits → general.
pub fn infer_category(text: &str) -> Category {
    let tokens: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect();

    let mut best = (Category::General, 0usize);
    for (category, words) in CATEGORY_KEYWORDS {
        let hits = tokens
            .iter()
            .filter(|t| words.contains(&t.as_str()))
            .count();
        if hits > best.1 {
            best = (*category, hits);
        }
    }
    best.0
}

/// RFC 3339, then RFC 2822, then unix seconds.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    s.parse::<i64>()
        .ok()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
}

/// Hex prefix of SHA-256 over the given parts.
pub(crate) fn short_hash(parts: &[&str]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    for p in parts {
        hasher.update(p.as_bytes());
        hasher.update([0x1f]);
    }
    let digest = hasher.finalize();
    let mut out = String::with_capacity(16);
    for b in digest.iter().take(8) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

fn non_blank(v: Option<String>, max_chars: usize) -> Option<String> {
    v.map(|s| normalize_text(&s, max_chars)).filter(|s| !s.is_empty())
}

fn derive_summary(content: &str) -> String {
    if content.chars().count() <= DERIVED_SUMMARY_CHARS {
        return content.to_string();
    }
    let mut s: String = content.chars().take(DERIVED_SUMMARY_CHARS).collect();
    s.push_str("...");
    s
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize one item. `None` when the item has no usable title.
    pub fn normalize(&self, adapter: &str, raw: RawArticle, now: DateTime<Utc>) -> Option<Article> {
        let title = non_blank(raw.title, SUMMARY_MAX_CHARS)?;
        let content = non_blank(raw.content, CONTENT_MAX_CHARS);
        let summary = non_blank(raw.summary, SUMMARY_MAX_CHARS)
            .or_else(|| content.as_deref().map(derive_summary))
            .unwrap_or_else(|| NO_DESCRIPTION.to_string());
        let content = content.unwrap_or_else(|| summary.clone());

        let author = non_blank(raw.author, 200).unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
        let source_name = non_blank(raw.source_name, 200).unwrap_or_else(|| adapter.to_string());

        let (published_at, timestamp_estimated) =
            match raw.published_at.as_deref().and_then(parse_timestamp) {
                Some(ts) => (ts, false),
                None => (now, true),
            };

        let category = raw
            .category_hint
            .as_deref()
            .and_then(Category::parse)
            .unwrap_or_else(|| infer_category(&format!("{title} {summary}")));

        let id = match raw.native_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(native) => format!("{}-{}", slug(adapter), native),
            None => format!(
                "{}-{}",
                slug(adapter),
                short_hash(&[&source_name, &title, &published_at.to_rfc3339()])
            ),
        };

        let image_url = raw
            .image_url
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| category.placeholder_image().to_string());

        let clean_tag = |v: Option<String>| {
            v.map(|s| s.trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
        };

        Some(Article {
            id,
            read_time_minutes: reading_time_minutes(&content),
            title,
            summary,
            content,
            author,
            source_name,
            published_at,
            timestamp_estimated,
            image_url,
            category,
            country: clean_tag(raw.country),
            domain: clean_tag(raw.domain),
            source_url: raw
                .url
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            verified: raw.verified,
            publisher_id: raw.publisher_id,
        })
    }

    /// Normalize a batch, dropping untitled items. Keeps input order.
    pub fn normalize_all(
        &self,
        adapter: &str,
        items: Vec<RawArticle>,
        now: DateTime<Utc>,
    ) -> Vec<Article> {
        items
            .into_iter()
            .filter_map(|raw| self.normalize(adapter, raw, now))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn raw(title: &str) -> RawArticle {
        RawArticle {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn missing_fields_get_defaults() {
        let a = Normalizer::new().normalize("NewsAPI", raw("Quiet day"), now()).unwrap();
        assert_eq!(a.summary, NO_DESCRIPTION);
        assert_eq!(a.content, NO_DESCRIPTION);
        assert_eq!(a.author, UNKNOWN_AUTHOR);
        assert_eq!(a.source_name, "NewsAPI");
        assert_eq!(a.published_at, now());
        assert!(a.timestamp_estimated);
        assert_eq!(a.category, Category::General);
        assert_eq!(a.image_url, Category::General.placeholder_image());
        assert!(a.id.starts_with("newsapi-"));
    }

    #[test]
    fn summary_derived_from_long_content() {
        let mut r = raw("Long read");
        r.content = Some("word ".repeat(100));
        let a = Normalizer::new().normalize("X", r, now()).unwrap();
        assert!(a.summary.ends_with("..."));
        assert_eq!(a.summary.chars().count(), DERIVED_SUMMARY_CHARS + 3);
    }

    #[test]
    fn untitled_items_are_dropped() {
        let mut r = raw("   ");
        r.summary = Some("body".into());
        assert!(Normalizer::new().normalize("X", r, now()).is_none());
    }

    #[test]
    fn native_id_is_prefixed_with_source() {
        let mut r = raw("Story");
        r.native_id = Some("world/2025/mar/01/story".into());
        let a = Normalizer::new().normalize("The Guardian", r, now()).unwrap();
        assert_eq!(a.id, "the-guardian-world/2025/mar/01/story");
    }

    #[test]
    fn hashed_id_is_stable() {
        let mut r = raw("Story");
        r.published_at = Some("2025-02-28T08:00:00Z".into());
        let a = Normalizer::new().normalize("X", r.clone(), now()).unwrap();
        let b = Normalizer::new().normalize("X", r, now()).unwrap();
        assert_eq!(a.id, b.id);
        assert!(!a.timestamp_estimated);
    }

    #[test]
    fn category_hint_wins_over_inference() {
        let mut r = raw("New software release");
        r.category_hint = Some("sport".into());
        let a = Normalizer::new().normalize("X", r, now()).unwrap();
        assert_eq!(a.category, Category::Sports);
    }

    #[test]
    fn unknown_hint_falls_back_to_inference() {
        let mut r = raw("Hospital expands cancer treatment");
        r.category_hint = Some("lifeandstyle".into());
        let a = Normalizer::new().normalize("X", r, now()).unwrap();
        assert_eq!(a.category, Category::Health);
    }

    #[test]
    fn inference_counts_hits_and_breaks_ties_by_order() {
        assert_eq!(infer_category("AI software startup raises money"), Category::Technology);
        // one technology hit, one business hit → earlier row wins
        assert_eq!(infer_category("software company"), Category::Technology);
        // two business hits beat one technology hit
        assert_eq!(infer_category("stock market digital"), Category::Business);
        // substring inside a word doesn't count
        assert_eq!(infer_category("He said hello"), Category::General);
    }

    #[test]
    fn timestamps_in_several_formats() {
        assert!(parse_timestamp("2025-02-28T08:00:00Z").is_some());
        assert!(parse_timestamp("Fri, 28 Feb 2025 08:00:00 GMT").is_some());
        assert_eq!(
            parse_timestamp("1700000000").map(|d| d.timestamp()),
            Some(1_700_000_000)
        );
        assert!(parse_timestamp("yesterday").is_none());
    }
}

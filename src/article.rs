//! Canonical article shape served by the feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed set of feed categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Technology,
    Business,
    Politics,
    Sports,
    Entertainment,
    Science,
    Health,
    World,
    Environment,
    Education,
    General,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Technology,
        Category::Business,
        Category::Politics,
        Category::Sports,
        Category::Entertainment,
        Category::Science,
        Category::Health,
        Category::World,
        Category::Environment,
        Category::Education,
        Category::General,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Technology => "technology",
            Category::Business => "business",
            Category::Politics => "politics",
            Category::Sports => "sports",
            Category::Entertainment => "entertainment",
            Category::Science => "science",
            Category::Health => "health",
            Category::World => "world",
            Category::Environment => "environment",
            Category::Education => "education",
            Category::General => "general",
        }
    }

    /// Lenient parse of provider section names and caller input.
    /// Unknown labels yield `None` so the normalizer can fall back to inference.
    pub fn parse(label: &str) -> Option<Category> {
        let l = label.trim().to_ascii_lowercase();
        let c = match l.as_str() {
            "technology" | "tech" | "ai" | "science-and-technology" => Category::Technology,
            "business" | "finance" | "economy" | "money" | "markets" => Category::Business,
            "politics" | "us-politics" | "uk-politics" | "government" => Category::Politics,
            "sports" | "sport" | "football" => Category::Sports,
            "entertainment" | "culture" | "film" | "music" | "books" | "tv-and-radio" => {
                Category::Entertainment
            }
            "science" => Category::Science,
            "health" | "society" | "wellness" => Category::Health,
            "world" | "world news" | "us-news" | "uk-news" | "international" => Category::World,
            "environment" | "climate" => Category::Environment,
            "education" => Category::Education,
            "general" | "news" => Category::General,
            _ => return None,
        };
        Some(c)
    }

    /// Deterministic placeholder image used when a source supplies none.
    pub fn placeholder_image(self) -> &'static str {
        match self {
            Category::Technology => {
                "https://images.unsplash.com/photo-1518709268805-4e9042af2176?w=400"
            }
            Category::Business => "https://images.unsplash.com/photo-1507679799987-c73779587ccf?w=400",
            Category::Sports => "https://images.unsplash.com/photo-1461896836934-ffe607ba8211?w=400",
            Category::Entertainment => {
                "https://images.unsplash.com/photo-1489599735734-79b4169c2a78?w=400"
            }
            Category::Science => "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?w=400",
            Category::Health => "https://images.unsplash.com/photo-1559757148-5c350d0d3c56?w=400",
            Category::World => "https://images.unsplash.com/photo-1506905925346-21bda4d32df4?w=400",
            Category::Politics => "https://images.unsplash.com/photo-1529107386315-e1a2ed48a620?w=400",
            Category::Environment => {
                "https://images.unsplash.com/photo-1569163139394-de4e4f43e4e5?w=400"
            }
            Category::Education => {
                "https://images.unsplash.com/photo-1523240795612-9a054b0db644?w=400"
            }
            Category::General => "https://images.unsplash.com/photo-1504711434969-e33886168f5c?w=400",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized news item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub author: String,
    pub source_name: String,
    pub published_at: DateTime<Utc>,
    /// `published_at` was missing or unparseable and was set to the fetch time.
    #[serde(default)]
    pub timestamp_estimated: bool,
    pub image_url: String,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub verified: bool,
    pub read_time_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher_id: Option<String>,
}

/// `ceil(words / 200)`, never below one minute.
pub fn reading_time_minutes(text: &str) -> u32 {
    let words = text.split_whitespace().count() as u32;
    words.div_ceil(200).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_provider_aliases() {
        assert_eq!(Category::parse("sport"), Some(Category::Sports));
        assert_eq!(Category::parse(" Technology "), Some(Category::Technology));
        assert_eq!(Category::parse("us-news"), Some(Category::World));
        assert_eq!(Category::parse("lifeandstyle"), None);
    }

    #[test]
    fn every_category_round_trips_through_parse() {
        for c in Category::ALL {
            assert_eq!(Category::parse(c.as_str()), Some(c));
        }
    }

    #[test]
    fn reading_time_rounds_up() {
        assert_eq!(reading_time_minutes(""), 1);
        assert_eq!(reading_time_minutes(&"word ".repeat(200)), 1);
        assert_eq!(reading_time_minutes(&"word ".repeat(201)), 2);
    }
}

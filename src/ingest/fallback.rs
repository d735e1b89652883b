//! Built-in articles served when every source is down.

use chrono::{DateTime, Duration, Utc};

use crate::article::{reading_time_minutes, Article, Category};

// (id, hours ago, category, title, summary, author, source)
const SEED: &[(&str, i64, Category, &str, &str, &str, &str)] = &[
    (
        "tech-1",
        1,
        Category::Technology,
        "Revolutionary AI Breakthrough in Neural Networks",
        "Scientists develop new neural network architecture that mimics human brain processing more accurately.",
        "Dr. Sarah Chen",
        "Tech Innovation",
    ),
    (
        "tech-2",
        4,
        Category::Technology,
        "Google DeepMind Achieves Breakthrough in Protein Folding",
        "AlphaFold 3 demonstrates unprecedented accuracy in predicting protein structures, revolutionizing drug discovery.",
        "DeepMind Research",
        "Nature AI",
    ),
    (
        "biz-1",
        3,
        Category::Business,
        "Tesla Reports Record Quarterly Earnings",
        "Electric vehicle manufacturer Tesla exceeds Wall Street expectations with strong Q4 performance.",
        "Financial Reporter",
        "Business Wire",
    ),
    (
        "biz-2",
        5,
        Category::Business,
        "Global Markets Show Mixed Signals Amid Economic Uncertainty",
        "Stock markets worldwide display volatility as investors weigh inflation concerns against growth prospects.",
        "Market Analyst",
        "Financial Times",
    ),
    (
        "sport-1",
        2,
        Category::Sports,
        "Championship Finals Set for This Weekend",
        "Two powerhouse teams prepare for the ultimate showdown in what promises to be an epic finale.",
        "Sports Reporter",
        "ESPN",
    ),
    (
        "ent-1",
        6,
        Category::Entertainment,
        "New Blockbuster Film Breaks Opening Weekend Records",
        "Latest superhero movie shatters box office expectations with record-breaking opening weekend performance.",
        "Entertainment Correspondent",
        "Hollywood Reporter",
    ),
    (
        "sci-1",
        8,
        Category::Science,
        "NASA Discovers Potentially Habitable Exoplanet",
        "Space telescope identifies Earth-like planet in habitable zone of distant star system.",
        "Space Correspondent",
        "NASA News",
    ),
    (
        "health-1",
        7,
        Category::Health,
        "Breakthrough in Cancer Treatment Shows Promise",
        "New immunotherapy approach demonstrates significant success rates in clinical trials.",
        "Medical Reporter",
        "Medical Journal",
    ),
    (
        "world-1",
        9,
        Category::World,
        "International Climate Summit Reaches Historic Agreement",
        "World leaders unite on ambitious climate action plan with concrete emission reduction targets.",
        "Global Correspondent",
        "World News",
    ),
    (
        "pol-1",
        10,
        Category::Politics,
        "New Infrastructure Bill Passes Legislature",
        "Comprehensive infrastructure package approved with bipartisan support for national development.",
        "Political Reporter",
        "Political News",
    ),
    (
        "env-1",
        11,
        Category::Environment,
        "Renewable Energy Reaches New Milestone",
        "Solar and wind power generation hits record highs as clean energy adoption accelerates globally.",
        "Environmental Reporter",
        "Green Energy Today",
    ),
    (
        "edu-1",
        13,
        Category::Education,
        "AI-Powered Learning Platforms Transform Education",
        "Personalized AI tutoring systems show significant improvement in student learning outcomes.",
        "Education Correspondent",
        "EdTech News",
    ),
    (
        "gen-1",
        12,
        Category::General,
        "Community Volunteers Restore Historic Town Library",
        "Residents spent six months restoring the century-old building, which reopens to the public next week.",
        "Staff Writer",
        "Daily Bulletin",
    ),
];

/// The fallback set, timestamped relative to `now`.
pub fn fallback_articles(now: DateTime<Utc>) -> Vec<Article> {
    SEED.iter()
        .map(|(id, hours_ago, category, title, summary, author, source)| Article {
            id: format!("fallback-{id}"),
            title: (*title).to_string(),
            summary: (*summary).to_string(),
            content: (*summary).to_string(),
            author: (*author).to_string(),
            source_name: (*source).to_string(),
            published_at: now - Duration::hours(*hours_ago),
            timestamp_estimated: false,
            image_url: category.placeholder_image().to_string(),
            category: *category,
            country: None,
            domain: None,
            source_url: None,
            verified: true,
            read_time_minutes: reading_time_minutes(summary),
            publisher_id: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn covers_every_category_with_unique_ids() {
        let v = fallback_articles(Utc::now());
        let cats: HashSet<_> = v.iter().map(|a| a.category).collect();
        assert_eq!(cats.len(), Category::ALL.len());
        let ids: HashSet<_> = v.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids.len(), v.len());
    }
}

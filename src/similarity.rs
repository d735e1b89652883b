//! Title comparison shared by the deduplicator and the risk scorer.
//!
//! Word-overlap (Jaccard) over lower-cased alphanumeric tokens. Short generic titles
//! ("Live updates") can false-merge; thresholds are configurable for that reason.

use std::collections::HashSet;

/// Lower-cased alphanumeric tokens of `s`.
pub fn title_tokens(s: &str) -> HashSet<String> {
    s.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|t| t.trim_matches('\'').to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Case and punctuation insensitive key: lower-cased alphanumerics only.
pub fn normalized_title(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// |A ∩ B| / |A ∪ B| over title tokens. Two empty titles are not similar.
pub fn jaccard(a: &str, b: &str) -> f32 {
    jaccard_sets(&title_tokens(a), &title_tokens(b))
}

pub fn jaccard_sets(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f32 / union as f32
}

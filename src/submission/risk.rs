//! Heuristic risk score for publisher drafts.
//!
//! Every signal is evaluated and recorded as a [`RiskReason`]; the score is the clamped
//! sum of their weights. Pure: the caller supplies the publisher record and prior titles.

use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::publisher::Publisher;
use crate::similarity::{jaccard_sets, title_tokens};
use crate::submission::DraftArticle;

pub const SUSPICIOUS_PHRASES: &[&str] = &[
    "shocking",
    "unbelievable",
    "secret",
    "hidden truth",
    "they don't want you to know",
    "miracle cure",
    "instant",
    "guaranteed",
    "exclusive",
    "leaked",
];

/// Signal weights and thresholds. Any subset can be overridden from config.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub suspicious_phrase: f32,
    pub caps_ratio_threshold: f32,
    pub caps_penalty: f32,
    pub exclamation_limit: usize,
    pub exclamation_penalty: f32,
    pub unknown_publisher: f32,
    pub low_reputation_below: f32,
    pub low_reputation: f32,
    pub unverified_publisher: f32,
    pub few_articles_below: u32,
    pub few_articles: f32,
    pub near_duplicate_above: f32,
    pub near_duplicate: f32,
    pub similar_title_above: f32,
    pub similar_title: f32,
    /// Verified publishers scoring below this skip the queue.
    pub auto_approve_below: f32,
    /// Scores at or above this are queued as high priority.
    pub high_risk_at: f32,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            suspicious_phrase: 0.1,
            caps_ratio_threshold: 0.3,
            caps_penalty: 0.2,
            exclamation_limit: 2,
            exclamation_penalty: 0.15,
            unknown_publisher: 0.5,
            low_reputation_below: 50.0,
            low_reputation: 0.3,
            unverified_publisher: 0.2,
            few_articles_below: 5,
            few_articles: 0.1,
            near_duplicate_above: 0.8,
            near_duplicate: 0.4,
            similar_title_above: 0.6,
            similar_title: 0.2,
            auto_approve_below: 0.3,
            high_risk_at: 0.7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSignal {
    SuspiciousLanguage,
    Capitalization,
    Exclamations,
    UnknownPublisher,
    LowReputation,
    UnverifiedPublisher,
    FewArticles,
    DuplicateTitle,
}

/// One contribution to the score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReason {
    pub signal: RiskSignal,
    pub message: String,
    pub weight: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Clamped to [0, 1].
    pub score: f32,
    pub reasons: Vec<RiskReason>,
}

fn suspicious_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        let alts: Vec<String> = SUSPICIOUS_PHRASES.iter().map(|p| regex::escape(p)).collect();
        Regex::new(&format!(r"\b(?:{})\b", alts.join("|"))).unwrap()
    })
}

/// Occurrences of suspicious phrases, whole words only, case-insensitive.
pub fn suspicious_phrase_count(text: &str) -> usize {
    let folded = text.to_lowercase().replace(['\u{2018}', '\u{2019}'], "'");
    suspicious_re().find_iter(&folded).count()
}

/// Uppercase letters over alphabetic letters; 0 when there are no letters.
pub fn caps_ratio(title: &str) -> f32 {
    let (upper, letters) = title
        .chars()
        .filter(|c| c.is_alphabetic())
        .fold((0usize, 0usize), |(u, l), c| (u + c.is_uppercase() as usize, l + 1));
    if letters == 0 {
        0.0
    } else {
        upper as f32 / letters as f32
    }
}

#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    weights: RiskWeights,
}

impl RiskScorer {
    pub fn new(weights: RiskWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &RiskWeights {
        &self.weights
    }

    /// Score `draft`. `publisher` is `None` when the id is unknown to the registry;
    /// `prior_titles` are the titles of every earlier submission.
    pub fn score<I, S>(
        &self,
        draft: &DraftArticle,
        publisher: Option<&Publisher>,
        prior_titles: I,
    ) -> RiskAssessment
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let w = &self.weights;
        let mut reasons = Vec::new();
        let mut add = |signal, weight: f32, message: String| {
            reasons.push(RiskReason {
                signal,
                message,
                weight,
            });
        };

        let text = format!("{} {} {}", draft.title, draft.summary, draft.content);
        let hits = suspicious_phrase_count(&text);
        if hits > 0 {
            add(
                RiskSignal::SuspiciousLanguage,
                hits as f32 * w.suspicious_phrase,
                format!("{hits} suspicious phrase(s)"),
            );
        }

        let ratio = caps_ratio(&draft.title);
        if ratio > w.caps_ratio_threshold {
            add(
                RiskSignal::Capitalization,
                w.caps_penalty,
                format!("title is {:.0}% capitals", ratio * 100.0),
            );
        }

        let bangs = draft.title.matches('!').count();
        if bangs > w.exclamation_limit {
            add(
                RiskSignal::Exclamations,
                w.exclamation_penalty,
                format!("{bangs} exclamation marks in title"),
            );
        }

        match publisher {
            None => add(
                RiskSignal::UnknownPublisher,
                w.unknown_publisher,
                "unknown publisher".to_string(),
            ),
            Some(p) => {
                if p.reputation < w.low_reputation_below {
                    add(
                        RiskSignal::LowReputation,
                        w.low_reputation,
                        format!("publisher reputation {:.0}", p.reputation),
                    );
                }
                if !p.verified {
                    add(
                        RiskSignal::UnverifiedPublisher,
                        w.unverified_publisher,
                        "publisher not verified".to_string(),
                    );
                }
                if p.articles_published < w.few_articles_below {
                    add(
                        RiskSignal::FewArticles,
                        w.few_articles,
                        format!("{} articles published", p.articles_published),
                    );
                }
            }
        }

        let tokens = title_tokens(&draft.title);
        let best = prior_titles
            .into_iter()
            .map(|t| jaccard_sets(&tokens, &title_tokens(t.as_ref())))
            .fold(0.0f32, f32::max);
        if best > w.near_duplicate_above {
            add(
                RiskSignal::DuplicateTitle,
                w.near_duplicate,
                format!("title {:.0}% similar to an earlier submission", best * 100.0),
            );
        } else if best > w.similar_title_above {
            add(
                RiskSignal::DuplicateTitle,
                w.similar_title,
                format!("title {:.0}% similar to an earlier submission", best * 100.0),
            );
        }

        let score = reasons.iter().map(|r| r.weight).sum::<f32>().clamp(0.0, 1.0);
        RiskAssessment { score, reasons }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str) -> DraftArticle {
        DraftArticle {
            title: title.into(),
            summary: "Council met on Tuesday.".into(),
            content: "The council met on Tuesday to discuss the budget.".into(),
            publisher_id: "p1".into(),
            ..Default::default()
        }
    }

    fn trusted() -> Publisher {
        let mut p = Publisher::new("p1", "Gazette");
        p.reputation = 90.0;
        p.verified = true;
        p.articles_published = 20;
        p
    }

    #[test]
    fn clean_draft_from_trusted_publisher_scores_zero() {
        let a = RiskScorer::default().score(&draft("Council passes budget"), Some(&trusted()), [""; 0]);
        assert_eq!(a.score, 0.0);
        assert!(a.reasons.is_empty());
    }

    #[test]
    fn phrases_count_every_occurrence_as_whole_words() {
        assert_eq!(suspicious_phrase_count("Secret deal, SECRET memo"), 2);
        assert_eq!(suspicious_phrase_count("secretary of state"), 0);
        assert_eq!(suspicious_phrase_count("They don\u{2019}t want you to know"), 1);
        assert_eq!(suspicious_phrase_count("Instantly"), 0);
    }

    #[test]
    fn caps_ratio_counts_letters_only() {
        assert!((caps_ratio("ABC def!!") - 0.5).abs() < 1e-6);
        assert_eq!(caps_ratio("123 !!"), 0.0);
    }

    #[test]
    fn clickbait_from_unknown_publisher_is_clamped_to_one() {
        let d = draft("SHOCKING SECRET they don't want you to know!!!");
        let a = RiskScorer::default().score(&d, None, [""; 0]);
        assert_eq!(a.score, 1.0);
        let signals: Vec<_> = a.reasons.iter().map(|r| r.signal).collect();
        assert_eq!(
            signals,
            vec![
                RiskSignal::SuspiciousLanguage,
                RiskSignal::Capitalization,
                RiskSignal::Exclamations,
                RiskSignal::UnknownPublisher,
            ]
        );
    }

    #[test]
    fn new_unverified_publisher_accumulates_penalties() {
        let p = Publisher::new("p1", "Fresh");
        let a = RiskScorer::default().score(&draft("Council passes budget"), Some(&p), [""; 0]);
        // 0.3 reputation + 0.2 unverified + 0.1 few articles
        assert!((a.score - 0.6).abs() < 1e-6);
    }

    #[test]
    fn duplicate_proximity_uses_best_match() {
        let s = RiskScorer::default();
        let d = draft("Council passes annual city budget");
        let near = s.score(&d, Some(&trusted()), ["Council passes annual city budget today"]);
        assert!((near.score - 0.4).abs() < 1e-6);
        let medium = s.score(
            &d,
            Some(&trusted()),
            ["Unrelated story", "Council passes annual budget plan"],
        );
        assert!((medium.score - 0.2).abs() < 1e-6);
    }

    #[test]
    fn adding_a_phrase_never_lowers_the_score() {
        let s = RiskScorer::default();
        let p = Publisher::new("p1", "Fresh");
        let base = draft("Council passes budget");
        let mut worse = base.clone();
        worse.content.push_str(" A guaranteed outcome.");
        let a = s.score(&base, Some(&p), [""; 0]).score;
        let b = s.score(&worse, Some(&p), [""; 0]).score;
        assert!(b >= a);
    }
}

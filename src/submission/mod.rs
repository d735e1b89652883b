//! Publisher submissions: risk scoring, routing and moderation.

pub mod pipeline;
pub mod risk;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use pipeline::SubmissionPipeline;
pub use risk::{RiskAssessment, RiskReason, RiskScorer, RiskSignal, RiskWeights};

/// Actor recorded on transitions made by the router itself.
pub const SYSTEM_ACTOR: &str = "auto_system";

/// Publisher-authored article as submitted. Arrives fully formed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DraftArticle {
    pub title: String,
    pub summary: String,
    pub content: String,
    pub publisher_id: String,
    /// Free-form label; "breaking" forces high priority.
    pub category: Option<String>,
    pub author: Option<String>,
    pub image_url: Option<String>,
    pub country: Option<String>,
    pub domain: Option<String>,
    pub source_url: Option<String>,
}

impl DraftArticle {
    /// Names of required fields that are missing or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("title", &self.title),
            ("summary", &self.summary),
            ("content", &self.content),
            ("publisherId", &self.publisher_id),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    AutoApproved,
    Queued,
    Reviewed,
}

impl SubmissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::AutoApproved => "auto_approved",
            SubmissionStatus::Queued => "queued",
            SubmissionStatus::Reviewed => "reviewed",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Moderation urgency. Ordering is by urgency: `Low < Normal < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Priority> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "normal" => Some(Priority::Normal),
            "high" => Some(Priority::High),
            _ => None,
        }
    }

    pub fn estimated_review_time(self) -> &'static str {
        match self {
            Priority::High => "1-2 hours",
            Priority::Normal => "4-8 hours",
            Priority::Low => "12-24 hours",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approved,
    Rejected,
    NeedsRevision,
}

impl ReviewDecision {
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewDecision::Approved => "approved",
            ReviewDecision::Rejected => "rejected",
            ReviewDecision::NeedsRevision => "needs_revision",
        }
    }
}

impl fmt::Display for ReviewDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit-trail entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub from: SubmissionStatus,
    pub to: SubmissionStatus,
    pub at: DateTime<Utc>,
    pub actor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub id: String,
    /// Monotonic; breaks queue-order ties and is never reused.
    pub seq: u64,
    pub draft: DraftArticle,
    pub publisher_id: String,
    pub risk_score: f32,
    #[serde(default)]
    pub risk_reasons: Vec<RiskReason>,
    pub priority: Priority,
    pub status: SubmissionStatus,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<ReviewDecision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Append-only.
    #[serde(default)]
    pub history: Vec<Transition>,
}

impl SubmissionRecord {
    pub fn estimated_review_time(&self) -> &'static str {
        match self.status {
            SubmissionStatus::AutoApproved => "immediate",
            _ => self.priority.estimated_review_time(),
        }
    }
}

/// Returned by `submit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub id: String,
    pub status: SubmissionStatus,
    pub priority: Priority,
    pub risk_score: f32,
    pub estimated_review_time: String,
}

/// Returned by `review`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub success: bool,
    pub message: String,
}

/// Submitter-facing lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub id: String,
    pub status: SubmissionStatus,
    pub priority: Priority,
    pub risk_score: f32,
    pub estimated_review_time: String,
    /// 1-based position in the moderation queue; only while queued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<ReviewDecision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub pending: usize,
    /// Manually approved plus auto-approved.
    pub approved: usize,
    pub auto_approved: usize,
    pub rejected: usize,
    pub needs_revision: usize,
    pub high_priority_pending: usize,
    /// Mean submit-to-review time over manual reviews, rounded to whole hours.
    pub average_review_hours: u64,
}

pub(crate) fn ensure_metrics_described() {
    use metrics::describe_counter;
    use once_cell::sync::OnceCell;

    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("submission_received_total", "Drafts accepted for scoring.");
        describe_counter!(
            "submission_auto_approved_total",
            "Drafts approved without manual review."
        );
        describe_counter!("submission_queued_total", "Drafts routed to moderation.");
        describe_counter!(
            "submission_reviewed_total",
            "Manual review decisions, labelled by decision."
        );
        describe_counter!(
            "submission_rejected_input_total",
            "Drafts refused for missing required fields."
        );
    });
}

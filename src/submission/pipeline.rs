//! Intake, routing and moderation of publisher drafts.
//!
//! `submit` scores a draft and either auto-approves it or queues it; `review` is the
//! moderator's one-shot decision on a queued record. Both run their check-and-transition
//! inside a single store write, so concurrent callers can't double-decide a record.

use std::cmp::Reverse;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::article::Article;
use crate::error::{SubmissionError, SubmissionResult};
use crate::ingest::normalize::Normalizer;
use crate::ingest::types::RawArticle;
use crate::publisher::{Publisher, PublisherRegistry};
use crate::similarity::title_tokens;
use crate::store::JsonStore;
use crate::submission::{
    ensure_metrics_described, DraftArticle, Priority, ReviewDecision, ReviewOutcome, RiskScorer,
    RiskWeights, Stats, StatusView, SubmissionReceipt, SubmissionRecord, SubmissionStatus,
    Transition, SYSTEM_ACTOR,
};

/// Words in a title or summary that send a draft to the front of the queue.
pub const SENSITIVE_TERMS: &[&str] = &["breaking", "politics", "health", "crisis", "emergency"];

/// Adapter name promoted articles are filed under.
pub const POOL_SOURCE: &str = "publisher";

/// Flattened audit trail entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub submission_id: String,
    #[serde(flatten)]
    pub transition: Transition,
}

pub struct SubmissionPipeline {
    registry: Arc<dyn PublisherRegistry>,
    records: Arc<JsonStore<SubmissionRecord>>,
    pool: Arc<JsonStore<Article>>,
    scorer: RiskScorer,
    normalizer: Normalizer,
    seq: AtomicU64,
}

/// Queue priority from content signals, risk and publisher trust.
pub fn compute_priority(
    draft: &DraftArticle,
    risk_score: f32,
    publisher: Option<&Publisher>,
    weights: &RiskWeights,
) -> Priority {
    let mut tokens = title_tokens(&draft.title);
    tokens.extend(title_tokens(&draft.summary));
    let sensitive = SENSITIVE_TERMS.iter().any(|t| tokens.contains(*t));
    let breaking = draft
        .category
        .as_deref()
        .is_some_and(|c| c.trim().eq_ignore_ascii_case("breaking"));

    if sensitive || breaking || risk_score >= weights.high_risk_at {
        return Priority::High;
    }
    match publisher {
        Some(p) if p.verified && p.reputation > 80.0 => Priority::Low,
        _ => Priority::Normal,
    }
}

fn queue_order(a: &SubmissionRecord, b: &SubmissionRecord) -> std::cmp::Ordering {
    (Reverse(a.priority), a.submitted_at, a.seq).cmp(&(Reverse(b.priority), b.submitted_at, b.seq))
}

impl SubmissionPipeline {
    pub fn new(
        registry: Arc<dyn PublisherRegistry>,
        records: Arc<JsonStore<SubmissionRecord>>,
        pool: Arc<JsonStore<Article>>,
        weights: RiskWeights,
    ) -> Self {
        ensure_metrics_described();
        // continue numbering after whatever the snapshot already holds
        let last = records.values().iter().map(|r| r.seq).max().unwrap_or(0);
        Self {
            registry,
            records,
            pool,
            scorer: RiskScorer::new(weights),
            normalizer: Normalizer::new(),
            seq: AtomicU64::new(last),
        }
    }

    /// Fresh in-memory stores and default weights.
    pub fn in_memory(registry: Arc<dyn PublisherRegistry>) -> Self {
        Self::new(
            registry,
            Arc::new(JsonStore::in_memory()),
            Arc::new(JsonStore::in_memory()),
            RiskWeights::default(),
        )
    }

    /// The promoted-article pool, for wiring a `PublisherPoolAdapter`.
    pub fn pool(&self) -> Arc<JsonStore<Article>> {
        Arc::clone(&self.pool)
    }

    pub fn submit(&self, draft: DraftArticle) -> SubmissionResult<SubmissionReceipt> {
        self.submit_at(draft, Utc::now())
    }

    pub fn submit_at(
        &self,
        draft: DraftArticle,
        now: DateTime<Utc>,
    ) -> SubmissionResult<SubmissionReceipt> {
        let missing = draft.missing_fields();
        if !missing.is_empty() {
            counter!("submission_rejected_input_total").increment(1);
            debug!(target: "submission", ?missing, "draft rejected");
            return Err(SubmissionError::Validation { missing });
        }
        counter!("submission_received_total").increment(1);

        let publisher = self.registry.get_publisher(&draft.publisher_id);
        let weights = *self.scorer.weights();

        let record = self.records.write(|map| {
            let assessment = self.scorer.score(
                &draft,
                publisher.as_ref(),
                map.values().map(|r| r.draft.title.as_str()),
            );
            let priority = compute_priority(&draft, assessment.score, publisher.as_ref(), &weights);
            let verified = publisher.as_ref().is_some_and(|p| p.verified);
            let status = if assessment.score < weights.auto_approve_below && verified {
                SubmissionStatus::AutoApproved
            } else {
                SubmissionStatus::Queued
            };

            let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
            let id = format!("sub-{seq:06}");
            let record = SubmissionRecord {
                id: id.clone(),
                seq,
                publisher_id: draft.publisher_id.clone(),
                draft,
                risk_score: assessment.score,
                risk_reasons: assessment.reasons,
                priority,
                status,
                submitted_at: now,
                decision: None,
                feedback: None,
                reviewer_id: None,
                reviewed_at: None,
                history: vec![Transition {
                    from: SubmissionStatus::Pending,
                    to: status,
                    at: now,
                    actor: SYSTEM_ACTOR.to_string(),
                    note: Some(format!("risk {:.2}", assessment.score)),
                }],
            };
            map.insert(id, record.clone());
            record
        })?;

        if record.status == SubmissionStatus::AutoApproved {
            if let Err(e) = self.promote(&record, publisher.as_ref(), false, now) {
                warn!(target: "submission", id = %record.id, error = %e, "promotion failed, submission dropped");
                self.records.write(|map| {
                    map.remove(&record.id);
                })?;
                return Err(e);
            }
            counter!("submission_auto_approved_total").increment(1);
            self.registry
                .update_reputation(&record.publisher_id, 1.0, "Article auto-approved");
            self.registry.increment_article_count(&record.publisher_id);
        } else {
            counter!("submission_queued_total").increment(1);
        }

        info!(
            target: "submission",
            id = %record.id,
            publisher = %record.publisher_id,
            status = %record.status,
            priority = %record.priority,
            risk = record.risk_score,
            "submission routed"
        );

        Ok(SubmissionReceipt {
            id: record.id.clone(),
            status: record.status,
            priority: record.priority,
            risk_score: record.risk_score,
            estimated_review_time: record.estimated_review_time().to_string(),
        })
    }

    pub fn review(
        &self,
        id: &str,
        decision: ReviewDecision,
        feedback: Option<String>,
        reviewer_id: &str,
    ) -> SubmissionResult<ReviewOutcome> {
        self.review_at(id, decision, feedback, reviewer_id, Utc::now())
    }

    pub fn review_at(
        &self,
        id: &str,
        decision: ReviewDecision,
        feedback: Option<String>,
        reviewer_id: &str,
        now: DateTime<Utc>,
    ) -> SubmissionResult<ReviewOutcome> {
        if reviewer_id.trim().is_empty() {
            return Err(SubmissionError::Validation {
                missing: vec!["reviewerId"],
            });
        }

        let (previous, record) = self.records.write(|map| {
            let rec = map
                .get_mut(id)
                .ok_or_else(|| SubmissionError::NotFound(id.to_string()))?;
            match rec.status {
                SubmissionStatus::Queued => {}
                SubmissionStatus::Reviewed => {
                    return Err(SubmissionError::AlreadyReviewed(id.to_string()))
                }
                status => {
                    return Err(SubmissionError::NotQueued {
                        id: id.to_string(),
                        status,
                    })
                }
            }
            let previous = rec.clone();
            rec.status = SubmissionStatus::Reviewed;
            rec.decision = Some(decision);
            rec.feedback = feedback.filter(|f| !f.trim().is_empty());
            rec.reviewer_id = Some(reviewer_id.to_string());
            rec.reviewed_at = Some(now);
            rec.history.push(Transition {
                from: SubmissionStatus::Queued,
                to: SubmissionStatus::Reviewed,
                at: now,
                actor: reviewer_id.to_string(),
                note: Some(decision.to_string()),
            });
            Ok((previous, rec.clone()))
        })??;

        // an approval only sticks once the article is in the pool
        if decision == ReviewDecision::Approved {
            let publisher = self.registry.get_publisher(&record.publisher_id);
            if let Err(e) = self.promote(&record, publisher.as_ref(), true, now) {
                warn!(target: "submission", id = %record.id, error = %e, "promotion failed, review undone");
                self.records.write(move |map| {
                    map.insert(previous.id.clone(), previous);
                })?;
                return Err(e);
            }
        }

        match decision {
            ReviewDecision::Approved => {
                self.registry
                    .update_reputation(&record.publisher_id, 2.0, "Article approved after review");
                self.registry.increment_article_count(&record.publisher_id);
            }
            ReviewDecision::Rejected => {
                self.registry
                    .update_reputation(&record.publisher_id, -1.0, "Article rejected");
            }
            ReviewDecision::NeedsRevision => {}
        }

        counter!("submission_reviewed_total", "decision" => decision.as_str()).increment(1);
        info!(
            target: "submission",
            id = %record.id,
            reviewer = %reviewer_id,
            decision = %decision,
            "submission reviewed"
        );

        Ok(ReviewOutcome {
            success: true,
            message: format!("Submission {id} {decision}"),
        })
    }

    fn promote(
        &self,
        record: &SubmissionRecord,
        publisher: Option<&Publisher>,
        verified: bool,
        now: DateTime<Utc>,
    ) -> SubmissionResult<()> {
        let d = &record.draft;
        let publisher_name = publisher
            .map(|p| p.name.clone())
            .unwrap_or_else(|| record.publisher_id.clone());
        let raw = RawArticle {
            native_id: Some(record.id.clone()),
            title: Some(d.title.clone()),
            summary: Some(d.summary.clone()),
            content: Some(d.content.clone()),
            author: d.author.clone().or_else(|| Some(publisher_name.clone())),
            source_name: Some(publisher_name),
            published_at: Some(now.to_rfc3339()),
            image_url: d.image_url.clone(),
            category_hint: d.category.clone(),
            country: d.country.clone(),
            domain: d.domain.clone(),
            url: d.source_url.clone(),
            verified,
            publisher_id: Some(record.publisher_id.clone()),
        };
        if let Some(article) = self.normalizer.normalize(POOL_SOURCE, raw, now) {
            debug!(target: "submission", id = %record.id, article = %article.id, verified, "promoted");
            self.pool.insert(article.id.clone(), article)?;
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<SubmissionRecord> {
        self.records.get(id)
    }

    /// Queued records in moderation order, optionally one priority only.
    pub fn queue(&self, priority: Option<Priority>) -> Vec<SubmissionRecord> {
        let mut q: Vec<_> = self
            .records
            .values()
            .into_iter()
            .filter(|r| r.status == SubmissionStatus::Queued)
            .filter(|r| priority.map_or(true, |want| want == r.priority))
            .collect();
        q.sort_by(queue_order);
        q
    }

    pub fn status(&self, id: &str) -> SubmissionResult<StatusView> {
        let rec = self
            .records
            .get(id)
            .ok_or_else(|| SubmissionError::NotFound(id.to_string()))?;
        let queue_position = (rec.status == SubmissionStatus::Queued)
            .then(|| self.queue(None).iter().position(|r| r.id == rec.id))
            .flatten()
            .map(|i| i + 1);
        Ok(StatusView {
            estimated_review_time: rec.estimated_review_time().to_string(),
            id: rec.id,
            status: rec.status,
            priority: rec.priority,
            risk_score: rec.risk_score,
            queue_position,
            decision: rec.decision,
            feedback: rec.feedback,
            reviewed_at: rec.reviewed_at,
        })
    }

    pub fn stats(&self) -> Stats {
        let all = self.records.values();
        let mut s = Stats::default();
        let mut review_secs: Vec<i64> = Vec::new();
        for r in &all {
            match (r.status, r.decision) {
                (SubmissionStatus::Queued, _) => {
                    s.pending += 1;
                    if r.priority == Priority::High {
                        s.high_priority_pending += 1;
                    }
                }
                (SubmissionStatus::AutoApproved, _) => {
                    s.auto_approved += 1;
                    s.approved += 1;
                }
                (SubmissionStatus::Reviewed, Some(d)) => {
                    match d {
                        ReviewDecision::Approved => s.approved += 1,
                        ReviewDecision::Rejected => s.rejected += 1,
                        ReviewDecision::NeedsRevision => s.needs_revision += 1,
                    }
                    if let Some(at) = r.reviewed_at {
                        review_secs.push((at - r.submitted_at).num_seconds().max(0));
                    }
                }
                _ => {}
            }
        }
        if !review_secs.is_empty() {
            let mean = review_secs.iter().sum::<i64>() as f64 / review_secs.len() as f64;
            s.average_review_hours = (mean / 3600.0).round() as u64;
        }
        s
    }

    /// Rejected records, oldest first.
    pub fn rejected(&self) -> Vec<SubmissionRecord> {
        let mut v: Vec<_> = self
            .records
            .values()
            .into_iter()
            .filter(|r| r.decision == Some(ReviewDecision::Rejected))
            .collect();
        v.sort_by_key(|r| r.seq);
        v
    }

    /// Every transition of every record, in time order.
    pub fn audit_log(&self) -> Vec<AuditEntry> {
        let mut entries: Vec<(u64, usize, AuditEntry)> = self
            .records
            .values()
            .into_iter()
            .flat_map(|r| {
                let id = r.id.clone();
                let seq = r.seq;
                r.history.into_iter().enumerate().map(move |(i, t)| {
                    (
                        seq,
                        i,
                        AuditEntry {
                            submission_id: id.clone(),
                            transition: t,
                        },
                    )
                })
            })
            .collect();
        entries.sort_by(|a, b| {
            (a.2.transition.at, a.0, a.1).cmp(&(b.2.transition.at, b.0, b.1))
        });
        entries.into_iter().map(|(_, _, e)| e).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::InMemoryPublisherRegistry;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    fn trusted(id: &str) -> Publisher {
        let mut p = Publisher::new(id, "Riverside Gazette");
        p.verified = true;
        p.reputation = 90.0;
        p.articles_published = 10;
        p
    }

    fn draft(publisher: &str, title: &str) -> DraftArticle {
        DraftArticle {
            title: title.into(),
            summary: "Short summary of the story.".into(),
            content: "Longer body of the story with enough words.".into(),
            publisher_id: publisher.into(),
            ..Default::default()
        }
    }

    fn pipeline(pubs: Vec<Publisher>) -> (SubmissionPipeline, Arc<InMemoryPublisherRegistry>) {
        let reg = Arc::new(InMemoryPublisherRegistry::with_publishers(pubs));
        (SubmissionPipeline::in_memory(reg.clone()), reg)
    }

    #[test]
    fn priority_rules() {
        let w = RiskWeights::default();
        let p = trusted("p1");
        let mut d = draft("p1", "Town fair opens");
        assert_eq!(compute_priority(&d, 0.0, Some(&p), &w), Priority::Low);
        assert_eq!(compute_priority(&d, 0.0, None, &w), Priority::Normal);
        assert_eq!(compute_priority(&d, 0.7, Some(&p), &w), Priority::High);
        d.category = Some("Breaking".into());
        assert_eq!(compute_priority(&d, 0.0, Some(&p), &w), Priority::High);
        let h = draft("p1", "Health officials issue advice");
        assert_eq!(compute_priority(&h, 0.0, Some(&p), &w), Priority::High);
        // substring inside a longer word doesn't count
        let h2 = draft("p1", "Healthy eating tips");
        assert_eq!(compute_priority(&h2, 0.0, Some(&p), &w), Priority::Low);
    }

    #[test]
    fn sequence_ids_are_monotonic() {
        let (p, _) = pipeline(vec![]);
        let a = p.submit_at(draft("x", "First story here"), t0()).unwrap();
        let b = p.submit_at(draft("x", "Different second item"), t0()).unwrap();
        assert_eq!(a.id, "sub-000001");
        assert_eq!(b.id, "sub-000002");
    }

    #[test]
    fn reviewing_auto_approved_record_is_not_queued() {
        let (p, _) = pipeline(vec![trusted("p1")]);
        let r = p.submit_at(draft("p1", "Council passes budget"), t0()).unwrap();
        assert_eq!(r.status, SubmissionStatus::AutoApproved);
        assert_eq!(r.estimated_review_time, "immediate");
        let err = p
            .review(&r.id, ReviewDecision::Approved, None, "mod-1")
            .unwrap_err();
        assert!(matches!(
            err,
            SubmissionError::NotQueued {
                status: SubmissionStatus::AutoApproved,
                ..
            }
        ));
    }

    #[test]
    fn unknown_id_is_not_found() {
        let (p, _) = pipeline(vec![]);
        assert!(matches!(
            p.review("sub-999999", ReviewDecision::Rejected, None, "mod-1"),
            Err(SubmissionError::NotFound(_))
        ));
        assert!(matches!(p.status("nope"), Err(SubmissionError::NotFound(_))));
    }

    #[test]
    fn blank_reviewer_is_rejected() {
        let (p, _) = pipeline(vec![]);
        let r = p.submit_at(draft("x", "Some story"), t0()).unwrap();
        assert!(matches!(
            p.review(&r.id, ReviewDecision::Approved, None, " "),
            Err(SubmissionError::Validation { .. })
        ));
        assert_eq!(p.get(&r.id).unwrap().status, SubmissionStatus::Queued);
    }

    #[test]
    fn queue_position_and_average_review_time() {
        let (p, _) = pipeline(vec![]);
        let a = p.submit_at(draft("x", "Alpha story"), t0()).unwrap();
        let b = p
            .submit_at(draft("x", "Bravo piece"), t0() + Duration::minutes(5))
            .unwrap();
        assert_eq!(p.status(&b.id).unwrap().queue_position, Some(2));

        p.review_at(
            &a.id,
            ReviewDecision::Rejected,
            Some("sources missing".into()),
            "mod-1",
            t0() + Duration::hours(3),
        )
        .unwrap();
        let sa = p.status(&a.id).unwrap();
        assert_eq!(sa.queue_position, None);
        assert_eq!(sa.decision, Some(ReviewDecision::Rejected));
        assert_eq!(sa.feedback.as_deref(), Some("sources missing"));
        assert_eq!(p.status(&b.id).unwrap().queue_position, Some(1));

        let s = p.stats();
        assert_eq!(s.pending, 1);
        assert_eq!(s.rejected, 1);
        assert_eq!(s.average_review_hours, 3);
        assert_eq!(p.rejected().len(), 1);
    }

    #[test]
    fn audit_log_is_time_ordered() {
        let (p, _) = pipeline(vec![]);
        let a = p.submit_at(draft("x", "Alpha story"), t0()).unwrap();
        p.submit_at(draft("x", "Bravo piece"), t0() + Duration::minutes(1))
            .unwrap();
        p.review_at(
            &a.id,
            ReviewDecision::NeedsRevision,
            None,
            "mod-1",
            t0() + Duration::minutes(2),
        )
        .unwrap();
        let log = p.audit_log();
        let steps: Vec<_> = log
            .iter()
            .map(|e| (e.submission_id.as_str(), e.transition.to))
            .collect();
        assert_eq!(
            steps,
            vec![
                ("sub-000001", SubmissionStatus::Queued),
                ("sub-000002", SubmissionStatus::Queued),
                ("sub-000001", SubmissionStatus::Reviewed),
            ]
        );
        assert_eq!(log[2].transition.actor, "mod-1");
    }
}

//! Publisher identities and reputation.
//!
//! The submission pipeline only sees the [`PublisherRegistry`] trait; the in-memory
//! registry here is what the binary and the tests wire in.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PublisherError;

pub const PERM_SUBMIT: &str = "submit_articles";
pub const PERM_PRIORITY_REVIEW: &str = "priority_review";
pub const PERM_AUTO_PUBLISH: &str = "auto_publish_low_risk";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReputationChange {
    pub delta: f32,
    pub reason: String,
    pub at: DateTime<Utc>,
    /// Reputation after the change (floored at 0).
    pub new_total: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publisher {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub organization: String,
    pub reputation: f32,
    pub verified: bool,
    pub articles_published: u32,
    pub permissions: Vec<String>,
    #[serde(default)]
    pub reputation_history: Vec<ReputationChange>,
    pub created_at: DateTime<Utc>,
}

impl Publisher {
    /// Fresh, unverified publisher with zero reputation.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: String::new(),
            organization: String::new(),
            reputation: 0.0,
            verified: false,
            articles_published: 0,
            permissions: vec![PERM_SUBMIT.to_string()],
            reputation_history: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn has_permission(&self, perm: &str) -> bool {
        self.permissions.iter().any(|p| p == perm)
    }
}

/// Registration request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPublisher {
    pub name: String,
    pub email: String,
    pub organization: String,
}

/// What the submission pipeline needs from the identity side.
pub trait PublisherRegistry: Send + Sync {
    fn get_publisher(&self, id: &str) -> Option<Publisher>;

    /// Apply `delta`, flooring at 0. Returns the new reputation, `None` for unknown ids.
    fn update_reputation(&self, id: &str, delta: f32, reason: &str) -> Option<f32>;

    /// Returns the new count, `None` for unknown ids.
    fn increment_article_count(&self, id: &str) -> Option<u32>;
}

#[derive(Debug, Default)]
pub struct InMemoryPublisherRegistry {
    inner: Mutex<HashMap<String, Publisher>>,
    seq: AtomicU64,
}

impl InMemoryPublisherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with ready-made publishers (fixtures, tests).
    pub fn with_publishers(publishers: impl IntoIterator<Item = Publisher>) -> Self {
        let reg = Self::new();
        {
            let mut map = reg.lock();
            for p in publishers {
                map.insert(p.id.clone(), p);
            }
        }
        reg
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Publisher>> {
        self.inner.lock().expect("publisher registry mutex poisoned")
    }

    pub fn register(&self, req: NewPublisher) -> Result<Publisher, PublisherError> {
        let mut missing = Vec::new();
        if req.name.trim().is_empty() {
            missing.push("name");
        }
        if req.email.trim().is_empty() {
            missing.push("email");
        }
        if req.organization.trim().is_empty() {
            missing.push("organization");
        }
        if !missing.is_empty() {
            return Err(PublisherError::Validation { missing });
        }

        let email = req.email.trim().to_ascii_lowercase();
        let mut map = self.lock();
        if map.values().any(|p| p.email == email) {
            return Err(PublisherError::DuplicateEmail(email));
        }
        let n = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let mut p = Publisher::new(format!("pub-{n:04}"), req.name.trim());
        p.email = email;
        p.organization = req.organization.trim().to_string();
        map.insert(p.id.clone(), p.clone());
        tracing::info!(target: "submission", publisher = %p.id, "publisher registered");
        Ok(p)
    }

    /// Mark verified and grant the verified-only permissions. Idempotent.
    pub fn verify(&self, id: &str) -> Result<Publisher, PublisherError> {
        let mut map = self.lock();
        let p = map
            .get_mut(id)
            .ok_or_else(|| PublisherError::NotFound(id.to_string()))?;
        p.verified = true;
        for perm in [PERM_PRIORITY_REVIEW, PERM_AUTO_PUBLISH] {
            if !p.has_permission(perm) {
                p.permissions.push(perm.to_string());
            }
        }
        Ok(p.clone())
    }

    pub fn history(&self, id: &str) -> Option<Vec<ReputationChange>> {
        self.lock().get(id).map(|p| p.reputation_history.clone())
    }

    pub fn all(&self) -> Vec<Publisher> {
        let mut v: Vec<_> = self.lock().values().cloned().collect();
        v.sort_by(|a, b| a.id.cmp(&b.id));
        v
    }
}

impl PublisherRegistry for InMemoryPublisherRegistry {
    fn get_publisher(&self, id: &str) -> Option<Publisher> {
        self.lock().get(id).cloned()
    }

    fn update_reputation(&self, id: &str, delta: f32, reason: &str) -> Option<f32> {
        let mut map = self.lock();
        let p = map.get_mut(id)?;
        p.reputation = (p.reputation + delta).max(0.0);
        p.reputation_history.push(ReputationChange {
            delta,
            reason: reason.to_string(),
            at: Utc::now(),
            new_total: p.reputation,
        });
        Some(p.reputation)
    }

    fn increment_article_count(&self, id: &str) -> Option<u32> {
        let mut map = self.lock();
        let p = map.get_mut(id)?;
        p.articles_published = p.articles_published.saturating_add(1);
        Some(p.articles_published)
    }
}

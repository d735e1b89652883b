//! Error taxonomy for the aggregation feed and the submission pipeline.

use thiserror::Error;

use crate::submission::SubmissionStatus;

/// Errors surfaced by [`crate::aggregator::Aggregator`].
#[derive(Debug, Error)]
pub enum NewsError {
    /// A single adapter failed. Absorbed inside the aggregator and only
    /// visible to callers as a reduced `source_count`.
    #[error("source unavailable: {source_name}: {message}")]
    SourceUnavailable {
        source_name: String,
        message: String,
    },

    /// Every adapter failed (or returned nothing) and no fallback content exists.
    #[error("news temporarily unavailable: all sources failed and no fallback is configured")]
    AggregationEmpty,
}

/// Errors surfaced synchronously by [`crate::submission::SubmissionPipeline`].
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// Required draft fields are missing or blank.
    #[error("validation failed: missing required field(s): {}", .missing.join(", "))]
    Validation { missing: Vec<&'static str> },

    #[error("submission {0} not found")]
    NotFound(String),

    /// The record already carries a terminal review decision.
    #[error("submission {0} has already been reviewed")]
    AlreadyReviewed(String),

    /// Only queued records can be reviewed.
    #[error("submission {id} is {status} and cannot be reviewed")]
    NotQueued { id: String, status: SubmissionStatus },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Publisher registry operations.
#[derive(Debug, Error)]
pub enum PublisherError {
    #[error("validation failed: missing required field(s): {}", .missing.join(", "))]
    Validation { missing: Vec<&'static str> },

    #[error("publisher with email {0} already exists")]
    DuplicateEmail(String),

    #[error("publisher {0} not found")]
    NotFound(String),
}

/// Failures of the keyed snapshot store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("store serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SubmissionResult<T> = Result<T, SubmissionError>;

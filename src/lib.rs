// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod aggregator;
pub mod api;
pub mod app;
pub mod article;
pub mod config;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod publisher;
pub mod similarity;
pub mod store;
pub mod submission;

// ---- Re-exports for stable public API ----
pub use crate::aggregator::{Aggregator, AggregatorConfig, FeedResult, FetchOptions};
pub use crate::api::create_router;
pub use crate::app::App;
pub use crate::article::{Article, Category};
pub use crate::config::AppConfig;
pub use crate::error::{NewsError, PublisherError, StoreError, SubmissionError};
pub use crate::submission::{DraftArticle, SubmissionPipeline};

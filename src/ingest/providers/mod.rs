// src/ingest/providers/mod.rs
pub mod guardian;
pub mod hacker_news;
pub mod newsapi;
pub mod publisher_pool;
pub mod rss_feed;

pub use guardian::GuardianAdapter;
pub use hacker_news::HackerNewsAdapter;
pub use newsapi::NewsApiAdapter;
pub use publisher_pool::PublisherPoolAdapter;
pub use rss_feed::{RssFeedAdapter, RssFeedConfig};

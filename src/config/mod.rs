// src/config/mod.rs
//! Application config.
//!
//! Lookup order:
//! 1) $NEWSDESK_CONFIG_PATH (must exist if set)
//! 2) config/newsdesk.toml
//! 3) config/newsdesk.json
//! 4) built-in defaults
//!
//! Every section and field is optional; missing values take their defaults.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::aggregator::AggregatorConfig;
use crate::ingest::providers::RssFeedConfig;
use crate::submission::RiskWeights;

pub const ENV_PATH: &str = "NEWSDESK_CONFIG_PATH";
pub const NEWSAPI_KEY_ENV: &str = "NEWSAPI_KEY";
pub const GUARDIAN_KEY_ENV: &str = "GUARDIAN_API_KEY";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub aggregator: AggregatorConfig,
    pub sources: SourcesConfig,
    pub risk: RiskWeights,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// `"ENV"` reads `NEWSAPI_KEY`. No key, no NewsAPI adapter.
    pub newsapi_key: Option<String>,
    /// `"ENV"` reads `GUARDIAN_API_KEY`. The public "test" key is the default.
    pub guardian_key: Option<String>,
    pub hacker_news: bool,
    pub rss: Vec<RssFeedConfig>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            newsapi_key: None,
            guardian_key: Some("test".to_string()),
            hacker_news: true,
            rss: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Snapshot directory; unset keeps everything in memory.
    pub data_dir: Option<PathBuf>,
}

impl StoreConfig {
    pub fn submissions_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|d| d.join("submissions.json"))
    }

    pub fn articles_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|d| d.join("articles.json"))
    }
}

impl AppConfig {
    /// Load from an explicit path; format by extension (TOML unless `.json`).
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg: AppConfig = if ext == "json" {
            serde_json::from_str(&content)
                .with_context(|| format!("parsing json config {}", path.display()))?
        } else {
            toml::from_str(&content)
                .with_context(|| format!("parsing toml config {}", path.display()))?
        };
        Ok(cfg.resolved())
    }

    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_PATH} points to non-existent path"));
        }
        let toml_p = PathBuf::from("config/newsdesk.toml");
        if toml_p.exists() {
            return Self::load_from(&toml_p);
        }
        let json_p = PathBuf::from("config/newsdesk.json");
        if json_p.exists() {
            return Self::load_from(&json_p);
        }
        Ok(Self::default().resolved())
    }

    /// Resolve `"ENV"` keys and pull out-of-range values back to something usable.
    fn resolved(mut self) -> Self {
        self.sources.newsapi_key = resolve_key(self.sources.newsapi_key.take(), NEWSAPI_KEY_ENV);
        self.sources.guardian_key =
            resolve_key(self.sources.guardian_key.take(), GUARDIAN_KEY_ENV);

        let a = &mut self.aggregator;
        a.max_page_size = a.max_page_size.max(1);
        a.default_page_size = a.default_page_size.clamp(1, a.max_page_size);
        if !(0.0..=1.0).contains(&a.dedup_similarity) {
            a.dedup_similarity = AggregatorConfig::default().dedup_similarity;
        }
        self
    }
}

fn resolve_key(v: Option<String>, env_var: &str) -> Option<String> {
    let v = v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())?;
    if !v.eq_ignore_ascii_case("env") {
        return Some(v);
    }
    match std::env::var(env_var) {
        Ok(k) if !k.trim().is_empty() => Some(k.trim().to_string()),
        _ => {
            tracing::warn!(var = env_var, "config asks for an env key that isn't set");
            None
        }
    }
}

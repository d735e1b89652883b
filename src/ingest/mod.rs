// src/ingest/mod.rs
pub mod dedup;
pub mod fallback;
pub mod filter;
pub mod normalize;
pub mod providers;
pub mod types;

use crate::ingest::types::{SourceAdapter, SourceAdapterResult, SourceQuery};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Duration;

/// Longest summary we keep; content is capped separately.
pub const SUMMARY_MAX_CHARS: usize = 1_500;
pub const CONTENT_MAX_CHARS: usize = 20_000;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("aggregator_fetch_total", "Feed requests served.");
        describe_counter!(
            "aggregator_source_errors_total",
            "Adapter fetch/parse errors and timeouts."
        );
        describe_counter!(
            "aggregator_dedup_total",
            "Articles removed as duplicates of an earlier one."
        );
        describe_counter!(
            "aggregator_fallback_total",
            "Feed requests answered from the fallback set."
        );
        describe_histogram!("aggregator_fetch_ms", "End-to-end fetch time in milliseconds.");
        describe_gauge!("aggregator_adapters", "Configured source adapters.");
        describe_histogram!(
            "aggregator_parse_ms",
            "Provider payload parse time in milliseconds."
        );
    });
}

/// Clean provider text: decode entities, strip tags, fold quotes and whitespace, cap length.
pub fn normalize_text(s: &str, max_chars: usize) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Length cap
    if out.chars().count() > max_chars {
        out = out.chars().take(max_chars).collect();
    }

    out
}

/// Query every adapter at once and wait for all of them; a slow adapter is cut off at
/// `timeout` and reported as failed. Results keep adapter order.
pub async fn collect_all(
    adapters: &[Arc<dyn SourceAdapter>],
    query: &SourceQuery,
    timeout: Duration,
) -> Vec<SourceAdapterResult> {
    let calls = adapters.iter().map(|a| {
        let adapter = Arc::clone(a);
        async move {
            match tokio::time::timeout(timeout, adapter.fetch_raw(query)).await {
                Ok(res) => res,
                Err(_) => {
                    tracing::warn!(
                        target: "aggregator",
                        provider = adapter.name(),
                        timeout_ms = timeout.as_millis() as u64,
                        "provider timed out"
                    );
                    metrics::counter!("aggregator_source_errors_total").increment(1);
                    SourceAdapterResult::failed(adapter.name(), "timed out")
                }
            }
        }
    });
    futures::future::join_all(calls).await
}

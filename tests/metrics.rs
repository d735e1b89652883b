// tests/metrics.rs
#![cfg(feature = "strict-metrics")]

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::json;
use tower::ServiceExt;

use newsdesk::metrics::Metrics;
use newsdesk::{create_router, App, AppConfig};

// Full in-process app plus /metrics, with no network sources.
fn build_app() -> Router {
    let mut cfg = AppConfig::default();
    cfg.sources.guardian_key = None;
    cfg.sources.hacker_news = false;
    let app = App::from_config(&cfg).expect("app from config");
    let metrics = Metrics::init(app.aggregator.adapter_names().len()).expect("metrics init");
    create_router(app).merge(metrics.router())
}

async fn scrape(app: &Router) -> String {
    let resp = app
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
async fn feed_and_submission_series_are_exposed() {
    let app = build_app();

    let r = app
        .clone()
        .oneshot(Request::get("/news").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(r.status(), StatusCode::OK);

    let draft = json!({
        "title": "Harbour wall repairs begin",
        "summary": "Work starts Monday.",
        "content": "Contractors begin repairs on Monday.",
        "publisherId": "pub-ghost"
    });
    let r = app
        .clone()
        .oneshot(
            Request::post("/submissions")
                .header("content-type", "application/json")
                .body(Body::from(draft.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(r.status(), StatusCode::CREATED);

    let text = scrape(&app).await;
    for needle in [
        "aggregator_fetch_total",
        "aggregator_fallback_total",
        "aggregator_fetch_ms",
        "aggregator_adapters",
        "submission_received_total",
        "submission_queued_total",
    ] {
        assert!(
            text.contains(needle),
            "metrics exposition missing '{needle}'\n{text}"
        );
    }
}

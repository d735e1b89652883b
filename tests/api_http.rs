// tests/api_http.rs
//
// HTTP-level tests for the public Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Live sources are switched off, so the feed is served from the publisher pool
// or, while that is empty, from the fallback set.

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use newsdesk::{create_router, App, AppConfig};

const BODY_LIMIT: usize = 1024 * 1024;

/// Build the same Router the binary uses, minus the network adapters.
fn test_router() -> Router {
    let mut cfg = AppConfig::default();
    cfg.sources.guardian_key = None;
    cfg.sources.hacker_news = false;
    let app = App::from_config(&cfg).expect("app from config");
    create_router(app)
}

async fn call(router: &Router, method: &str, uri: &str, body: Option<Json>) -> (StatusCode, Json) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("build request");

    let resp = router.clone().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let v = if bytes.is_empty() {
        Json::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Json::Null)
    };
    (status, v)
}

#[tokio::test]
async fn health_returns_ok() {
    let router = test_router();
    let resp = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn news_without_sources_is_degraded_but_served() {
    let router = test_router();
    let (status, v) = call(&router, "GET", "/news?category=sports&pageSize=1&page=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["degraded"], json!(true));
    assert_eq!(v["pageSize"], json!(1));
    assert_eq!(v["sourceCount"], json!(0));
    let arts = v["articles"].as_array().expect("articles array");
    assert_eq!(arts.len(), 1);
    assert_eq!(arts[0]["category"], json!("sports"));
}

#[tokio::test]
async fn filters_lists_categories_countries_domains() {
    let router = test_router();
    let (status, v) = call(&router, "GET", "/news/filters", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["categories"].as_array().map(Vec::len), Some(11));
    assert_eq!(v["countries"].as_array().map(Vec::len), Some(15));
    assert_eq!(v["countries"][0], json!({"code": "us", "name": "United States"}));
    assert!(v["domains"]
        .as_array()
        .is_some_and(|d| d.contains(&json!("cybersecurity"))));
}

#[tokio::test]
async fn publisher_registration_and_verification() {
    let router = test_router();
    let body = json!({"name": "Night Owl", "email": "Desk@NightOwl.test", "organization": "Owl Media"});

    let (status, v) = call(&router, "POST", "/publishers", Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(v["id"], json!("pub-0001"));
    assert_eq!(v["verified"], json!(false));
    assert_eq!(v["email"], json!("desk@nightowl.test"));

    let (status, v) = call(&router, "POST", "/publishers", Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(v["error"].as_str().is_some_and(|e| e.contains("already exists")));

    let (status, _) = call(
        &router,
        "POST",
        "/publishers",
        Some(json!({"name": " ", "email": "x@y.test", "organization": "Y"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, v) = call(&router, "POST", "/publishers/pub-0001/verify", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["verified"], json!(true));

    let (status, v) = call(&router, "GET", "/publishers/pub-0001", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(v["permissions"]
        .as_array()
        .is_some_and(|p| p.contains(&json!("auto_publish_low_risk"))));

    let (status, _) = call(&router, "POST", "/publishers/pub-9999/verify", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn submission_lifecycle_over_http() {
    let router = test_router();
    call(
        &router,
        "POST",
        "/publishers",
        Some(json!({"name": "Night Owl", "email": "desk@nightowl.test", "organization": "Owl"})),
    )
    .await;

    // missing content
    let (status, v) = call(
        &router,
        "POST",
        "/submissions",
        Some(json!({"title": "Harbour wall repairs begin", "summary": "Work starts Monday.", "publisherId": "pub-0001"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(v["error"].as_str().is_some_and(|e| e.contains("content")));

    let draft = json!({
        "title": "Harbour wall repairs begin",
        "summary": "Work starts Monday.",
        "content": "Contractors begin repairs to the harbour wall on Monday.",
        "publisherId": "pub-0001",
        "country": "gb"
    });
    let (status, receipt) = call(&router, "POST", "/submissions", Some(draft)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["status"], json!("queued"));
    assert_eq!(receipt["priority"], json!("normal"));
    let id = receipt["id"].as_str().unwrap().to_string();

    let (status, v) = call(&router, "GET", &format!("/submissions/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["queuePosition"], json!(1));

    let (status, _) = call(&router, "GET", "/submissions/sub-999999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&router, "GET", "/submissions/queue?priority=urgent", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, v) = call(&router, "GET", "/submissions/queue?priority=normal", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v.as_array().map(Vec::len), Some(1));
    let (_, v) = call(&router, "GET", "/submissions/queue?priority=high", None).await;
    assert_eq!(v.as_array().map(Vec::len), Some(0));

    let review = json!({"decision": "approved", "feedback": "Thanks", "reviewerId": "mod-1"});
    let uri = format!("/submissions/{id}/review");
    let (status, v) = call(&router, "POST", &uri, Some(review.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["success"], json!(true));

    let (status, _) = call(&router, "POST", &uri, Some(review)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, v) = call(
        &router,
        "POST",
        &uri,
        Some(json!({"decision": "approved", "reviewerId": "  "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{v}");

    let (_, stats) = call(&router, "GET", "/submissions/stats", None).await;
    assert_eq!(stats["approved"], json!(1));
    assert_eq!(stats["pending"], json!(0));

    let (_, audit) = call(&router, "GET", "/submissions/audit", None).await;
    let actors: Vec<&str> = audit
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["actor"].as_str())
        .collect();
    assert_eq!(actors, vec!["auto_system", "mod-1"]);

    // the approved article now feeds /news instead of the fallback set
    let (status, v) = call(&router, "GET", "/news?country=GB", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["degraded"], json!(false));
    assert_eq!(v["totalResults"], json!(1));
    assert_eq!(v["articles"][0]["title"], json!("Harbour wall repairs begin"));
    assert_eq!(v["articles"][0]["verified"], json!(true));
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::aggregator::{CountryInfo, FeedResult, FetchOptions};
use crate::app::App;
use crate::article::Category;
use crate::error::{NewsError, PublisherError, SubmissionError};
use crate::publisher::{NewPublisher, Publisher};
use crate::submission::pipeline::AuditEntry;
use crate::submission::{
    DraftArticle, Priority, ReviewDecision, ReviewOutcome, Stats, StatusView, SubmissionReceipt,
    SubmissionRecord,
};

#[derive(Clone)]
pub struct AppState {
    app: App,
}

pub fn create_router(app: App) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/news", get(news))
        .route("/news/filters", get(news_filters))
        .route("/submissions", post(submit))
        .route("/submissions/queue", get(queue))
        .route("/submissions/stats", get(stats))
        .route("/submissions/audit", get(audit))
        .route("/submissions/{id}", get(submission_status))
        .route("/submissions/{id}/review", post(review))
        .route("/publishers", post(register_publisher))
        .route("/publishers/{id}", get(get_publisher))
        .route("/publishers/{id}/verify", post(verify_publisher))
        .layer(CorsLayer::very_permissive())
        .with_state(AppState { app })
}

/// Error body: `{"error": "..."}` with a status per error kind.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

impl From<NewsError> for ApiError {
    fn from(e: NewsError) -> Self {
        let status = match e {
            NewsError::AggregationEmpty => StatusCode::SERVICE_UNAVAILABLE,
            NewsError::SourceUnavailable { .. } => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl From<SubmissionError> for ApiError {
    fn from(e: SubmissionError) -> Self {
        let status = match &e {
            SubmissionError::Validation { .. } => StatusCode::BAD_REQUEST,
            SubmissionError::NotFound(_) => StatusCode::NOT_FOUND,
            SubmissionError::AlreadyReviewed(_) | SubmissionError::NotQueued { .. } => {
                StatusCode::CONFLICT
            }
            SubmissionError::Store(err) => {
                tracing::error!(target: "store", error = %err, "store write failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl From<PublisherError> for ApiError {
    fn from(e: PublisherError) -> Self {
        let status = match &e {
            PublisherError::Validation { .. } => StatusCode::BAD_REQUEST,
            PublisherError::DuplicateEmail(_) => StatusCode::CONFLICT,
            PublisherError::NotFound(_) => StatusCode::NOT_FOUND,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

async fn news(
    State(state): State<AppState>,
    Query(opts): Query<FetchOptions>,
) -> Result<Json<FeedResult>, ApiError> {
    Ok(Json(state.app.aggregator.fetch(&opts).await?))
}

#[derive(Serialize)]
struct FiltersOut {
    categories: Vec<&'static str>,
    countries: &'static [CountryInfo],
    domains: &'static [&'static str],
}

async fn news_filters(State(state): State<AppState>) -> Json<FiltersOut> {
    let agg = &state.app.aggregator;
    Json(FiltersOut {
        categories: Category::ALL.iter().map(|c| c.as_str()).collect(),
        countries: agg.available_countries(),
        domains: agg.available_domains(),
    })
}

async fn submit(
    State(state): State<AppState>,
    Json(draft): Json<DraftArticle>,
) -> Result<(StatusCode, Json<SubmissionReceipt>), ApiError> {
    let receipt = state.app.pipeline.submit(draft)?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

#[derive(Deserialize)]
struct QueueParams {
    #[serde(default)]
    priority: Option<String>,
}

async fn queue(
    State(state): State<AppState>,
    Query(p): Query<QueueParams>,
) -> Result<Json<Vec<SubmissionRecord>>, ApiError> {
    let priority = match p.priority.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => None,
        Some(s) => Some(
            Priority::parse(s).ok_or_else(|| ApiError::bad_request(format!("unknown priority {s}")))?,
        ),
    };
    Ok(Json(state.app.pipeline.queue(priority)))
}

async fn stats(State(state): State<AppState>) -> Json<Stats> {
    Json(state.app.pipeline.stats())
}

async fn audit(State(state): State<AppState>) -> Json<Vec<AuditEntry>> {
    Json(state.app.pipeline.audit_log())
}

async fn submission_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatusView>, ApiError> {
    Ok(Json(state.app.pipeline.status(&id)?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewReq {
    decision: ReviewDecision,
    #[serde(default)]
    feedback: Option<String>,
    reviewer_id: String,
}

async fn review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ReviewReq>,
) -> Result<Json<ReviewOutcome>, ApiError> {
    let out = state
        .app
        .pipeline
        .review(&id, req.decision, req.feedback, &req.reviewer_id)?;
    Ok(Json(out))
}

async fn register_publisher(
    State(state): State<AppState>,
    Json(req): Json<NewPublisher>,
) -> Result<(StatusCode, Json<Publisher>), ApiError> {
    let p = state.app.publishers.register(req)?;
    Ok((StatusCode::CREATED, Json(p)))
}

async fn get_publisher(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Publisher>, ApiError> {
    use crate::publisher::PublisherRegistry;
    state
        .app
        .publishers
        .get_publisher(&id)
        .map(Json)
        .ok_or_else(|| PublisherError::NotFound(id).into())
}

async fn verify_publisher(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Publisher>, ApiError> {
    Ok(Json(state.app.publishers.verify(&id)?))
}

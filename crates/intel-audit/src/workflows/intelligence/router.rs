use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::error;

use crate::workflows::assessment::{AssessmentResponse, AssessmentSubmission};

use super::repository::{PatternStore, StorageError};
use super::service::IntelligenceService;

/// Router builder exposing scoring, submission, and market intelligence endpoints.
pub fn intelligence_router<S>(service: Arc<IntelligenceService<S>>) -> Router
where
    S: PatternStore + 'static,
{
    Router::new()
        .route("/api/v1/assessments", post(submit_handler::<S>))
        .route("/api/v1/assessments/score", post(score_handler::<S>))
        .route("/api/v1/intelligence/report", get(report_handler::<S>))
        .route("/api/v1/intelligence/patterns", get(patterns_handler::<S>))
        .with_state(service)
}

/// Body accepted by the scoring endpoint: either `{"responses": {...}}` or the bare
/// answer map.
#[derive(serde::Deserialize)]
#[serde(untagged)]
pub(crate) enum ScoreRequest {
    Wrapped { responses: AssessmentResponse },
    Bare(AssessmentResponse),
}

impl ScoreRequest {
    fn into_responses(self) -> AssessmentResponse {
        match self {
            Self::Wrapped { responses } | Self::Bare(responses) => responses,
        }
    }
}

pub(crate) async fn score_handler<S>(
    State(service): State<Arc<IntelligenceService<S>>>,
    Json(request): Json<ScoreRequest>,
) -> Response
where
    S: PatternStore + 'static,
{
    let outcome = service.analyze(&request.into_responses());
    (StatusCode::OK, Json(outcome)).into_response()
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<IntelligenceService<S>>>,
    Json(submission): Json<AssessmentSubmission>,
) -> Response
where
    S: PatternStore + 'static,
{
    match tokio::task::spawn_blocking(move || service.submit(submission)).await {
        Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Err(join_error) => internal_error(join_error),
    }
}

pub(crate) async fn report_handler<S>(
    State(service): State<Arc<IntelligenceService<S>>>,
) -> Response
where
    S: PatternStore + 'static,
{
    match tokio::task::spawn_blocking(move || service.generate_report()).await {
        Ok(Ok(report)) => (StatusCode::OK, Json(report)).into_response(),
        Ok(Err(err)) => storage_error(err),
        Err(join_error) => internal_error(join_error),
    }
}

pub(crate) async fn patterns_handler<S>(
    State(service): State<Arc<IntelligenceService<S>>>,
) -> Response
where
    S: PatternStore + 'static,
{
    match tokio::task::spawn_blocking(move || service.patterns()).await {
        Ok(Ok(patterns)) => (StatusCode::OK, Json(json!({ "patterns": patterns }))).into_response(),
        Ok(Err(err)) => storage_error(err),
        Err(join_error) => internal_error(join_error),
    }
}

fn storage_error(err: StorageError) -> Response {
    error!(error = %err, "intelligence store query failed");
    let payload = json!({
        "error": err.to_string(),
    });
    (StatusCode::SERVICE_UNAVAILABLE, Json(payload)).into_response()
}

fn internal_error(err: tokio::task::JoinError) -> Response {
    error!(error = %err, "blocking intelligence task failed");
    let payload = json!({
        "error": "internal error",
    });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}

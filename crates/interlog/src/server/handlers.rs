//! Request handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::warn;

use super::error::ApiError;
use super::wire::{
    DroppedResponse, HealthResponse, IngestRequest, IngestResponse, RecentParams, RecentResponse,
};
use super::AppState;
use crate::error::IngestError;
use crate::gateway::Submission;

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /api/interactions`
///
/// 201 with the new id, 202 when the consent re-check drops the event, 400
/// for validation failures, 503 when the store is unavailable.
pub async fn ingest(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<IngestRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body?;
    let submission = Submission {
        kind: request.kind,
        payload: request.payload,
        user_id: identity(&headers, &state.identity_header),
        preferences: request.preferences,
    };

    match state.gateway.submit(submission).await {
        Ok(id) => Ok((StatusCode::CREATED, Json(IngestResponse { id })).into_response()),
        Err(IngestError::ConsentDenied) => Ok((
            StatusCode::ACCEPTED,
            Json(DroppedResponse {
                accepted: false,
                reason: IngestError::ConsentDenied.code().to_string(),
            }),
        )
            .into_response()),
        Err(e) => Err(e.into()),
    }
}

/// `GET /api/admin/interactions?limit=N`
pub async fn recent_interactions(
    State(state): State<AppState>,
    params: Result<Query<RecentParams>, QueryRejection>,
) -> Result<Json<RecentResponse>, ApiError> {
    let Query(params) = params?;
    let events = state.query.recent(params.limit).await.map_err(|e| {
        warn!(error = %e, "Recent interactions query failed");
        ApiError::Unavailable
    })?;

    Ok(Json(RecentResponse {
        count: events.len(),
        events,
    }))
}

/// The caller's user id, taken from the configured identity header.
fn identity(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

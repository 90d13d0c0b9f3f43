//! Bearer-token guard for the admin endpoint.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::error::ApiError;
use super::AppState;

/// Middleware that admits only requests carrying the configured admin token.
///
/// With no token configured every request is refused with 403; a missing or
/// wrong token gets 401.
pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(expected) = state.admin_token.as_deref() else {
        return ApiError::Forbidden("admin access is not configured").into_response();
    };

    let Some(value) = req.headers().get(AUTHORIZATION) else {
        return ApiError::Unauthorized("missing Authorization header").into_response();
    };

    let Ok(value) = value.to_str() else {
        return ApiError::Unauthorized("invalid Authorization header encoding").into_response();
    };

    match value.strip_prefix("Bearer ") {
        Some(token) if token == expected => next.run(req).await,
        _ => {
            tracing::debug!("Rejected admin request with invalid token");
            ApiError::Unauthorized("invalid bearer token").into_response()
        }
    }
}

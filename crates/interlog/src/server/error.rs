//! API error type and JSON error responses.
//!
//! Every failure leaves the server as `{"error": code, "message": text}`.
//! Storage failures keep their detail in the logs; the response body only
//! ever says the service is unavailable.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::wire::ErrorBody;
use crate::error::IngestError;

/// Message returned for any storage failure.
pub const UNAVAILABLE_MESSAGE: &str = "telemetry is temporarily unavailable";

/// API error that maps to an HTTP status and JSON body.
#[derive(Debug)]
pub enum ApiError {
    /// A submission failed validation or storage.
    Ingest(IngestError),
    /// The request itself could not be read.
    Request {
        /// Status chosen by the extractor.
        status: StatusCode,
        /// Extractor message.
        message: String,
    },
    /// 401 - missing or wrong bearer token.
    Unauthorized(&'static str),
    /// 403 - the admin endpoint is disabled.
    Forbidden(&'static str),
    /// 503 - the store could not serve a read.
    Unavailable,
}

impl ApiError {
    /// HTTP status and machine-readable code.
    #[must_use]
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Ingest(IngestError::StoreUnavailable) | Self::Unavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
            }
            Self::Ingest(IngestError::ConsentDenied) => (StatusCode::ACCEPTED, "consent_denied"),
            Self::Ingest(e) => (StatusCode::BAD_REQUEST, e.code()),
            Self::Request { status, .. } => (*status, "bad_request"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
        }
    }

    fn message(self) -> String {
        match self {
            Self::Ingest(IngestError::StoreUnavailable) | Self::Unavailable => {
                UNAVAILABLE_MESSAGE.to_string()
            }
            Self::Ingest(e) => e.to_string(),
            Self::Request { message, .. } => message,
            Self::Unauthorized(msg) | Self::Forbidden(msg) => msg.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let body = ErrorBody {
            error: code.to_string(),
            message: self.message(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        Self::Ingest(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            StatusCode::UNSUPPORTED_MEDIA_TYPE => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::BAD_REQUEST,
        };
        Self::Request {
            status,
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Request {
            status: StatusCode::BAD_REQUEST,
            message: rejection.body_text(),
        }
    }
}

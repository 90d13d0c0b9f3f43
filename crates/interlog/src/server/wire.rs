//! JSON bodies exchanged over the ingestion and admin endpoints.
//!
//! Shared by the server handlers and [`crate::capture::HttpIngestClient`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::consent::Preferences;
use crate::event::{EventId, InteractionEvent};

/// Body of `POST /api/interactions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestRequest {
    /// Requested kind name. Absent is treated as an unknown kind.
    #[serde(default)]
    pub kind: String,
    /// Event body. Absent or `null` is a missing payload.
    #[serde(default)]
    pub payload: Option<Value>,
    /// Consent snapshot for the server-side re-check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
}

/// `201 Created` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Identifier of the stored event.
    pub id: EventId,
}

/// `202 Accepted` body for a submission dropped by the consent re-check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedResponse {
    /// Always `false`.
    pub accepted: bool,
    /// Why the event was not stored.
    pub reason: String,
}

/// Error body carried by every 4xx/5xx response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable code, e.g. `invalid_kind`.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// Query string of `GET /api/admin/interactions`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecentParams {
    /// Requested result count; clamped to 1000.
    pub limit: Option<usize>,
}

/// Body of `GET /api/admin/interactions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentResponse {
    /// Newest first.
    pub events: Vec<InteractionEvent>,
    /// Number of events returned.
    pub count: usize,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok` while the process is serving.
    pub status: String,
    /// Crate version.
    pub version: String,
}

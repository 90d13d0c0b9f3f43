//! Capture adapter.
//!
//! Application code records interactions through a [`CaptureAdapter`]. The
//! adapter consults the consent policy first and, when collection is denied,
//! never contacts the ingestion side at all. Sends are fire-and-forget: every
//! outcome comes back as an [`EmitOutcome`] value and nothing is propagated.
//!
//! Two sinks are provided: the in-process [`IngestionGateway`] and
//! [`HttpIngestClient`] for surfaces that talk to a remote server.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::consent::{self, Preferences};
use crate::error::{Error, IngestError, Result};
use crate::event::{EventId, Payload};
use crate::gateway::{IngestionGateway, Submission};
use crate::server::wire::{ErrorBody, IngestRequest, IngestResponse};
use crate::server::INGEST_PATH;

/// Default request timeout for [`HttpIngestClient`].
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(2);

/// Where a capture adapter delivers submissions.
#[async_trait]
pub trait IngestSink: Send + Sync + std::fmt::Debug {
    /// Deliver one submission.
    async fn ingest(&self, submission: Submission) -> std::result::Result<EventId, IngestError>;
}

#[async_trait]
impl IngestSink for IngestionGateway {
    async fn ingest(&self, submission: Submission) -> std::result::Result<EventId, IngestError> {
        self.submit(submission).await
    }
}

/// What happened to one emitted event.
#[derive(Debug, Clone, PartialEq)]
pub enum EmitOutcome {
    /// Consent was denied; nothing was sent.
    Suppressed,
    /// The event was stored under this id.
    Accepted(EventId),
    /// The sink rejected the event or could not be reached.
    Failed(IngestError),
}

impl EmitOutcome {
    /// Whether the event was stored.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// Consent-gated front end for recording interactions.
#[derive(Debug)]
pub struct CaptureAdapter<S> {
    sink: Arc<S>,
    user_id: Option<String>,
}

impl<S> Clone for CaptureAdapter<S> {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            user_id: self.user_id.clone(),
        }
    }
}

impl<S: IngestSink + 'static> CaptureAdapter<S> {
    /// Adapter delivering to `sink` with no resolved identity.
    #[must_use]
    pub fn new(sink: S) -> Self {
        Self {
            sink: Arc::new(sink),
            user_id: None,
        }
    }

    /// Attribute emitted events to `user_id`.
    #[must_use]
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// The sink this adapter delivers to.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Record one interaction under the caller's current `preferences`.
    ///
    /// Denied consent returns [`EmitOutcome::Suppressed`] without calling the
    /// sink. The preferences travel with the submission so the gateway can
    /// re-check them.
    pub async fn emit(
        &self,
        preferences: &Preferences,
        kind: &str,
        payload: Payload,
    ) -> EmitOutcome {
        if !consent::allowed(preferences) {
            debug!(kind, "Capture suppressed by consent");
            return EmitOutcome::Suppressed;
        }

        let submission = Submission {
            kind: kind.to_string(),
            payload: Some(Value::Object(payload)),
            user_id: self.user_id.clone(),
            preferences: Some(*preferences),
        };

        match self.sink.ingest(submission).await {
            Ok(id) => EmitOutcome::Accepted(id),
            Err(e) => {
                debug!(kind, stage = e.stage(), error = %e, "Capture not recorded");
                EmitOutcome::Failed(e)
            }
        }
    }

    /// Like [`CaptureAdapter::emit`], but returns immediately.
    ///
    /// The consent check happens before anything is spawned, so a denied
    /// capture costs no task. Must be called within a tokio runtime.
    pub fn emit_detached(
        &self,
        preferences: &Preferences,
        kind: impl Into<String>,
        payload: Payload,
    ) -> Option<JoinHandle<EmitOutcome>> {
        let kind = kind.into();
        if !consent::allowed(preferences) {
            debug!(kind = %kind, "Capture suppressed by consent");
            return None;
        }

        let adapter = self.clone();
        let preferences = *preferences;
        Some(tokio::spawn(async move {
            adapter.emit(&preferences, &kind, payload).await
        }))
    }
}

/// [`IngestSink`] that posts to a remote ingestion endpoint.
#[derive(Debug, Clone)]
pub struct HttpIngestClient {
    client: reqwest::Client,
    url: String,
    identity_header: String,
}

impl HttpIngestClient {
    /// Client for the server at `base_url`, sending the user id in
    /// `identity_header`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, identity_header: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, identity_header, DEFAULT_SEND_TIMEOUT)
    }

    /// Like [`HttpIngestClient::new`] with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_timeout(
        base_url: &str,
        identity_header: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("interlog/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            client,
            url: format!("{}{INGEST_PATH}", base_url.trim_end_matches('/')),
            identity_header: identity_header.into(),
        })
    }

    /// Full URL submissions are posted to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn rejection(kind: String, response: reqwest::Response) -> IngestError {
        let status = response.status();
        match status {
            StatusCode::ACCEPTED => IngestError::ConsentDenied,
            StatusCode::BAD_REQUEST => match response.json::<ErrorBody>().await {
                Ok(body) if body.error == "invalid_kind" => IngestError::InvalidKind(kind),
                Ok(body) if body.error == "missing_payload" => IngestError::MissingPayload,
                Ok(body) => {
                    warn!(code = %body.error, detail = %body.message, "Ingestion endpoint refused request");
                    IngestError::StoreUnavailable
                }
                Err(e) => {
                    warn!(error = %e, "Unreadable error body from ingestion endpoint");
                    IngestError::StoreUnavailable
                }
            },
            _ => {
                warn!(%status, "Ingestion endpoint unavailable");
                IngestError::StoreUnavailable
            }
        }
    }
}

#[async_trait]
impl IngestSink for HttpIngestClient {
    async fn ingest(&self, submission: Submission) -> std::result::Result<EventId, IngestError> {
        let Submission {
            kind,
            payload,
            user_id,
            preferences,
        } = submission;

        let mut request = self.client.post(&self.url).json(&IngestRequest {
            kind: kind.clone(),
            payload,
            preferences,
        });
        if let Some(user_id) = user_id {
            request = request.header(self.identity_header.as_str(), user_id);
        }

        let response = request.send().await.map_err(|e| {
            warn!(url = %self.url, error = %e, "Failed to reach ingestion endpoint");
            IngestError::StoreUnavailable
        })?;

        if response.status() != StatusCode::CREATED {
            return Err(Self::rejection(kind, response).await);
        }

        response
            .json::<IngestResponse>()
            .await
            .map(|body| body.id)
            .map_err(|e| {
                warn!(error = %e, "Unreadable response from ingestion endpoint");
                IngestError::StoreUnavailable
            })
    }
}

//! Ingestion gateway.
//!
//! The gateway is the only path into the event store. For every submission
//! it validates kind and payload, resolves the user id, optionally re-checks
//! consent, and appends. It holds no mutable state of its own, so one
//! instance can serve any number of concurrent callers.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::consent::{self, Preferences};
use crate::error::IngestError;
use crate::event::EventId;
use crate::storage::EventStore;
use crate::taxonomy::ValidEvent;

/// One candidate event as received from a capture surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// Requested kind name; validated against the taxonomy.
    pub kind: String,
    /// Event body; must be a JSON object.
    pub payload: Option<Value>,
    /// Identity resolved from the request context, if any.
    pub user_id: Option<String>,
    /// Consent snapshot the client sent along, if any.
    pub preferences: Option<Preferences>,
}

impl Submission {
    /// A submission with a payload and nothing else.
    #[must_use]
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload: Some(payload),
            user_id: None,
            preferences: None,
        }
    }

    /// Attach a resolved user id.
    #[must_use]
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Attach the client's consent snapshot.
    #[must_use]
    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = Some(preferences);
        self
    }
}

/// Validates submissions and hands them to the event store.
#[derive(Debug, Clone)]
pub struct IngestionGateway {
    store: Arc<dyn EventStore>,
    recheck_consent: bool,
}

impl IngestionGateway {
    /// Gateway over `store` with the consent re-check enabled.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            store,
            recheck_consent: true,
        }
    }

    /// Turn the server-side consent re-check on or off.
    #[must_use]
    pub fn with_consent_recheck(mut self, enabled: bool) -> Self {
        self.recheck_consent = enabled;
        self
    }

    /// Whether submissions carrying a denial are dropped here.
    #[must_use]
    pub fn rechecks_consent(&self) -> bool {
        self.recheck_consent
    }

    /// Process one submission.
    ///
    /// Exactly one append is attempted for a valid, permitted submission and
    /// none otherwise. Store failures are logged here and reported as the
    /// opaque [`IngestError::StoreUnavailable`]; there is no retry.
    ///
    /// # Errors
    ///
    /// Returns the [`IngestError`] for the first stage that rejected the
    /// submission.
    pub async fn submit(&self, submission: Submission) -> Result<EventId, IngestError> {
        let Submission {
            kind,
            payload,
            user_id,
            preferences,
        } = submission;

        let event = ValidEvent::from_candidate(&kind, payload, user_id.as_deref())
            .inspect_err(|e| debug!(kind = %kind, error = %e, "Rejected submission"))?;

        if self.recheck_consent && !consent::allowed_opt(preferences.as_ref()) {
            debug!(kind = %event.kind, "Dropped submission without consent");
            return Err(IngestError::ConsentDenied);
        }

        let kind = event.kind;
        match self.store.append(event).await {
            Ok(accepted) => {
                debug!(id = %accepted.id, %kind, user = %accepted.user_id, "Accepted interaction");
                Ok(accepted.id)
            }
            Err(e) => {
                warn!(%kind, error = %e, "Event store rejected append");
                Err(IngestError::StoreUnavailable)
            }
        }
    }
}

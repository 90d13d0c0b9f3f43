//! Core event types for interlog.
//!
//! This module defines the closed set of interaction kinds and the
//! [`InteractionEvent`] record the store persists.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Free-form event body. Keys are strings, values are arbitrary JSON.
///
/// The pipeline never looks inside it.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// The category of interaction an event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// Text or media produced for the user.
    ContentGeneration,
    /// A product feature was used.
    FeatureUsage,
    /// A search was issued.
    SearchQuery,
    /// A question was asked in the FAQ surface.
    FaqQuestion,
    /// Faith mode was toggled or used.
    FaithModeEvent,
    /// Metadata about an uploaded file.
    UploadMetadata,
}

impl EventKind {
    /// Every recognized kind, in declaration order.
    pub const ALL: [EventKind; 6] = [
        Self::ContentGeneration,
        Self::FeatureUsage,
        Self::SearchQuery,
        Self::FaqQuestion,
        Self::FaithModeEvent,
        Self::UploadMetadata,
    ];

    /// The wire name of this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContentGeneration => "CONTENT_GENERATION",
            Self::FeatureUsage => "FEATURE_USAGE",
            Self::SearchQuery => "SEARCH_QUERY",
            Self::FaqQuestion => "FAQ_QUESTION",
            Self::FaithModeEvent => "FAITH_MODE_EVENT",
            Self::UploadMetadata => "UPLOAD_METADATA",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Returned when a string does not name a known [`EventKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// Store-assigned identifier of an accepted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Mint a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// The underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for EventId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// An accepted interaction, as persisted and as returned to operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionEvent {
    /// Identifier assigned at acceptance.
    pub id: EventId,

    /// Originating actor, or [`ANONYMOUS_USER`](crate::taxonomy::ANONYMOUS_USER).
    pub user_id: String,

    /// What kind of interaction this was.
    pub kind: EventKind,

    /// Opaque event body.
    pub payload: Payload,

    /// When the store durably accepted the event.
    pub accepted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display() {
        assert_eq!(EventKind::FeatureUsage.to_string(), "FEATURE_USAGE");
        assert_eq!(EventKind::FaithModeEvent.to_string(), "FAITH_MODE_EVENT");
    }

    #[test]
    fn test_kind_parse_all() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_kind_parse_is_case_sensitive() {
        assert!("feature_usage".parse::<EventKind>().is_err());
        assert!("FeatureUsage".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_kind_parse_unknown() {
        let err = "BOGUS".parse::<EventKind>().unwrap_err();
        assert_eq!(err, UnknownKind("BOGUS".to_string()));
    }

    #[test]
    fn test_kind_serde_matches_display() {
        for kind in EventKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }

    #[test]
    fn test_event_ids_are_unique() {
        let a = EventId::generate();
        let b = EventId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_event_id_parse() {
        let id = EventId::generate();
        let parsed: EventId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<EventId>().is_err());
    }

    #[test]
    fn test_event_serializes_camel_case() {
        let mut payload = Payload::new();
        payload.insert("featureName".into(), "upload".into());
        let event = InteractionEvent {
            id: EventId::generate(),
            user_id: "u1".to_string(),
            kind: EventKind::FeatureUsage,
            payload,
            accepted_at: Utc::now(),
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["userId"], "u1");
        assert_eq!(value["kind"], "FEATURE_USAGE");
        assert_eq!(value["payload"]["featureName"], "upload");
        assert!(value.get("acceptedAt").is_some());
        assert!(value.get("id").is_some());
    }
}

//! Boundary validation for candidate events.
//!
//! [`validate`] turns an untrusted `(kind, payload)` pair into a
//! [`ValidEvent`]. Nothing reaches the store without passing through here.

use serde_json::Value;

use crate::error::IngestError;
use crate::event::{EventKind, Payload};

/// User id recorded when the caller's identity cannot be resolved.
pub const ANONYMOUS_USER: &str = "anonymous";

/// A candidate that passed validation and is ready to append.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidEvent {
    /// Resolved actor, never empty.
    pub user_id: String,
    /// Validated kind.
    pub kind: EventKind,
    /// Owned payload map.
    pub payload: Payload,
}

/// Validate a candidate event.
///
/// `payload` is taken by value so the accepted event owns it outright. A
/// payload that is absent, `null`, or anything other than a JSON object is
/// rejected as [`IngestError::MissingPayload`]; an empty object is fine.
/// The kind is checked first.
///
/// # Errors
///
/// Returns [`IngestError::InvalidKind`] or [`IngestError::MissingPayload`].
pub fn validate(kind: &str, payload: Option<Value>) -> Result<(EventKind, Payload), IngestError> {
    let kind = kind
        .parse::<EventKind>()
        .map_err(|unknown| IngestError::InvalidKind(unknown.0))?;
    match payload {
        Some(Value::Object(payload)) => Ok((kind, payload)),
        _ => Err(IngestError::MissingPayload),
    }
}

impl ValidEvent {
    /// Validate a candidate and attach the resolved identity.
    ///
    /// # Errors
    ///
    /// Same as [`validate`].
    pub fn from_candidate(
        kind: &str,
        payload: Option<Value>,
        user_id: Option<&str>,
    ) -> Result<Self, IngestError> {
        let (kind, payload) = validate(kind, payload)?;
        Ok(Self {
            user_id: resolve_user(user_id),
            kind,
            payload,
        })
    }
}

/// Substitute the anonymous sentinel for a missing or blank identity.
#[must_use]
pub fn resolve_user(user_id: Option<&str>) -> String {
    match user_id.map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => ANONYMOUS_USER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_candidate() {
        let event =
            ValidEvent::from_candidate("SEARCH_QUERY", Some(json!({"q": "psalms"})), Some("u1"))
                .unwrap();
        assert_eq!(event.kind, EventKind::SearchQuery);
        assert_eq!(event.user_id, "u1");
        assert_eq!(event.payload["q"], "psalms");
    }

    #[test]
    fn test_empty_payload_is_valid() {
        let event = ValidEvent::from_candidate("FAQ_QUESTION", Some(json!({})), None).unwrap();
        assert!(event.payload.is_empty());
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let err = ValidEvent::from_candidate("BOGUS", Some(json!({})), None).unwrap_err();
        assert_eq!(err, IngestError::InvalidKind("BOGUS".to_string()));
    }

    #[test]
    fn test_kind_checked_before_payload() {
        let err = ValidEvent::from_candidate("BOGUS", None, None).unwrap_err();
        assert!(matches!(err, IngestError::InvalidKind(_)));
    }

    #[test]
    fn test_missing_payload_rejected() {
        let err = ValidEvent::from_candidate("FEATURE_USAGE", None, None).unwrap_err();
        assert_eq!(err, IngestError::MissingPayload);

        let err = ValidEvent::from_candidate("FEATURE_USAGE", Some(Value::Null), None).unwrap_err();
        assert_eq!(err, IngestError::MissingPayload);
    }

    #[test]
    fn test_non_object_payload_rejected() {
        for payload in [json!([1, 2]), json!("text"), json!(3)] {
            let err =
                ValidEvent::from_candidate("UPLOAD_METADATA", Some(payload), None).unwrap_err();
            assert_eq!(err, IngestError::MissingPayload);
        }
    }

    #[test]
    fn test_missing_identity_becomes_anonymous() {
        let event = ValidEvent::from_candidate("FEATURE_USAGE", Some(json!({})), None).unwrap();
        assert_eq!(event.user_id, ANONYMOUS_USER);

        let event =
            ValidEvent::from_candidate("FEATURE_USAGE", Some(json!({})), Some("   ")).unwrap();
        assert_eq!(event.user_id, ANONYMOUS_USER);
    }

    #[test]
    fn test_validate_returns_owned_payload() {
        let (kind, payload) = validate("CONTENT_GENERATION", Some(json!({"model": "x"}))).unwrap();
        assert_eq!(kind, EventKind::ContentGeneration);
        assert_eq!(payload["model"], "x");

        assert_eq!(
            validate("X", Some(json!({}))),
            Err(IngestError::InvalidKind("X".into()))
        );
        assert_eq!(validate("FEATURE_USAGE", None), Err(IngestError::MissingPayload));
    }
}

//! Consent policy for telemetry collection.
//!
//! The policy is a pure function of an explicit [`Preferences`] snapshot.
//! Capture code consults it before sending; the gateway consults it again
//! when a submission carries preferences.
//!
//! # Example
//!
//! ```
//! use interlog::consent::{allowed, Preferences};
//!
//! assert!(allowed(&Preferences::default()));
//! assert!(!allowed(&Preferences::denying()));
//! ```

use serde::{Deserialize, Serialize};

/// A user's stored telemetry settings.
///
/// Every field is optional; an unset field means the user never chose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// "Allow anonymized data use" toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_anonymized_data_use: Option<bool>,
}

impl Preferences {
    /// Preferences with the toggle explicitly on.
    #[must_use]
    pub fn allowing() -> Self {
        Self {
            allow_anonymized_data_use: Some(true),
        }
    }

    /// Preferences with the toggle explicitly off.
    #[must_use]
    pub fn denying() -> Self {
        Self {
            allow_anonymized_data_use: Some(false),
        }
    }
}

/// Decide whether an event may be emitted.
///
/// Fails open: only an explicit `false` denies.
#[must_use]
pub fn allowed(preferences: &Preferences) -> bool {
    preferences.allow_anonymized_data_use.unwrap_or(true)
}

/// Same as [`allowed`], for call sites that may have no snapshot at all.
#[must_use]
pub fn allowed_opt(preferences: Option<&Preferences>) -> bool {
    preferences.map_or(true, allowed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_preference_allows() {
        assert!(allowed(&Preferences::default()));
    }

    #[test]
    fn test_explicit_preferences() {
        assert!(allowed(&Preferences::allowing()));
        assert!(!allowed(&Preferences::denying()));
    }

    #[test]
    fn test_missing_snapshot_allows() {
        assert!(allowed_opt(None));
        assert!(!allowed_opt(Some(&Preferences::denying())));
    }

    #[test]
    fn test_deserialize_camel_case() {
        let prefs: Preferences =
            serde_json::from_str(r#"{"allowAnonymizedDataUse": false}"#).unwrap();
        assert_eq!(prefs, Preferences::denying());
    }

    #[test]
    fn test_deserialize_ignores_unknown_settings() {
        let prefs: Preferences =
            serde_json::from_str(r#"{"theme": "dark", "faithMode": true}"#).unwrap();
        assert_eq!(prefs, Preferences::default());
        assert!(allowed(&prefs));
    }

    #[test]
    fn test_serialize_omits_unset() {
        let json = serde_json::to_string(&Preferences::default()).unwrap();
        assert_eq!(json, "{}");
    }
}

//! Error types for interlog.
//!
//! Two families live here. [`Error`] covers the infrastructure the pipeline
//! runs on (database, configuration, files, HTTP client). [`IngestError`] is
//! the typed outcome of a rejected submission; it is deliberately small and
//! opaque so callers can log it and move on.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for interlog operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// A stored row could not be decoded.
    #[error("corrupt row {seq}: {message}")]
    CorruptRow {
        /// Acceptance sequence of the offending row.
        seq: i64,
        /// Description of what could not be decoded.
        message: String,
    },

    /// The event store could not be reached within its deadline.
    #[error("event store unavailable during {operation}")]
    StoreUnavailable {
        /// The store operation that gave up.
        operation: &'static str,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Network Errors ===
    /// The ingestion endpoint could not be reached or answered badly.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for interlog operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a store-unavailable error for the named operation.
    #[must_use]
    pub fn store_unavailable(operation: &'static str) -> Self {
        Self::StoreUnavailable { operation }
    }

    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Check if this error means the store gave up waiting.
    #[must_use]
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }
}

/// Why a submission was not accepted.
///
/// Every variant is non-fatal. Capture code is expected to log it and carry
/// on; nothing here should ever reach an end user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// The submitted kind is not part of the taxonomy.
    #[error("unknown event kind: {0}")]
    InvalidKind(String),

    /// No payload map was supplied.
    #[error("event payload is missing")]
    MissingPayload,

    /// The submitter's preferences forbid collection.
    #[error("consent for anonymized data use was withheld")]
    ConsentDenied,

    /// The event store failed or timed out.
    #[error("telemetry is temporarily unavailable")]
    StoreUnavailable,
}

impl IngestError {
    /// Name of the pipeline stage that produced this rejection.
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            Self::InvalidKind(_) | Self::MissingPayload => "validation",
            Self::ConsentDenied => "consent",
            Self::StoreUnavailable => "storage",
        }
    }

    /// Machine-readable code used on the wire.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidKind(_) => "invalid_kind",
            Self::MissingPayload => "missing_payload",
            Self::ConsentDenied => "consent_denied",
            Self::StoreUnavailable => "unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::internal("something went wrong");
        assert_eq!(err.to_string(), "internal error: something went wrong");

        let err = Error::store_unavailable("append");
        assert_eq!(err.to_string(), "event store unavailable during append");
    }

    #[test]
    fn test_is_store_unavailable() {
        assert!(Error::store_unavailable("recent").is_store_unavailable());
        assert!(!Error::internal("x").is_store_unavailable());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::config_validation("busy_timeout_ms must be greater than 0");
        assert!(err.to_string().contains("busy_timeout_ms"));
    }

    #[test]
    fn test_corrupt_row_display() {
        let err = Error::CorruptRow {
            seq: 7,
            message: "bad kind".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains('7'));
        assert!(msg.contains("bad kind"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }

    #[test]
    fn test_ingest_error_stage() {
        assert_eq!(IngestError::InvalidKind("X".into()).stage(), "validation");
        assert_eq!(IngestError::MissingPayload.stage(), "validation");
        assert_eq!(IngestError::ConsentDenied.stage(), "consent");
        assert_eq!(IngestError::StoreUnavailable.stage(), "storage");
    }

    #[test]
    fn test_ingest_error_code() {
        assert_eq!(IngestError::InvalidKind("X".into()).code(), "invalid_kind");
        assert_eq!(IngestError::MissingPayload.code(), "missing_payload");
        assert_eq!(IngestError::StoreUnavailable.code(), "unavailable");
    }

    #[test]
    fn test_store_unavailable_message_is_opaque() {
        let msg = IngestError::StoreUnavailable.to_string();
        assert!(!msg.contains("sqlite"));
        assert!(!msg.contains("database"));
    }
}

//! Storage layer for interlog.
//!
//! [`Storage`] is the synchronous `SQLite` log: it assigns identifiers and
//! acceptance timestamps and appends rows. [`SqliteEventStore`] wraps it for
//! concurrent async callers behind the [`EventStore`] trait.

pub mod migrations;
pub mod schema;
mod store;

pub use store::{EventStore, SqliteEventStore};

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::event::{EventId, EventKind, InteractionEvent, Payload};
use crate::taxonomy::ValidEvent;

/// Upper bound on the number of events a single recency query returns.
pub const MAX_RECENT_LIMIT: usize = 1000;

const SELECT_EVENT_COLUMNS: &str = "SELECT seq, id, user_id, kind, payload, accepted_at FROM interactions";

/// Acceptance order, newest first. `seq` breaks `accepted_at` ties.
const NEWEST_FIRST: &str = "ORDER BY accepted_at DESC, seq DESC";

/// Acceptance order, oldest first.
const OLDEST_FIRST: &str = "ORDER BY accepted_at ASC, seq ASC";

/// Append-only interaction log.
///
/// Provides persistent storage using `SQLite` with support for:
/// - Appending validated events with store-assigned ids and timestamps
/// - Recency queries ordered by acceptance
/// - Summary statistics
///
/// There is no update or delete path.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
    /// Most recent `accepted_at` handed out; keeps timestamps non-decreasing.
    last_accepted: Option<DateTime<Utc>>,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// `busy_timeout` bounds how long a statement waits on a locked file.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.busy_timeout(busy_timeout)?;
        // WAL lets readers proceed during appends; FULL sync makes an
        // acknowledged append survive power loss.
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=FULL;")?;

        migrations::initialize_schema(&conn)?;

        let mut storage = Self {
            path,
            conn,
            last_accepted: None,
        };
        storage.last_accepted = storage.newest_accepted_at()?;

        info!("Database opened successfully at {}", storage.path.display());
        Ok(storage)
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
            last_accepted: None,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Durably append a validated event.
    ///
    /// Assigns the event id and an `accepted_at` no earlier than the newest
    /// stored row. The timestamp is chosen inside an immediate write
    /// transaction, so other connections to the same file cannot slip a row
    /// in between and acceptance order matches `accepted_at` order.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be encoded, the database stays
    /// locked past the busy timeout, or the insert fails. Nothing is
    /// persisted in that case.
    pub fn append(&mut self, event: ValidEvent) -> Result<InteractionEvent> {
        let id = EventId::generate();
        let payload_json = serde_json::to_string(&event.payload)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let newest: Option<String> = tx
            .query_row(
                &format!("SELECT accepted_at FROM interactions {NEWEST_FIRST} LIMIT 1"),
                [],
                |row| row.get(0),
            )
            .optional()?;
        let accepted_at = next_accepted_at(
            Utc::now(),
            [newest.as_deref().and_then(parse_timestamp), self.last_accepted],
        );

        tx.execute(
            r"
            INSERT INTO interactions (id, user_id, kind, payload, accepted_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![
                id.to_string(),
                event.user_id,
                event.kind.as_str(),
                payload_json,
                format_timestamp(accepted_at),
            ],
        )?;
        let seq = tx.last_insert_rowid();
        tx.commit()?;

        self.last_accepted = Some(accepted_at);
        debug!(%id, kind = %event.kind, seq, "Appended interaction");

        Ok(InteractionEvent {
            id,
            user_id: event.user_id,
            kind: event.kind,
            payload: event.payload,
            accepted_at,
        })
    }

    /// Get an event by its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or the row is corrupt.
    pub fn get(&self, id: &EventId) -> Result<Option<InteractionEvent>> {
        let sql = format!("{SELECT_EVENT_COLUMNS} WHERE id = ?1");
        let row = self
            .conn
            .query_row(&sql, [id.to_string()], StoredRow::from_row)
            .optional()?;
        row.map(StoredRow::into_event).transpose()
    }

    /// Get the most recently accepted events, newest first.
    ///
    /// `limit` is clamped to [`MAX_RECENT_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or a row is corrupt.
    pub fn recent(&self, limit: usize) -> Result<Vec<InteractionEvent>> {
        let limit = limit.min(MAX_RECENT_LIMIT);
        let sql = format!("{SELECT_EVENT_COLUMNS} {NEWEST_FIRST} LIMIT ?1");
        let mut stmt = self.conn.prepare(&sql)?;

        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map([limit_i64], StoredRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter().map(StoredRow::into_event).collect()
    }

    /// Count total events in storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM interactions", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let total_events = self.count()?;

        let oldest: Option<String> = self
            .conn
            .query_row(
                &format!("SELECT accepted_at FROM interactions {OLDEST_FIRST} LIMIT 1"),
                [],
                |row| row.get(0),
            )
            .optional()?;

        let mut stmt = self
            .conn
            .prepare("SELECT kind, COUNT(*) FROM interactions GROUP BY kind ORDER BY kind")?;
        let by_kind = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_events,
            oldest_event: oldest.and_then(|s| parse_timestamp(&s)),
            newest_event: self.newest_accepted_at()?,
            by_kind,
            db_size_bytes,
        })
    }

    fn newest_accepted_at(&self) -> Result<Option<DateTime<Utc>>> {
        let newest: Option<String> = self
            .conn
            .query_row(
                &format!("SELECT accepted_at FROM interactions {NEWEST_FIRST} LIMIT 1"),
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(newest.and_then(|s| parse_timestamp(&s)))
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StorageStats {
    /// Total number of events stored.
    pub total_events: i64,
    /// Acceptance time of the oldest event.
    pub oldest_event: Option<DateTime<Utc>>,
    /// Acceptance time of the newest event.
    pub newest_event: Option<DateTime<Utc>>,
    /// Event counts per stored kind name.
    pub by_kind: Vec<(String, i64)>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

/// Raw column values, decoded outside the rusqlite row callback so decode
/// failures surface as [`Error::CorruptRow`].
struct StoredRow {
    seq: i64,
    id: String,
    user_id: String,
    kind: String,
    payload: String,
    accepted_at: String,
}

impl StoredRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            seq: row.get(0)?,
            id: row.get(1)?,
            user_id: row.get(2)?,
            kind: row.get(3)?,
            payload: row.get(4)?,
            accepted_at: row.get(5)?,
        })
    }

    fn into_event(self) -> Result<InteractionEvent> {
        let seq = self.seq;
        let corrupt = |message: String| Error::CorruptRow { seq, message };

        let id = self
            .id
            .parse::<EventId>()
            .map_err(|e| corrupt(format!("invalid id {}: {e}", self.id)))?;
        let kind = self
            .kind
            .parse::<EventKind>()
            .map_err(|e| corrupt(format!("unknown kind {}", e.0)))?;
        let payload: Payload = serde_json::from_str(&self.payload)
            .map_err(|e| corrupt(format!("invalid payload: {e}")))?;
        let accepted_at = parse_timestamp(&self.accepted_at)
            .ok_or_else(|| corrupt(format!("invalid accepted_at {}", self.accepted_at)))?;

        Ok(InteractionEvent {
            id,
            user_id: self.user_id,
            kind,
            payload,
            accepted_at,
        })
    }
}

/// The acceptance timestamp for a row written at `now`: never earlier than
/// any of `floors`, truncated to the stored precision so the value handed back
/// equals what a later read returns.
fn next_accepted_at(now: DateTime<Utc>, floors: [Option<DateTime<Utc>>; 2]) -> DateTime<Utc> {
    floors
        .into_iter()
        .flatten()
        .fold(now.trunc_subsecs(6), |acc, floor| acc.max(floor))
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

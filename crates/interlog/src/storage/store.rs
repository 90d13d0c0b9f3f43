//! Async, concurrency-safe access to the interaction log.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::warn;

use super::{Storage, StorageStats};
use crate::error::{Error, Result};
use crate::event::InteractionEvent;
use crate::taxonomy::ValidEvent;

/// The durable, ordered event log the gateway and query surface share.
///
/// Implementations must make `append` atomic and must fail with
/// [`Error::StoreUnavailable`] (or another error) rather than wait without
/// bound.
#[async_trait]
pub trait EventStore: Send + Sync + std::fmt::Debug {
    /// Persist a validated event and return it as accepted.
    async fn append(&self, event: ValidEvent) -> Result<InteractionEvent>;

    /// The most recently accepted events, newest first, at most `limit`.
    async fn recent(&self, limit: usize) -> Result<Vec<InteractionEvent>>;
}

/// [`EventStore`] over a single `SQLite` connection.
///
/// The connection sits behind an async mutex. Waiting for it is bounded by
/// `lock_timeout`; once held, the blocking call runs to completion on the
/// blocking pool, bounded by the connection's busy timeout.
#[derive(Debug, Clone)]
pub struct SqliteEventStore {
    storage: Arc<Mutex<Storage>>,
    lock_timeout: Duration,
}

impl SqliteEventStore {
    /// Wrap an opened [`Storage`].
    #[must_use]
    pub fn new(storage: Storage, lock_timeout: Duration) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
            lock_timeout,
        }
    }

    /// Open the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(
        path: impl AsRef<Path>,
        busy_timeout: Duration,
        lock_timeout: Duration,
    ) -> Result<Self> {
        Ok(Self::new(Storage::open(path, busy_timeout)?, lock_timeout))
    }

    /// An in-memory store, for tests and demos.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory(lock_timeout: Duration) -> Result<Self> {
        Ok(Self::new(Storage::open_in_memory()?, lock_timeout))
    }

    /// Database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable or the query fails.
    pub async fn stats(&self) -> Result<StorageStats> {
        self.with_storage("stats", |storage| storage.stats()).await
    }

    async fn with_storage<T, F>(&self, operation: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Storage) -> Result<T> + Send + 'static,
    {
        let guard = tokio::time::timeout(self.lock_timeout, Arc::clone(&self.storage).lock_owned())
            .await
            .map_err(|_| {
                warn!(
                    operation,
                    timeout = ?self.lock_timeout,
                    "Event store busy, giving up"
                );
                Error::store_unavailable(operation)
            })?;

        tokio::task::spawn_blocking(move || {
            let mut storage = guard;
            f(&mut *storage)
        })
        .await
        .map_err(|e| Error::internal(format!("storage task for {operation} failed: {e}")))?
    }
}

#[async_trait]
impl EventStore for SqliteEventStore {
    async fn append(&self, event: ValidEvent) -> Result<InteractionEvent> {
        self.with_storage("append", move |storage| storage.append(event))
            .await
    }

    async fn recent(&self, limit: usize) -> Result<Vec<InteractionEvent>> {
        self.with_storage("recent", move |storage| storage.recent(limit))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventId, EventKind, Payload};
    use std::collections::HashSet;

    fn store() -> SqliteEventStore {
        SqliteEventStore::open_in_memory(Duration::from_secs(5)).unwrap()
    }

    fn event(n: usize) -> ValidEvent {
        let mut payload = Payload::new();
        payload.insert("n".into(), n.into());
        ValidEvent {
            user_id: format!("u{n}"),
            kind: EventKind::FeatureUsage,
            payload,
        }
    }

    #[tokio::test]
    async fn test_append_then_recent() {
        let store = store();
        let accepted = store.append(event(1)).await.unwrap();

        let recent = store.recent(1).await.unwrap();
        assert_eq!(recent, vec![accepted]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_are_totally_ordered() {
        let store = store();
        let mut handles = Vec::new();
        for n in 0..64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.append(event(n)).await }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            let accepted = handle.await.unwrap().unwrap();
            assert!(ids.insert(accepted.id));
        }

        let recent = store.recent(1000).await.unwrap();
        assert_eq!(recent.len(), 64);
        let listed: HashSet<EventId> = recent.iter().map(|e| e.id).collect();
        assert_eq!(listed, ids);
        for pair in recent.windows(2) {
            assert!(pair[0].accepted_at >= pair[1].accepted_at);
        }
    }

    #[tokio::test]
    async fn test_lock_timeout_reports_unavailable() {
        let store = SqliteEventStore::open_in_memory(Duration::from_millis(20)).unwrap();
        let _held = Arc::clone(&store.storage).lock_owned().await;

        let err = store.append(event(1)).await.unwrap_err();
        assert!(err.is_store_unavailable());

        let err = store.recent(10).await.unwrap_err();
        assert!(err.is_store_unavailable());
    }

    #[tokio::test]
    async fn test_timed_out_append_persists_nothing() {
        let store = SqliteEventStore::open_in_memory(Duration::from_millis(20)).unwrap();
        {
            let _held = Arc::clone(&store.storage).lock_owned().await;
            assert!(store.append(event(1)).await.is_err());
        }
        assert!(store.recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stats() {
        let store = store();
        store.append(event(1)).await.unwrap();
        store.append(event(2)).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_events, 2);
    }
}

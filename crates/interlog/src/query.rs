//! Operator query surface.
//!
//! Read-only view over the event store. No consent filtering happens here:
//! everything stored was already admitted by the gateway.

use std::sync::Arc;

use crate::error::Result;
use crate::event::InteractionEvent;
use crate::storage::{EventStore, MAX_RECENT_LIMIT};

/// Recency queries for operator tooling.
#[derive(Debug, Clone)]
pub struct QuerySurface {
    store: Arc<dyn EventStore>,
    default_limit: usize,
}

impl QuerySurface {
    /// Query surface over `store`, defaulting to the maximum result count.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            store,
            default_limit: MAX_RECENT_LIMIT,
        }
    }

    /// Use `limit` when a caller gives none. Clamped to the maximum.
    #[must_use]
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit.min(MAX_RECENT_LIMIT);
        self
    }

    /// The number of events a query for `requested` will ask the store for.
    #[must_use]
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_limit).min(MAX_RECENT_LIMIT)
    }

    /// The most recently accepted events, newest first.
    ///
    /// Returns an empty list when nothing has been recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable.
    pub async fn recent(&self, limit: Option<usize>) -> Result<Vec<InteractionEvent>> {
        let limit = self.effective_limit(limit);
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.store.recent(limit).await
    }
}

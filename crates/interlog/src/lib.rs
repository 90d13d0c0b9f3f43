//! `interlog` - Consent-gated interaction telemetry
//!
//! This library provides the pipeline that records user interactions:
//! consent policy, event taxonomy, capture adapter, ingestion gateway,
//! append-only event store, and the operator query surface, plus the HTTP
//! server that exposes ingestion and admin queries.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod capture;
pub mod cli;
pub mod config;
pub mod consent;
pub mod error;
pub mod event;
pub mod gateway;
pub mod logging;
pub mod query;
pub mod server;
pub mod storage;
pub mod taxonomy;

pub use capture::{CaptureAdapter, EmitOutcome, HttpIngestClient, IngestSink};
pub use config::Config;
pub use error::{Error, IngestError, Result};
pub use event::{EventId, EventKind, InteractionEvent, Payload};
pub use gateway::{IngestionGateway, Submission};
pub use logging::init_logging;
pub use query::QuerySurface;
pub use storage::{EventStore, SqliteEventStore, Storage, StorageStats};

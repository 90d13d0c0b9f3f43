//! HTTP surface for the ingestion gateway and query surface.
//!
//! Routes:
//! - `GET /health`
//! - `POST /api/interactions` (ingestion, identity from a request header)
//! - `GET /api/admin/interactions?limit=N` (bearer token)

mod auth;
pub mod error;
mod handlers;
pub mod wire;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderName;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::gateway::IngestionGateway;
use crate::query::QuerySurface;
use crate::storage::{EventStore, SqliteEventStore};

/// Ingestion endpoint path.
pub const INGEST_PATH: &str = "/api/interactions";

/// Admin query endpoint path.
pub const ADMIN_RECENT_PATH: &str = "/api/admin/interactions";

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    gateway: IngestionGateway,
    query: QuerySurface,
    identity_header: HeaderName,
    admin_token: Option<Arc<str>>,
    max_body_bytes: usize,
}

impl AppState {
    /// Wire the pipeline over `store` using the server settings in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured identity header is not a valid
    /// header name.
    pub fn from_config(config: &Config, store: Arc<dyn EventStore>) -> Result<Self> {
        let identity_header = HeaderName::try_from(config.server.identity_header.as_str())
            .map_err(|_| {
                Error::config_validation(format!(
                    "identity_header is not a valid header name: {}",
                    config.server.identity_header
                ))
            })?;

        Ok(Self {
            gateway: IngestionGateway::new(store.clone())
                .with_consent_recheck(config.ingest.recheck_consent),
            query: QuerySurface::new(store).with_default_limit(config.query.default_limit),
            identity_header,
            admin_token: config.server.admin_token.as_deref().map(Arc::from),
            max_body_bytes: config.server.max_body_bytes,
        })
    }

    /// The ingestion gateway behind `POST /api/interactions`.
    #[must_use]
    pub fn gateway(&self) -> &IngestionGateway {
        &self.gateway
    }

    /// The query surface behind the admin endpoint.
    #[must_use]
    pub fn query(&self) -> &QuerySurface {
        &self.query
    }
}

/// Build the router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route(ADMIN_RECENT_PATH, get(handlers::recent_interactions))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .route(INGEST_PATH, post(handlers::ingest))
        .merge(admin_routes)
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Open the configured store and serve until Ctrl-C.
///
/// `bind` overrides the configured listen address.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the listener fails.
pub async fn serve(config: &Config, bind: Option<SocketAddr>) -> Result<()> {
    let database_path = config.database_path();
    let store = SqliteEventStore::open(
        &database_path,
        config.busy_timeout(),
        config.lock_timeout(),
    )?;
    let state = AppState::from_config(config, Arc::new(store))?;

    if state.admin_token.is_none() {
        warn!("No admin token configured; the admin endpoint will refuse all requests");
    }

    let addr = match bind {
        Some(addr) => addr,
        None => config.bind_address()?,
    };
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, database = %database_path.display(), "interlog listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("interlog stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

//! quake-api library - bulletin query service
//!
//! Read-only HTTP API over the bulletin log: filtered earthquake and tsunami
//! searches, single-record lookups, a generic history listing and the
//! human-readable timeline that fuses evaluation bulletins with crowd report
//! clusters.

use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod cluster;
pub mod error;
pub mod filter;
pub mod pagination;
pub mod sanitize;
pub mod service;
pub mod store;
pub mod timeline;

use service::StoreGuard;
use store::EventStore;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Document store, bounded by the query timeout
    pub store: StoreGuard,
}

impl AppState {
    /// Create new application state
    pub fn new(store: Arc<dyn EventStore>, query_timeout: Duration) -> Self {
        Self {
            store: StoreGuard::new(store, query_timeout),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let jma = Router::new()
        .route("/v2/jma/quake", get(api::search_quake))
        .route("/v2/jma/quake/:id", get(api::get_quake))
        .route("/v2/jma/tsunami", get(api::search_tsunami))
        .route("/v2/jma/tsunami/:id", get(api::get_tsunami));

    let history = Router::new()
        .route("/v2/history", get(api::search_history))
        .route("/v2/history/count", get(api::count_history))
        .route("/v1/human-readable", get(api::human_readable));

    Router::new()
        .merge(jma)
        .merge(history)
        .merge(api::health_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

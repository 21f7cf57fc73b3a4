//! Liveness endpoint.
//!
//! Reports that the bridge process is up along with the state of its schema
//! store. It does not contact the upstream; the per-instance upstream check is
//! `POST /api/v1/plugin/health`.

use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

/// Liveness response.
#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    /// Always "healthy" if reachable.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Schema store state per signal kind.
    pub schemas: SchemaStoreState,
}

/// Per-kind schema store state.
#[derive(Debug, Serialize)]
pub struct SchemaStoreState {
    /// Log field store.
    pub logs: KindState,
    /// Metric descriptor store.
    pub metrics: KindState,
    /// Trace service store.
    pub traces: KindState,
}

/// Cache freshness and override count for one kind.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct KindState {
    /// Whether the cached upstream document is still within its TTL.
    pub cached: bool,
    /// Number of user-saved entries.
    pub overrides: usize,
}

/// Creates the liveness routes.
pub fn health_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(liveness))
        .with_state(state)
}

async fn liveness(State(state): State<AppState>) -> Json<LivenessResponse> {
    let datasource = state.datasource();
    let cache = datasource.cache();
    let overrides = datasource.overrides();

    Json(LivenessResponse {
        status: "healthy",
        service: "mirador-connector",
        version: env!("CARGO_PKG_VERSION"),
        schemas: SchemaStoreState {
            logs: KindState {
                cached: cache.logs.is_fresh(),
                overrides: overrides.logs.len(),
            },
            metrics: KindState {
                cached: cache.metrics.is_fresh(),
                overrides: overrides.metrics.len(),
            },
            traces: KindState {
                cached: cache.traces.is_fresh(),
                overrides: overrides.traces.len(),
            },
        },
    })
}

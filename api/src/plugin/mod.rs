//! Datasource core: the three verbs the dashboard host calls.
//!
//! - [`Datasource::call_resource`] serves the schema resource plane
//! - [`Datasource::query_data`] runs a batch of data queries
//! - [`Datasource::check_health`] probes the upstream
//!
//! Settings and the upstream client are built per call from the instance
//! settings carried by the request. The schema cache and override store are
//! owned by the [`Datasource`] and shared by every call made through it.

mod health;
mod query;
mod resources;

pub use health::{CheckHealthResult, HealthStatus};
pub use query::{
    DataQuery, DataResponse, QueryDataRequest, QueryDataResponse, QueryModel, QueryStatus,
    TimeRange,
};
pub use resources::{ResourceError, ResourceRequest, ResourceResponse};

use shared::schema::{SchemaCache, SchemaOverrides};
use std::sync::Arc;

/// The connector backend.
///
/// Cloning is cheap; clones share the same schema cache and override store.
#[derive(Debug, Clone, Default)]
pub struct Datasource {
    cache: Arc<SchemaCache>,
    overrides: Arc<SchemaOverrides>,
}

impl Datasource {
    /// Creates a datasource with an empty cache and no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a datasource around existing schema state.
    #[must_use]
    pub fn with_stores(cache: Arc<SchemaCache>, overrides: Arc<SchemaOverrides>) -> Self {
        Self { cache, overrides }
    }

    /// Returns the schema cache.
    #[must_use]
    pub fn cache(&self) -> &SchemaCache {
        &self.cache
    }

    /// Returns the override store.
    #[must_use]
    pub fn overrides(&self) -> &SchemaOverrides {
        &self.overrides
    }

    /// Drops every cached document and every override.
    pub fn reset(&self) {
        self.cache.reset();
        self.overrides.reset();
    }
}

//! Application state module.
//!
//! Defines the shared application state that is passed to route handlers.

use crate::plugin::Datasource;

/// Application state shared across all request handlers.
///
/// Every handler talks to the same [`Datasource`], so the schema cache and the
/// override store are shared by all requests served by the process.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    datasource: Datasource,
}

impl AppState {
    /// Creates a new application state around a datasource.
    #[must_use]
    pub fn new(datasource: Datasource) -> Self {
        Self { datasource }
    }

    /// Returns the datasource.
    #[must_use]
    pub fn datasource(&self) -> &Datasource {
        &self.datasource
    }
}

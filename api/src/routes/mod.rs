//! API route definitions.
//!
//! This module organizes all HTTP routes of the connector bridge.

mod health;
mod plugin;

pub use health::health_routes;
pub use plugin::plugin_routes;

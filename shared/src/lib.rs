//! Mirador Connector Shared Library
//!
//! This crate contains the instance settings, the Mirador Core HTTP client,
//! the wire models, the frame projector and the schema cache and override
//! store used by the connector backend and the CLI.
//!
//! # Modules
//!
//! - [`config`] - Instance settings decoded from the host
//! - [`client`] - JSON-over-HTTP client for Mirador Core
//! - [`models`] - Query payloads, responses and schema documents
//! - [`frame`] - Columnar frames and the response projectors
//! - [`schema`] - Schema cache and user overrides
//!
//! # Example
//!
//! ```
//! use shared::models::SchemaField;
//! use shared::schema::Registry;
//!
//! let overrides = Registry::new();
//! overrides.upsert(SchemaField::new("service", "keyword").with_description("Owning service"));
//!
//! assert!(overrides.lookup("service").is_some());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod client;
pub mod config;
pub mod frame;
pub mod models;
pub mod schema;

/// Re-export common dependencies for convenience.
pub use chrono;
pub use serde;
pub use serde_json;
pub use tokio_util;
pub use validator;

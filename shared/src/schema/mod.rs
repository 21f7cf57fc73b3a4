//! Schema resource plane state: the read-through cache and the override store.

pub mod cache;
pub mod overrides;

pub use cache::{CacheSlot, SchemaCache, SCHEMA_TTL};
pub use overrides::{Registry, SchemaDocument, SchemaEntry, SchemaOverrides};

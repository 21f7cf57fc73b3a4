//! User-authored schema entries that overlay the upstream documents.
//!
//! Overrides live for the lifetime of the process. An override replaces the
//! upstream entry of the same name as a whole; there is no field-level merge
//! and no delete.

use crate::models::{
    LogsSchema, MetricDescriptor, MetricsSchema, SchemaField, SchemaKind, SchemaValidationError,
    TraceServiceSchema, TracesSchema,
};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// An entry of a schema document, keyed by name.
pub trait SchemaEntry: Clone {
    /// Kind of document the entry belongs to.
    const KIND: SchemaKind;

    /// Name the entry is keyed by.
    fn name(&self) -> &str;

    /// Checks the fields an override must carry.
    ///
    /// # Errors
    ///
    /// Returns the validation failure of the entry.
    fn validate_override(&self) -> Result<(), SchemaValidationError>;
}

impl SchemaEntry for SchemaField {
    const KIND: SchemaKind = SchemaKind::Logs;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate_override(&self) -> Result<(), SchemaValidationError> {
        self.validate_entry()
    }
}

impl SchemaEntry for MetricDescriptor {
    const KIND: SchemaKind = SchemaKind::Metrics;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate_override(&self) -> Result<(), SchemaValidationError> {
        self.validate_entry()
    }
}

impl SchemaEntry for TraceServiceSchema {
    const KIND: SchemaKind = SchemaKind::Traces;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate_override(&self) -> Result<(), SchemaValidationError> {
        self.validate_entry()
    }
}

/// A schema document made of named entries.
pub trait SchemaDocument {
    /// Entry type of the document.
    type Entry: SchemaEntry;

    /// Mutable access to the entries, in upstream order.
    fn entries_mut(&mut self) -> &mut Vec<Self::Entry>;
}

impl SchemaDocument for LogsSchema {
    type Entry = SchemaField;

    fn entries_mut(&mut self) -> &mut Vec<SchemaField> {
        &mut self.fields
    }
}

impl SchemaDocument for MetricsSchema {
    type Entry = MetricDescriptor;

    fn entries_mut(&mut self) -> &mut Vec<MetricDescriptor> {
        &mut self.metrics
    }
}

impl SchemaDocument for TracesSchema {
    type Entry = TraceServiceSchema;

    fn entries_mut(&mut self) -> &mut Vec<TraceServiceSchema> {
        &mut self.services
    }
}

/// A name-keyed registry of overrides for one kind.
#[derive(Debug)]
pub struct Registry<E> {
    entries: RwLock<HashMap<String, E>>,
}

impl<E> Default for Registry<E> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<E: SchemaEntry> Registry<E> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the override named `entry.name()`.
    pub fn upsert(&self, entry: E) {
        let name = entry.name().to_string();
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, entry);
    }

    /// Returns the override named `name`, if any.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<E> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Number of overrides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if there are no overrides.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every override.
    pub fn reset(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Merges the overrides into an upstream document.
    ///
    /// Upstream entries keep their position; the first entry with a given name
    /// is replaced by the override of that name. Overrides that matched nothing
    /// are appended in name order.
    #[must_use]
    pub fn apply<D>(&self, mut document: D) -> D
    where
        D: SchemaDocument<Entry = E>,
    {
        let mut remaining = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if remaining.is_empty() {
            return document;
        }

        let entries = document.entries_mut();
        for entry in entries.iter_mut() {
            if let Some(replacement) = remaining.remove(entry.name()) {
                *entry = replacement;
            }
        }

        let mut extra: Vec<(String, E)> = remaining.into_iter().collect();
        extra.sort_by(|(a, _), (b, _)| a.cmp(b));
        entries.extend(extra.into_iter().map(|(_, entry)| entry));

        document
    }
}

/// The three override registries.
#[derive(Debug, Default)]
pub struct SchemaOverrides {
    /// Log field overrides.
    pub logs: Registry<SchemaField>,
    /// Metric overrides.
    pub metrics: Registry<MetricDescriptor>,
    /// Trace service overrides.
    pub traces: Registry<TraceServiceSchema>,
}

impl SchemaOverrides {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every override of every kind.
    pub fn reset(&self) {
        self.logs.reset();
        self.metrics.reset();
        self.traces.reset();
    }
}

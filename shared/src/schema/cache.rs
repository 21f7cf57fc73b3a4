//! Time-boxed memoization of the upstream schema documents.
//!
//! Each [`CacheSlot`] holds at most one value together with its expiry. A read
//! takes the lock only long enough to copy the snapshot out, so a slow upstream
//! fetch never blocks other readers. Concurrent misses may fetch in parallel;
//! the last completion wins.

use crate::models::{LogsSchema, MetricsSchema, SchemaKind, TracesSchema};
use std::future::Future;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use tokio::time::Instant;

/// How long a cached schema document stays fresh.
pub const SCHEMA_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    expires_at: Instant,
}

/// A single cached value with a TTL.
///
/// States are empty, fresh and stale. A successful [`get`](Self::get) on an
/// empty or stale slot makes it fresh; [`invalidate`](Self::invalidate) empties
/// it; a failed fetch leaves it untouched.
#[derive(Debug)]
pub struct CacheSlot<T> {
    ttl: Duration,
    entry: RwLock<Option<CacheEntry<T>>>,
}

impl<T> Default for CacheSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CacheSlot<T> {
    /// Creates an empty slot with the schema TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(SCHEMA_TTL)
    }

    /// Creates an empty slot with a custom TTL.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: RwLock::new(None),
        }
    }

    /// Returns the TTL of the slot.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Drops the cached value, if any.
    pub fn invalidate(&self) {
        *self.entry.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Returns true if the slot holds a value that has not expired.
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.entry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|entry| Instant::now() < entry.expires_at)
    }
}

impl<T: Clone> CacheSlot<T> {
    /// Returns the cached value if fresh, otherwise runs `fetch` and caches its result.
    ///
    /// # Errors
    ///
    /// Returns the error of `fetch` unchanged. The slot is only written when
    /// `fetch` succeeds, so failed or dropped fetches leave the previous state.
    pub async fn get<F, Fut, E>(&self, fetch: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.fresh_value() {
            return Ok(value);
        }

        let value = fetch().await?;

        let entry = CacheEntry {
            value: value.clone(),
            expires_at: Instant::now() + self.ttl,
        };
        *self.entry.write().unwrap_or_else(PoisonError::into_inner) = Some(entry);

        Ok(value)
    }

    fn fresh_value(&self) -> Option<T> {
        let guard = self.entry.read().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.value.clone())
    }
}

/// The three schema slots, one per kind.
#[derive(Debug, Default)]
pub struct SchemaCache {
    /// Log field document.
    pub logs: CacheSlot<LogsSchema>,
    /// Metric descriptor document.
    pub metrics: CacheSlot<MetricsSchema>,
    /// Trace service document.
    pub traces: CacheSlot<TracesSchema>,
}

impl SchemaCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidates the slot of `kind`.
    pub fn invalidate(&self, kind: SchemaKind) {
        match kind {
            SchemaKind::Logs => self.logs.invalidate(),
            SchemaKind::Metrics => self.metrics.invalidate(),
            SchemaKind::Traces => self.traces.invalidate(),
        }
    }

    /// Empties every slot.
    pub fn reset(&self) {
        self.logs.invalidate();
        self.metrics.invalidate();
        self.traces.invalidate();
    }
}

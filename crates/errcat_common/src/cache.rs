//! Cache Manager
//!
//! Holds a fully parsed snapshot of the catalog and decides when it is stale.
//!
//! States:
//! - Empty: nothing parsed yet, or explicitly invalidated
//! - Cached: a snapshot is held; it is re-parsed on access when its TTL has
//!   elapsed or the source was modified since it was last read
//!
//! Readers clone the current `Arc<CatalogSnapshot>` under a short read lock.
//! Refreshes are serialized by a separate mutex, parse outside every lock and
//! publish the new snapshot with one write-locked swap. A snapshot carries its
//! own timestamps, so records and cache metadata are always replaced together.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, SystemTime};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::CatalogError;
use crate::parser::parse_catalog;
use crate::record::ErrorRecord;
use crate::source::CatalogSource;

/// Default time-to-live of a snapshot
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

/// Immutable parse result plus the metadata used to judge staleness
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    records: Arc<[ErrorRecord]>,
    /// When the parse completed
    loaded_at: SystemTime,
    /// When the source was last read, successfully or not
    checked_at: SystemTime,
    /// Source modification time observed before the last read
    source_modified: Option<SystemTime>,
}

impl CatalogSnapshot {
    pub fn new(records: Vec<ErrorRecord>, source_modified: Option<SystemTime>) -> Self {
        let now = SystemTime::now();
        Self {
            records: Arc::from(records),
            loaded_at: now,
            checked_at: now,
            source_modified,
        }
    }

    /// Same records, marked as checked now after a failed refresh.
    fn rechecked(&self, source_modified: Option<SystemTime>) -> Self {
        Self {
            records: Arc::clone(&self.records),
            loaded_at: self.loaded_at,
            checked_at: SystemTime::now(),
            source_modified,
        }
    }

    pub fn records(&self) -> &[ErrorRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn loaded_at(&self) -> SystemTime {
        self.loaded_at
    }

    pub fn checked_at(&self) -> SystemTime {
        self.checked_at
    }

    pub fn source_modified(&self) -> Option<SystemTime> {
        self.source_modified
    }

    /// Stale once `ttl` has elapsed or the source changed since the last read.
    pub fn is_stale(&self, ttl: Duration, source_modified: Option<SystemTime>) -> bool {
        let expired = match self.checked_at.elapsed() {
            Ok(age) => age > ttl,
            // Wall clock moved backwards; reload rather than trust the age
            Err(_) => true,
        };
        let modified = source_modified.is_some_and(|mtime| mtime > self.checked_at);
        expired || modified
    }
}

/// Counters describing cache activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Accesses served from an existing snapshot
    pub hits: u64,
    /// Successful parses (initial loads and refreshes)
    pub loads: u64,
    /// Refreshes that failed while an older snapshot kept being served
    pub refresh_failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    loads: AtomicU64,
    refresh_failures: AtomicU64,
}

/// Materialized catalog with TTL and modification-time invalidation
pub struct CatalogCache {
    source: Arc<dyn CatalogSource>,
    ttl: Duration,
    current: RwLock<Option<Arc<CatalogSnapshot>>>,
    refresh_lock: Mutex<()>,
    counters: Counters,
}

impl CatalogCache {
    pub fn new(source: Arc<dyn CatalogSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            current: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            counters: Counters::default(),
        }
    }

    pub fn with_default_ttl(source: Arc<dyn CatalogSource>) -> Self {
        Self::new(source, DEFAULT_CACHE_TTL)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn source_name(&self) -> String {
        self.source.name()
    }

    /// Current snapshot, loading or refreshing it first when needed.
    ///
    /// A failed refresh keeps the previous snapshot in service and is only
    /// reported through logs and `stats()`. Without a previous snapshot the
    /// failure is returned.
    pub fn snapshot(&self) -> Result<Arc<CatalogSnapshot>, CatalogError> {
        let mtime = self.source.modified();
        if let Some(snapshot) = self.fresh(mtime) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(snapshot);
        }

        let _guard = self
            .refresh_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        // Another caller may have refreshed while we waited
        let mtime = self.source.modified();
        if let Some(snapshot) = self.fresh(mtime) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(snapshot);
        }

        let previous = self.peek();
        match parse_catalog(self.source.as_ref()) {
            Ok(records) => {
                let snapshot = Arc::new(CatalogSnapshot::new(records, mtime));
                self.publish(Some(Arc::clone(&snapshot)));
                self.counters.loads.fetch_add(1, Ordering::Relaxed);
                if previous.is_some() {
                    info!(
                        "Reloaded catalog {} ({} records)",
                        self.source.name(),
                        snapshot.len()
                    );
                } else {
                    debug!(
                        "Loaded catalog {} ({} records)",
                        self.source.name(),
                        snapshot.len()
                    );
                }
                Ok(snapshot)
            }
            Err(err) => match previous {
                Some(stale) => {
                    self.counters.refresh_failures.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        "Catalog refresh failed, serving snapshot with {} records: {}",
                        stale.len(),
                        err
                    );
                    // Next retry waits for the TTL or a newer source
                    let retained = Arc::new(stale.rechecked(mtime));
                    self.publish(Some(Arc::clone(&retained)));
                    Ok(retained)
                }
                None => Err(err),
            },
        }
    }

    /// Snapshot currently held, without any staleness check or load.
    pub fn peek(&self) -> Option<Arc<CatalogSnapshot>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drop the snapshot; the next access parses the source again.
    pub fn invalidate(&self) {
        let _guard = self
            .refresh_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.publish(None);
        debug!("Invalidated catalog cache for {}", self.source.name());
    }

    pub fn is_cached(&self) -> bool {
        self.peek().is_some()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            loads: self.counters.loads.load(Ordering::Relaxed),
            refresh_failures: self.counters.refresh_failures.load(Ordering::Relaxed),
        }
    }

    fn fresh(&self, mtime: Option<SystemTime>) -> Option<Arc<CatalogSnapshot>> {
        self.peek()
            .filter(|snapshot| !snapshot.is_stale(self.ttl, mtime))
    }

    fn publish(&self, snapshot: Option<Arc<CatalogSnapshot>>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }
}

impl std::fmt::Debug for CatalogCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogCache")
            .field("source", &self.source.name())
            .field("ttl", &self.ttl)
            .field("cached", &self.is_cached())
            .field("stats", &self.stats())
            .finish()
    }
}

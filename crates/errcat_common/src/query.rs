//! Catalog Query Service
//!
//! `ErrorCatalog` is the programmatic surface over a catalog. Every query is
//! written once against `CatalogBackend`; the cached and streaming backends
//! only differ in how they produce records, so their answers cannot drift.

use std::collections::BTreeSet;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::{CacheStats, CatalogCache};
use crate::error::CatalogError;
use crate::format::{dispatch, LogSink};
use crate::record::ErrorRecord;
use crate::scanner::StreamingScanner;
use crate::source::CatalogSource;

/// Catalog access strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Parse once, serve from memory, re-parse when stale
    #[default]
    Cached,
    /// Re-scan the source on every query, one record at a time
    Streaming,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Cached => "cached",
            Strategy::Streaming => "streaming",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cached" | "cache" => Some(Strategy::Cached),
            "streaming" | "stream" => Some(Strategy::Streaming),
            _ => None,
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record producer behind an `ErrorCatalog`
pub trait CatalogBackend: Send + Sync {
    fn strategy(&self) -> Strategy;

    fn source_name(&self) -> String;

    /// Visit records in document order until `visit` breaks.
    fn visit(
        &self,
        visit: &mut dyn FnMut(&ErrorRecord) -> ControlFlow<()>,
    ) -> Result<(), CatalogError>;

    /// Total number of records.
    fn count(&self) -> Result<usize, CatalogError>;

    fn cache_stats(&self) -> Option<CacheStats> {
        None
    }

    /// When the retained snapshot was parsed, if there is one.
    fn loaded_at(&self) -> Option<SystemTime> {
        None
    }

    /// Forget any retained state. No-op for stateless backends.
    fn invalidate(&self) {}
}

impl CatalogBackend for CatalogCache {
    fn strategy(&self) -> Strategy {
        Strategy::Cached
    }

    fn source_name(&self) -> String {
        CatalogCache::source_name(self)
    }

    fn visit(
        &self,
        visit: &mut dyn FnMut(&ErrorRecord) -> ControlFlow<()>,
    ) -> Result<(), CatalogError> {
        let snapshot = self.snapshot()?;
        for record in snapshot.records() {
            if visit(record).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn count(&self) -> Result<usize, CatalogError> {
        Ok(self.snapshot()?.len())
    }

    fn cache_stats(&self) -> Option<CacheStats> {
        Some(self.stats())
    }

    fn loaded_at(&self) -> Option<SystemTime> {
        self.peek().map(|snapshot| snapshot.loaded_at())
    }

    fn invalidate(&self) {
        CatalogCache::invalidate(self)
    }
}

impl CatalogBackend for StreamingScanner {
    fn strategy(&self) -> Strategy {
        Strategy::Streaming
    }

    fn source_name(&self) -> String {
        StreamingScanner::source_name(self)
    }

    fn visit(
        &self,
        visit: &mut dyn FnMut(&ErrorRecord) -> ControlFlow<()>,
    ) -> Result<(), CatalogError> {
        self.scan(|record| visit(&record))
    }

    fn count(&self) -> Result<usize, CatalogError> {
        StreamingScanner::count(self)
    }
}

/// Read-only query surface over one catalog
pub struct ErrorCatalog {
    backend: Box<dyn CatalogBackend>,
}

impl ErrorCatalog {
    pub fn new(backend: Box<dyn CatalogBackend>) -> Self {
        Self { backend }
    }

    pub fn cached(source: Arc<dyn CatalogSource>, ttl: Duration) -> Self {
        Self::new(Box::new(CatalogCache::new(source, ttl)))
    }

    pub fn streaming(source: Arc<dyn CatalogSource>) -> Self {
        Self::new(Box::new(StreamingScanner::new(source)))
    }

    pub fn with_strategy(strategy: Strategy, source: Arc<dyn CatalogSource>, ttl: Duration) -> Self {
        match strategy {
            Strategy::Cached => Self::cached(source, ttl),
            Strategy::Streaming => Self::streaming(source),
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.backend.strategy()
    }

    pub fn source_name(&self) -> String {
        self.backend.source_name()
    }

    /// First record whose id equals `id` exactly.
    pub fn lookup(&self, id: &str) -> Result<Option<ErrorRecord>, CatalogError> {
        let mut found = None;
        self.backend.visit(&mut |record| {
            if record.id == id {
                found = Some(record.clone());
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })?;
        Ok(found)
    }

    /// Records whose level equals `level` ignoring case, in document order.
    pub fn list_by_level(&self, level: &str) -> Result<Vec<ErrorRecord>, CatalogError> {
        let mut matches = Vec::new();
        self.backend.visit(&mut |record| {
            if record.level_matches(level) {
                matches.push(record.clone());
            }
            ControlFlow::Continue(())
        })?;
        Ok(matches)
    }

    /// Whether `lookup(id)` would find a record. Failures read as `false`.
    pub fn exists(&self, id: &str) -> bool {
        match self.lookup(id) {
            Ok(found) => found.is_some(),
            Err(err) => {
                debug!("exists({}) treated as false: {}", id, err);
                false
            }
        }
    }

    /// Number of records in the catalog. Failures read as `0`.
    pub fn count(&self) -> usize {
        self.backend.count().unwrap_or_else(|err| {
            debug!("count treated as 0: {}", err);
            0
        })
    }

    /// Distinct level values exactly as written.
    ///
    /// Not case-normalized: `Error` and `ERROR` are reported separately even
    /// though `list_by_level` treats them as the same level. Records without
    /// a level contribute nothing.
    pub fn distinct_levels(&self) -> Result<BTreeSet<String>, CatalogError> {
        let mut levels = BTreeSet::new();
        self.backend.visit(&mut |record| {
            if !record.level.is_empty() && !levels.contains(&record.level) {
                levels.insert(record.level.clone());
            }
            ControlFlow::Continue(())
        })?;
        Ok(levels)
    }

    /// Look up `id` and send the formatted record to the sink for its level.
    ///
    /// A missing id goes to the warning sink, a catalog failure to the error
    /// sink. Returns whether a record was dispatched.
    pub fn report(&self, id: &str, sink: &dyn LogSink) -> bool {
        match self.lookup(id) {
            Ok(Some(record)) => {
                dispatch(&record, sink);
                true
            }
            Ok(None) => {
                sink.warning(&format!("Error with ID '{}' not found", id));
                false
            }
            Err(err) => {
                sink.error(&format!("Failed to read error catalog: {}", err));
                false
            }
        }
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.backend.cache_stats()
    }

    pub fn loaded_at(&self) -> Option<SystemTime> {
        self.backend.loaded_at()
    }

    /// Drop cached state; the next query reads the source again.
    pub fn invalidate(&self) {
        self.backend.invalidate()
    }
}

impl std::fmt::Debug for ErrorCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorCatalog")
            .field("strategy", &self.strategy())
            .field("source", &self.source_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{MemorySink, Severity};
    use crate::source::MemorySource;

    const SAMPLE: &str = r#"<ErrorLog>
  <Error><ID>E001</ID><Category>Physics</Category><Type>Runtime</Type><Level>Error</Level>
    <UnityMessage>Rigidbody missing</UnityMessage><SuggestedFix>Add Rigidbody</SuggestedFix></Error>
  <Error><ID>E002</ID><Level>Warning</Level><UnityMessage>Slow frame</UnityMessage></Error>
  <Error><ID>E003</ID><Level>ERROR</Level></Error>
  <Error><ID>E001</ID><Level>Info</Level></Error>
  <Error><Level>info</Level></Error>
</ErrorLog>"#;

    fn both(xml: &str) -> [ErrorCatalog; 2] {
        let source: Arc<dyn CatalogSource> = Arc::new(MemorySource::new("sample", xml));
        [
            ErrorCatalog::cached(Arc::clone(&source), Duration::from_secs(30)),
            ErrorCatalog::streaming(source),
        ]
    }

    #[test]
    fn test_lookup_first_match_wins() {
        for catalog in both(SAMPLE) {
            let record = catalog.lookup("E001").unwrap().unwrap();
            assert_eq!(record.level, "Error", "{:?}", catalog);
            assert!(catalog.lookup("e001").unwrap().is_none());
            assert!(catalog.lookup("E404").unwrap().is_none());
        }
    }

    #[test]
    fn test_list_by_level_case_insensitive() {
        for catalog in both(SAMPLE) {
            let upper = catalog.list_by_level("ERROR").unwrap();
            let lower = catalog.list_by_level("error").unwrap();
            assert_eq!(upper, lower);
            let ids: Vec<_> = upper.iter().map(|r| r.id.as_str()).collect();
            assert_eq!(ids, vec!["E001", "E003"]);
            assert!(catalog.list_by_level("fatal").unwrap().is_empty());
        }
    }

    #[test]
    fn test_count_and_exists() {
        for catalog in both(SAMPLE) {
            assert_eq!(catalog.count(), 5);
            assert!(catalog.exists("E002"));
            assert!(!catalog.exists("E999"));
        }
    }

    #[test]
    fn test_distinct_levels_keep_raw_casing() {
        for catalog in both(SAMPLE) {
            let levels: Vec<_> = catalog.distinct_levels().unwrap().into_iter().collect();
            assert_eq!(levels, vec!["ERROR", "Error", "Info", "Warning", "info"]);
        }
    }

    #[test]
    fn test_failures_map_to_defaults() {
        for catalog in both("<ErrorLog><Error><ID>E1</ID>") {
            assert_eq!(catalog.count(), 0);
            assert!(!catalog.exists("E1"));
            assert!(catalog.lookup("E1").unwrap_err().is_format());
            assert!(catalog.list_by_level("Error").unwrap_err().is_format());
            assert!(catalog.distinct_levels().unwrap_err().is_format());
        }
    }

    #[test]
    fn test_report_dispatches_by_level() {
        for catalog in both(SAMPLE) {
            let sink = MemorySink::default();
            assert!(catalog.report("E002", &sink));
            assert!(!catalog.report("E404", &sink));

            let entries = sink.entries();
            assert_eq!(entries.len(), 2);
            assert_eq!(entries[0].0, Severity::Warning);
            assert!(entries[0].1.starts_with("[Warning] ID: E002"));
            assert_eq!(entries[1], (Severity::Warning, "Error with ID 'E404' not found".to_string()));
        }
    }

    #[test]
    fn test_report_failure_goes_to_error_sink() {
        for catalog in both("") {
            let sink = MemorySink::default();
            assert!(!catalog.report("E1", &sink));
            let entries = sink.entries();
            assert_eq!(entries[0].0, Severity::Error);
            assert!(entries[0].1.starts_with("Failed to read error catalog"));
        }
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!(Strategy::parse("Streaming"), Some(Strategy::Streaming));
        assert_eq!(Strategy::parse("cached"), Some(Strategy::Cached));
        assert_eq!(Strategy::parse("dom"), None);
        assert_eq!(Strategy::default().to_string(), "cached");
    }

    #[test]
    fn test_cache_stats_only_for_cached() {
        let [cached, streaming] = both(SAMPLE);
        cached.count();
        cached.count();
        let stats = cached.cache_stats().unwrap();
        assert_eq!(stats.loads, 1);
        assert_eq!(stats.hits, 1);
        assert!(cached.loaded_at().is_some());
        assert!(streaming.cache_stats().is_none());
        assert!(streaming.loaded_at().is_none());
    }
}

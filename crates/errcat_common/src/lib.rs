//! Errcat Common - Read-only access to error descriptor catalogs
//!
//! A catalog is a markup document of `Error` elements. It can be queried
//! through a cached snapshot or by streaming the source on every call;
//! both strategies answer queries identically.

pub mod cache;
pub mod config;
pub mod error;
pub mod format;
pub mod parser;
pub mod query;
pub mod record;
pub mod scanner;
pub mod source;

pub use cache::{CacheStats, CatalogCache, CatalogSnapshot, DEFAULT_CACHE_TTL};
pub use config::{CacheConfig, CatalogConfig, SourceConfig};
pub use error::CatalogError;
pub use format::{dispatch, format_record, LogSink, MemorySink, Severity, TracingSink};
pub use parser::{parse_catalog, parse_str, RecordReader};
pub use query::{CatalogBackend, ErrorCatalog, Strategy};
pub use record::{ErrorRecord, Field};
pub use scanner::StreamingScanner;
pub use source::{CatalogSource, FileSource, MemorySource};

//! Catalog sources
//!
//! Where catalog bytes come from. Resolving the path or loading embedded
//! assets is the host's job; these adapters only open what they are given.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::CatalogError;

/// Readable catalog document
pub trait CatalogSource: Send + Sync {
    /// Human-readable name used in errors and logs.
    fn name(&self) -> String;

    /// Open a fresh reader positioned at the start of the document.
    fn open(&self) -> Result<Box<dyn BufRead + '_>, CatalogError>;

    /// Last modification time, when the source has one.
    fn modified(&self) -> Option<SystemTime>;
}

/// Catalog stored in a file on disk
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogSource for FileSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn open(&self) -> Result<Box<dyn BufRead + '_>, CatalogError> {
        let file = File::open(&self.path).map_err(|e| CatalogError::unavailable(self.name(), e))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn modified(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).and_then(|m| m.modified()).ok()
    }
}

/// Catalog held in memory (embedded asset, test fixture)
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    bytes: Arc<[u8]>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: Arc::from(bytes.into()),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl CatalogSource for MemorySource {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn open(&self) -> Result<Box<dyn BufRead + '_>, CatalogError> {
        Ok(Box::new(Cursor::new(&self.bytes[..])))
    }

    fn modified(&self) -> Option<SystemTime> {
        None
    }
}

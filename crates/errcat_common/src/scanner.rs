//! Streaming Scanner
//!
//! Re-reads the source on every call and decodes one record at a time.
//! Nothing is kept between calls, so a scanner can be shared freely.

use std::ops::ControlFlow;
use std::sync::Arc;

use crate::error::CatalogError;
use crate::parser::RecordReader;
use crate::record::ErrorRecord;
use crate::source::CatalogSource;

#[derive(Clone)]
pub struct StreamingScanner {
    source: Arc<dyn CatalogSource>,
}

impl StreamingScanner {
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self { source }
    }

    pub fn source_name(&self) -> String {
        self.source.name()
    }

    /// Visit records in document order until `visit` breaks.
    ///
    /// Only the record being visited is held in memory. After a break the
    /// rest of the document is still read without extracting fields, so a
    /// malformed catalog fails here exactly as it fails a full parse.
    pub fn scan<F>(&self, mut visit: F) -> Result<(), CatalogError>
    where
        F: FnMut(ErrorRecord) -> ControlFlow<()>,
    {
        let mut reader = RecordReader::new(self.source.name(), self.source.open()?);
        while let Some(record) = reader.next_record()? {
            if visit(record).is_break() {
                return reader.finish();
            }
        }
        Ok(())
    }

    /// First record satisfying `predicate`.
    pub fn find<P>(&self, mut predicate: P) -> Result<Option<ErrorRecord>, CatalogError>
    where
        P: FnMut(&ErrorRecord) -> bool,
    {
        let mut found = None;
        self.scan(|record| {
            if predicate(&record) {
                found = Some(record);
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })?;
        Ok(found)
    }

    /// Every record satisfying `predicate`, in document order.
    pub fn collect<P>(&self, mut predicate: P) -> Result<Vec<ErrorRecord>, CatalogError>
    where
        P: FnMut(&ErrorRecord) -> bool,
    {
        let mut matches = Vec::new();
        self.scan(|record| {
            if predicate(&record) {
                matches.push(record);
            }
            ControlFlow::Continue(())
        })?;
        Ok(matches)
    }

    /// Number of `Error` elements, skipping record bodies undecoded.
    pub fn count(&self) -> Result<usize, CatalogError> {
        RecordReader::new(self.source.name(), self.source.open()?).count_remaining()
    }
}

impl std::fmt::Debug for StreamingScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingScanner")
            .field("source", &self.source.name())
            .finish()
    }
}

//! Catalog Parser
//!
//! Pull decoder over catalog markup. `RecordReader` walks the document one
//! event at a time and yields one `ErrorRecord` per `Error` element, so the
//! same decoder backs both the materialized snapshot and the streaming scan.
//!
//! Rules:
//! - `Error` elements are matched at any depth, including inside another
//!   `Error`; records come out in start-tag order
//! - only the first direct child with a recognized name fills a field
//! - a field's value is all text inside that child, nested markup included
//! - the document must be well-formed with exactly one root element
//!
//! Records nested inside an `Error` are held until the outermost `Error`
//! closes, so memory is bounded by the largest top-level `Error` subtree.

use std::collections::VecDeque;
use std::io::BufRead;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::CatalogError;
use crate::record::{ErrorRecord, Field, FieldSet, ERROR_TAG};
use crate::source::CatalogSource;

/// Position of the reader after locating the next `Error` element
enum Located {
    /// `<Error>`: body follows
    Open,
    /// `<Error/>`: record with every field empty
    Empty,
}

/// Structural summary of one event while searching for records
enum Scan {
    Element { is_error: bool, empty: bool },
    Close,
    Text { blank: bool },
    Eof,
    Other,
}

/// An `Error` element whose end tag has not been reached yet
struct Frame {
    /// Index of the record being filled in the current batch
    slot: usize,
    filled: FieldSet,
    capture: Option<Field>,
    /// Depth relative to the `Error` element; direct children open at 1
    depth: usize,
}

impl Frame {
    fn open(slot: usize) -> Self {
        Self {
            slot,
            filled: FieldSet::default(),
            capture: None,
            depth: 1,
        }
    }

    fn open_child(&mut self, name: &[u8]) {
        if self.depth == 1 {
            self.capture = Field::from_tag(name).filter(|field| !self.filled.contains(*field));
            if let Some(field) = self.capture {
                self.filled.insert(field);
            }
        }
        self.depth += 1;
    }

    fn empty_child(&mut self, name: &[u8]) {
        if self.depth == 1 {
            if let Some(field) = Field::from_tag(name) {
                self.filled.insert(field);
            }
        }
    }

    fn close_child(&mut self) {
        self.depth -= 1;
        if self.depth == 1 {
            self.capture = None;
        }
    }
}

/// Incremental record decoder
pub struct RecordReader<R> {
    reader: Reader<R>,
    source_name: String,
    buf: Vec<u8>,
    /// Element nesting depth outside of record bodies
    depth: usize,
    root_seen: bool,
    finished: bool,
    failed: Option<CatalogError>,
    /// Nested records decoded along with the last top-level record
    ready: VecDeque<ErrorRecord>,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(source_name: impl Into<String>, input: R) -> Self {
        let mut reader = Reader::from_reader(input);
        reader.config_mut().check_end_names = true;

        Self {
            reader,
            source_name: source_name.into(),
            buf: Vec::new(),
            depth: 0,
            root_seen: false,
            finished: false,
            failed: None,
            ready: VecDeque::new(),
        }
    }

    /// Decode the next record, or `None` once the document is exhausted.
    pub fn next_record(&mut self) -> Result<Option<ErrorRecord>, CatalogError> {
        if let Some(err) = &self.failed {
            return Err(err.clone());
        }
        if let Some(record) = self.ready.pop_front() {
            return Ok(Some(record));
        }

        let result = self.seek_error().and_then(|located| match located {
            None => Ok(None),
            Some(Located::Empty) => Ok(Some(ErrorRecord::default())),
            Some(Located::Open) => {
                let mut batch = self.decode_subtree()?;
                let first = batch.pop_front();
                self.ready = batch;
                Ok(first)
            }
        });
        self.track(result)
    }

    /// Advance past the next record without extracting any field.
    ///
    /// Records nested inside it are passed over too, as are records still
    /// queued from the last decoded subtree. Returns how many records were
    /// passed over, `0` once the document is exhausted.
    pub fn skip_record(&mut self) -> Result<usize, CatalogError> {
        if let Some(err) = &self.failed {
            return Err(err.clone());
        }
        if !self.ready.is_empty() {
            let queued = self.ready.len();
            self.ready.clear();
            return Ok(queued);
        }

        let result = self.seek_error().and_then(|located| match located {
            None => Ok(0),
            Some(Located::Empty) => Ok(1),
            Some(Located::Open) => self.skip_subtree(),
        });
        self.track(result)
    }

    /// Count the remaining records without extracting any field.
    pub fn count_remaining(&mut self) -> Result<usize, CatalogError> {
        let mut count = 0;
        loop {
            match self.skip_record()? {
                0 => return Ok(count),
                passed => count += passed,
            }
        }
    }

    /// Read to the end of the document, checking structure only.
    pub fn finish(&mut self) -> Result<(), CatalogError> {
        self.count_remaining().map(|_| ())
    }

    fn track<T>(&mut self, result: Result<T, CatalogError>) -> Result<T, CatalogError> {
        if let Err(err) = &result {
            self.failed = Some(err.clone());
        }
        result
    }

    /// Walk forward to the next `Error` element, checking document structure.
    fn seek_error(&mut self) -> Result<Option<Located>, CatalogError> {
        if self.finished {
            return Ok(None);
        }

        loop {
            self.buf.clear();
            let event = self
                .reader
                .read_event_into(&mut self.buf)
                .map_err(|e| xml_error(&self.source_name, e))?;

            let scan = match event {
                Event::Start(start) => Scan::Element {
                    is_error: start.name().as_ref() == ERROR_TAG,
                    empty: false,
                },
                Event::Empty(start) => Scan::Element {
                    is_error: start.name().as_ref() == ERROR_TAG,
                    empty: true,
                },
                Event::End(_) => Scan::Close,
                Event::Text(text) => Scan::Text {
                    blank: text.iter().all(u8::is_ascii_whitespace),
                },
                Event::CData(_) => Scan::Text { blank: false },
                Event::Eof => Scan::Eof,
                _ => Scan::Other,
            };

            match scan {
                Scan::Element { is_error, empty } => {
                    self.enter_element()?;
                    if !empty {
                        self.depth += 1;
                    }
                    if is_error {
                        return Ok(Some(if empty { Located::Empty } else { Located::Open }));
                    }
                }
                Scan::Close => {
                    self.depth = self.depth.saturating_sub(1);
                }
                Scan::Text { blank } => {
                    if self.depth == 0 && !blank {
                        return Err(malformed(&self.source_name, "content outside of the root element"));
                    }
                }
                Scan::Eof => {
                    if self.depth > 0 {
                        return Err(malformed(&self.source_name, "unexpected end of document"));
                    }
                    if !self.root_seen {
                        return Err(malformed(&self.source_name, "root element is missing"));
                    }
                    self.finished = true;
                    return Ok(None);
                }
                Scan::Other => {}
            }
        }
    }

    fn enter_element(&mut self) -> Result<(), CatalogError> {
        if self.depth == 0 {
            if self.root_seen {
                return Err(malformed(&self.source_name, "multiple root elements"));
            }
            self.root_seen = true;
        }
        Ok(())
    }

    /// Decode an open `Error` element up to its end tag.
    ///
    /// Returns its record first, followed by one record per nested `Error`
    /// in start-tag order.
    fn decode_subtree(&mut self) -> Result<VecDeque<ErrorRecord>, CatalogError> {
        let mut batch = vec![ErrorRecord::default()];
        let mut frames = vec![Frame::open(0)];

        while !frames.is_empty() {
            self.buf.clear();
            let event = self
                .reader
                .read_event_into(&mut self.buf)
                .map_err(|e| xml_error(&self.source_name, e))?;

            match event {
                Event::Start(start) => {
                    let name = start.name();
                    for frame in frames.iter_mut() {
                        frame.open_child(name.as_ref());
                    }
                    if name.as_ref() == ERROR_TAG {
                        batch.push(ErrorRecord::default());
                        frames.push(Frame::open(batch.len() - 1));
                    }
                }
                Event::Empty(start) => {
                    let name = start.name();
                    for frame in frames.iter_mut() {
                        frame.empty_child(name.as_ref());
                    }
                    if name.as_ref() == ERROR_TAG {
                        batch.push(ErrorRecord::default());
                    }
                }
                Event::Text(text) => {
                    if frames.iter().any(|frame| frame.capture.is_some()) {
                        let value = text
                            .unescape()
                            .map_err(|e| CatalogError::format(self.source_name.as_str(), e))?;
                        capture_text(&frames, &mut batch, &value);
                    }
                }
                Event::CData(data) => {
                    if frames.iter().any(|frame| frame.capture.is_some()) {
                        let value = data
                            .decode()
                            .map_err(|e| CatalogError::format(self.source_name.as_str(), e))?;
                        capture_text(&frames, &mut batch, &value);
                    }
                }
                Event::End(_) => {
                    for frame in frames.iter_mut() {
                        frame.close_child();
                    }
                    if frames.last().is_some_and(|frame| frame.depth == 0) {
                        frames.pop();
                    }
                }
                Event::Eof => {
                    return Err(malformed(
                        &self.source_name,
                        "unexpected end of document inside an Error element",
                    ));
                }
                _ => {}
            }
        }

        self.depth -= 1;
        Ok(batch.into())
    }

    /// Pass an open `Error` element, counting it and every nested `Error`.
    fn skip_subtree(&mut self) -> Result<usize, CatalogError> {
        let mut records = 1;
        let mut depth = 1usize;

        while depth > 0 {
            self.buf.clear();
            let event = self
                .reader
                .read_event_into(&mut self.buf)
                .map_err(|e| xml_error(&self.source_name, e))?;

            match event {
                Event::Start(start) => {
                    if start.name().as_ref() == ERROR_TAG {
                        records += 1;
                    }
                    depth += 1;
                }
                Event::Empty(start) => {
                    if start.name().as_ref() == ERROR_TAG {
                        records += 1;
                    }
                }
                Event::End(_) => depth -= 1,
                Event::Eof => {
                    return Err(malformed(
                        &self.source_name,
                        "unexpected end of document inside an Error element",
                    ));
                }
                _ => {}
            }
        }

        self.depth -= 1;
        Ok(records)
    }
}

/// Append text to every record currently capturing a field.
fn capture_text(frames: &[Frame], batch: &mut [ErrorRecord], value: &str) {
    for frame in frames {
        if let Some(field) = frame.capture {
            batch[frame.slot].field_mut(field).push_str(value);
        }
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<ErrorRecord, CatalogError>;

    fn next(&mut self) -> Option<Self::Item> {
        // Stop after the first error has been reported
        if self.failed.is_some() {
            return None;
        }
        self.next_record().transpose()
    }
}

/// Parse every record of a source into memory.
///
/// Either the whole document parses or nothing is returned.
pub fn parse_catalog(source: &dyn CatalogSource) -> Result<Vec<ErrorRecord>, CatalogError> {
    let input = source.open()?;
    RecordReader::new(source.name(), input).collect()
}

/// Parse an in-memory document.
pub fn parse_str(source_name: &str, text: &str) -> Result<Vec<ErrorRecord>, CatalogError> {
    RecordReader::new(source_name, text.as_bytes()).collect()
}

fn xml_error(source_name: &str, err: quick_xml::Error) -> CatalogError {
    match err {
        quick_xml::Error::Io(io) => CatalogError::unavailable(source_name, io),
        other => CatalogError::format(source_name, other),
    }
}

fn malformed(source_name: &str, reason: &str) -> CatalogError {
    CatalogError::format(source_name, reason)
}

//! Result Formatter
//!
//! Turns a record into a multi-line message and hands it to the sink that
//! matches the record's severity.

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::record::ErrorRecord;

/// Placeholder for mandatory fields that are empty in the catalog
pub const MISSING_FIELD: &str = "<not specified>";

/// Output sink selected from a record's level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    #[default]
    Info,
}

impl Severity {
    /// Map a level string, ignoring case. Unknown levels are `Info`.
    pub fn from_level(level: &str) -> Self {
        match level.to_uppercase().as_str() {
            "ERROR" => Severity::Error,
            "WARNING" => Severity::Warning,
            _ => Severity::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        }
    }
}

/// Host-supplied output callbacks
pub trait LogSink {
    fn error(&self, message: &str);
    fn warning(&self, message: &str);
    fn info(&self, message: &str);
}

/// Render a record as the fixed multi-section message.
///
/// The additional-info line is only present when the record has one.
pub fn format_record(record: &ErrorRecord) -> String {
    let mut message = format!(
        "[{}] ID: {}\nCategory: {}\nType: {}\nMessage: {}\nSuggested fix: {}\n",
        or_missing(&record.level),
        or_missing(&record.id),
        or_missing(&record.category),
        or_missing(&record.error_type),
        or_missing(&record.message),
        or_missing(&record.suggested_fix),
    );

    if record.has_additional_info() {
        message.push_str(&format!("Additional info: {}\n", record.additional_info));
    }

    message
}

/// Format `record` and send it to the sink for its severity.
pub fn dispatch(record: &ErrorRecord, sink: &dyn LogSink) -> Severity {
    let severity = Severity::from_level(&record.level);
    let message = format_record(record);
    match severity {
        Severity::Error => sink.error(&message),
        Severity::Warning => sink.warning(&message),
        Severity::Info => sink.info(&message),
    }
    severity
}

fn or_missing(value: &str) -> &str {
    if value.is_empty() {
        MISSING_FIELD
    } else {
        value
    }
}

/// Sink that forwards to `tracing` at the matching level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }

    fn warning(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }
}

/// Sink that keeps every message, for hosts that render later and for tests
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(Severity, String)>>,
}

impl MemorySink {
    pub fn entries(&self) -> Vec<(Severity, String)> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, severity: Severity, message: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((severity, message.to_string()));
    }
}

impl LogSink for MemorySink {
    fn error(&self, message: &str) {
        self.push(Severity::Error, message);
    }

    fn warning(&self, message: &str) {
        self.push(Severity::Warning, message);
    }

    fn info(&self, message: &str) {
        self.push(Severity::Info, message);
    }
}

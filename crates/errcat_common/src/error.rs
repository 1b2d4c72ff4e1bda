//! Error types for catalog access.
//!
//! "No matching record" is never an error: queries return `None` or an
//! empty list for that case.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The catalog file or resource is missing or unreadable.
    #[error("Catalog source unavailable: {source_name}: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    /// The catalog bytes are not well-formed markup.
    #[error("Catalog format error in {source_name}: {reason}")]
    Format { source_name: String, reason: String },
}

impl CatalogError {
    pub fn unavailable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        CatalogError::SourceUnavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn format(source_name: impl Into<String>, reason: impl ToString) -> Self {
        CatalogError::Format {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    /// Short machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogError::SourceUnavailable { .. } => "source_unavailable",
            CatalogError::Format { .. } => "format_error",
        }
    }

    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, CatalogError::SourceUnavailable { .. })
    }

    pub fn is_format(&self) -> bool {
        matches!(self, CatalogError::Format { .. })
    }
}

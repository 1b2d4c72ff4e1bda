//! Error descriptor records
//!
//! One `ErrorRecord` per `Error` element in the catalog. Every field is a
//! plain string; a field whose element is missing from the catalog is empty.

use serde::{Deserialize, Serialize};

/// Element name that delimits one record in the catalog markup.
pub const ERROR_TAG: &[u8] = b"Error";

/// A single error descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Catalog key (`ID`)
    pub id: String,

    /// Free-form classification (`Category`)
    pub category: String,

    /// Free-form classification (`Type`)
    #[serde(rename = "type")]
    pub error_type: String,

    /// Severity tag (`Level`), stored as written in the catalog
    pub level: String,

    /// Primary human-readable description (`UnityMessage`)
    pub message: String,

    /// Suggested remediation (`SuggestedFix`)
    pub suggested_fix: String,

    /// Optional extra details (`AdditionalInfo`)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub additional_info: String,
}

impl ErrorRecord {
    /// Case-insensitive level comparison used by level queries.
    pub fn level_matches(&self, level: &str) -> bool {
        self.level.to_lowercase() == level.to_lowercase()
    }

    pub fn has_additional_info(&self) -> bool {
        !self.additional_info.is_empty()
    }

    pub(crate) fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Id => &mut self.id,
            Field::Category => &mut self.category,
            Field::Type => &mut self.error_type,
            Field::Level => &mut self.level,
            Field::Message => &mut self.message,
            Field::SuggestedFix => &mut self.suggested_fix,
            Field::AdditionalInfo => &mut self.additional_info,
        }
    }
}

/// Child elements of `Error` that map onto record fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Id,
    Category,
    Type,
    Level,
    Message,
    SuggestedFix,
    AdditionalInfo,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Id,
        Field::Category,
        Field::Type,
        Field::Level,
        Field::Message,
        Field::SuggestedFix,
        Field::AdditionalInfo,
    ];

    /// Element name as written in the catalog.
    pub fn tag(&self) -> &'static str {
        match self {
            Field::Id => "ID",
            Field::Category => "Category",
            Field::Type => "Type",
            Field::Level => "Level",
            Field::Message => "UnityMessage",
            Field::SuggestedFix => "SuggestedFix",
            Field::AdditionalInfo => "AdditionalInfo",
        }
    }

    /// Resolve an element name; unknown names are ignored by the parser.
    pub fn from_tag(name: &[u8]) -> Option<Self> {
        Field::ALL
            .into_iter()
            .find(|field| field.tag().as_bytes() == name)
    }

    fn bit(&self) -> u8 {
        1 << (*self as u8)
    }
}

/// Tracks which fields have already been filled for a record.
/// The first child element with a given name wins.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct FieldSet(u8);

impl FieldSet {
    pub(crate) fn contains(&self, field: Field) -> bool {
        self.0 & field.bit() != 0
    }

    pub(crate) fn insert(&mut self, field: Field) {
        self.0 |= field.bit();
    }
}

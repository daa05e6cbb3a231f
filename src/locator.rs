//! Language block location

use crate::error::{FieldError, Result};
use crate::metadata::DatabaseMetadata;

/// Position of one language's block within a raw record, in field units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLocator {
    /// Index of the block's first field
    pub start_field: usize,
    /// Number of fields in the block
    pub field_count: usize,
}

/// Find the block for `language` (exact, case-sensitive match)
///
/// Languages are scanned in declaration order and the first match wins.
pub fn locate(metadata: &DatabaseMetadata, language: &str) -> Result<FieldLocator> {
    metadata
        .languages
        .iter()
        .find(|lang| lang.name == language)
        .map(|lang| FieldLocator {
            start_field: lang.field_offset,
            field_count: metadata.fields_per_language_block,
        })
        .ok_or_else(|| FieldError::UnsupportedLanguage(language.to_string()))
}

impl DatabaseMetadata {
    /// Find the block for `language`; see [`locate`]
    pub fn locate(&self, language: &str) -> Result<FieldLocator> {
        locate(self, language)
    }
}

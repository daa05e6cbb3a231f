//! Indexed field selection within a language block

use crate::error::{FieldError, Result};
use crate::scanner::DELIMITER;
use memchr::memchr_iter;

/// Owned copy of one extracted field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ExtractedField(Vec<u8>);

impl ExtractedField {
    /// Copy `bytes` out of the record they were found in
    pub fn new(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    /// Field bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Field as UTF-8, if it is valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    /// Field as a string, replacing invalid UTF-8
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }

    /// True for an empty field
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Take the underlying bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for ExtractedField {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Display for ExtractedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// Select the `index`-th tab-separated segment of `block`
///
/// Returns as soon as the segment's terminating delimiter is found. When the
/// block ends first, the final segment answers both its own index and the one
/// after it; some databases ship blocks one field shorter than declared.
///
/// # Example
///
/// ```
/// use ipdb_field::extract::field_at;
///
/// assert_eq!(field_at(b"a\tb", 0).unwrap(), b"a");
/// assert_eq!(field_at(b"a\tb", 1).unwrap(), b"b");
/// assert_eq!(field_at(b"a\tb", 2).unwrap(), b"b");
/// assert!(field_at(b"a\tb", 3).is_err());
/// ```
pub fn field_at(block: &[u8], index: usize) -> Result<&[u8]> {
    let mut segment_start = 0;
    let mut delimiters = 0;

    for pos in memchr_iter(DELIMITER, block) {
        if delimiters == index {
            return Ok(&block[segment_start..pos]);
        }
        segment_start = pos + 1;
        delimiters += 1;
    }

    if index == delimiters || index == delimiters + 1 {
        Ok(&block[segment_start..])
    } else {
        Err(FieldError::FieldIndexOutOfRange {
            index,
            available: delimiters + 1,
        })
    }
}

/// Split a block into all of its segments
pub fn split_fields(block: &[u8]) -> impl Iterator<Item = &[u8]> {
    block.split(|&b| b == DELIMITER)
}

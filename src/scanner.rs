//! Delimited range extraction
//!
//! Raw records are tab-separated fields with no stored field count. The only way
//! to know a record is long enough is to count delimiters, which [`extract_range`]
//! does in the same pass that finds the range boundaries.

use crate::error::{FieldError, Result};
use memchr::memchr_iter;

/// Field separator used by IPDB records
pub const DELIMITER: u8 = b'\t';

/// Return the bytes of fields `start_field .. start_field + field_count`
///
/// The returned slice carries the inner delimiters but no leading or trailing
/// one. Fails with [`FieldError::MalformedRecord`] when `raw` holds fewer fields
/// than the range needs. An empty record holds no fields at all.
///
/// # Example
///
/// ```
/// use ipdb_field::scanner::extract_range;
///
/// let raw = b"US\tCA\tLA\tUSA\tQC\tMTL";
/// assert_eq!(extract_range(raw, 3, 3).unwrap(), b"USA\tQC\tMTL");
/// assert!(extract_range(raw, 3, 4).is_err());
/// ```
pub fn extract_range(raw: &[u8], start_field: usize, field_count: usize) -> Result<&[u8]> {
    let end_field = start_field
        .checked_add(field_count)
        .ok_or(FieldError::MalformedRecord {
            required: usize::MAX,
            available: 0,
        })?;

    if raw.is_empty() {
        if end_field == 0 {
            return Ok(raw);
        }
        return Err(FieldError::MalformedRecord {
            required: end_field,
            available: 0,
        });
    }

    let mut seen = 0usize;
    let mut start = if start_field == 0 { Some(0) } else { None };
    let mut end = if end_field == 0 { Some(0) } else { None };

    for pos in memchr_iter(DELIMITER, raw) {
        seen += 1;
        if end.is_none() && seen == end_field {
            end = Some(pos);
        }
        if start.is_none() && seen == start_field {
            start = Some(pos + 1);
        }
        // Range is complete and the record has enough fields
        if end.is_some() {
            break;
        }
    }

    if end_field > seen + 1 {
        return Err(FieldError::MalformedRecord {
            required: end_field,
            available: seen + 1,
        });
    }

    let end = end.unwrap_or(raw.len());
    let start = start.unwrap_or(end).min(end);
    Ok(&raw[start..end])
}

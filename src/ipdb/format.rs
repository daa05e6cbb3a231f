//! IPDB Header Parsing
//!
//! The metadata is the only part of the file that is copied out of the mapping;
//! tree traversal and record reads work on offsets into the original bytes.

use super::types::{IpdbError, META_LEN_SIZE, NODE_BYTES};
use crate::metadata::{deserialize_languages, DatabaseMetadata, LanguageBlock};
use serde::Deserialize;
use zerocopy::byteorder::big_endian::U32;
use zerocopy::FromBytes;

/// Metadata JSON as stored in the file
#[derive(Debug, Deserialize)]
struct RawMeta {
    #[serde(default)]
    build: u64,
    ip_version: u16,
    #[serde(deserialize_with = "deserialize_languages")]
    languages: Vec<LanguageBlock>,
    node_count: u32,
    total_size: usize,
    fields: Vec<String>,
}

/// Offsets needed for lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpdbHeader {
    /// Offset of the node section (just past the metadata)
    pub body_start: usize,
    /// Number of nodes in the search tree
    pub node_count: u32,
    /// Size of the node section in bytes
    pub tree_size: usize,
}

impl IpdbHeader {
    /// Parse and validate the header of an IPDB file
    pub fn from_file(data: &[u8]) -> Result<(Self, DatabaseMetadata), IpdbError> {
        let (meta_len, _) = U32::read_from_prefix(data).map_err(|_| {
            IpdbError::FileSize(format!(
                "{} bytes is too small for an IPDB header",
                data.len()
            ))
        })?;
        let meta_len = meta_len.get() as usize;

        let body_start = META_LEN_SIZE
            .checked_add(meta_len)
            .filter(|&end| end <= data.len())
            .ok_or_else(|| {
                IpdbError::Metadata(format!(
                    "metadata length {} exceeds file size {}",
                    meta_len,
                    data.len()
                ))
            })?;

        let raw: RawMeta = serde_json::from_slice(&data[META_LEN_SIZE..body_start])
            .map_err(|e| IpdbError::Metadata(e.to_string()))?;

        if body_start.checked_add(raw.total_size) != Some(data.len()) {
            return Err(IpdbError::FileSize(format!(
                "header promises {} bytes, file has {}",
                body_start.saturating_add(raw.total_size),
                data.len()
            )));
        }

        let tree_size = (raw.node_count as usize)
            .checked_mul(NODE_BYTES)
            .filter(|&size| size <= raw.total_size)
            .ok_or_else(|| {
                IpdbError::Metadata(format!(
                    "node count {} does not fit in {} bytes",
                    raw.node_count, raw.total_size
                ))
            })?;

        let metadata = DatabaseMetadata {
            fields_per_language_block: raw.fields.len(),
            languages: raw.languages,
            field_names: raw.fields,
            build: raw.build,
            ip_version: raw.ip_version,
        };
        metadata.validate().map_err(IpdbError::Metadata)?;

        Ok((
            IpdbHeader {
                body_start,
                node_count: raw.node_count,
                tree_size,
            },
            metadata,
        ))
    }
}

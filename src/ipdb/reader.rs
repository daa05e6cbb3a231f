//! IPDB reader
//!
//! Opens an IPDB file once (memory-mapped or from owned bytes) and answers
//! lookups through [`LookupEngine`]. All methods take `&self`; a reader can be
//! shared across threads behind an `Arc`.

use super::format::IpdbHeader;
use super::tree::SearchTree;
use super::types::IpdbError;
use crate::address::IpFamily;
use crate::engine::{LookupEngine, NodeId, RawRecord};
use crate::metadata::{DatabaseMetadata, IP_VERSION_V4, IP_VERSION_V6};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// Storage for database bytes - either owned or memory-mapped
enum DatabaseStorage {
    Owned(Vec<u8>),
    Mmap(Mmap),
}

impl DatabaseStorage {
    fn as_slice(&self) -> &[u8] {
        match self {
            DatabaseStorage::Owned(v) => v.as_slice(),
            DatabaseStorage::Mmap(m) => &m[..],
        }
    }
}

/// An opened IPDB database
///
/// # Examples
///
/// ```no_run
/// use ipdb_field::{get_field, ClientAddress, IpdbReader};
///
/// let reader = IpdbReader::open("ipipfree.ipdb")?;
/// let addr = ClientAddress::from("36.102.4.81".parse::<std::net::IpAddr>()?);
///
/// // City name (third field) of the CN block
/// let city = get_field(&reader, &addr, "CN", 2)?;
/// println!("{}", city);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct IpdbReader {
    storage: DatabaseStorage,
    header: IpdbHeader,
    metadata: DatabaseMetadata,
    ipv4_start: u32,
}

impl IpdbReader {
    /// Open a database file using memory mapping
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, IpdbError> {
        let path = path.as_ref();
        let file = File::open(path)?;

        // SAFETY: the mapping is read-only and lives as long as the reader.
        // Concurrent truncation of the file by another process is not supported.
        let mmap = unsafe { Mmap::map(&file) }?;

        let reader = Self::from_storage(DatabaseStorage::Mmap(mmap))?;
        tracing::debug!(
            path = %path.display(),
            nodes = reader.header.node_count,
            languages = ?reader.metadata.language_names().collect::<Vec<_>>(),
            "opened ipdb database"
        );
        Ok(reader)
    }

    /// Create a reader from raw bytes
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, IpdbError> {
        Self::from_storage(DatabaseStorage::Owned(data))
    }

    fn from_storage(storage: DatabaseStorage) -> Result<Self, IpdbError> {
        let (header, metadata) = IpdbHeader::from_file(storage.as_slice())?;
        let body = &storage.as_slice()[header.body_start..];
        let ipv4_start = SearchTree::new(body, header.node_count).ipv4_start()?;

        if metadata.ip_version & (IP_VERSION_V4 | IP_VERSION_V6) == 0 {
            tracing::warn!(
                ip_version = metadata.ip_version,
                "database declares no supported IP version"
            );
        }

        Ok(Self {
            storage,
            header,
            metadata,
            ipv4_start,
        })
    }

    fn tree(&self) -> SearchTree<'_> {
        SearchTree::new(
            &self.storage.as_slice()[self.header.body_start..],
            self.header.node_count,
        )
    }

    /// Parsed header offsets
    pub fn header(&self) -> &IpdbHeader {
        &self.header
    }

    /// Number of nodes in the search tree
    pub fn node_count(&self) -> u32 {
        self.header.node_count
    }

    /// Total size of the database in bytes
    pub fn size(&self) -> usize {
        self.storage.as_slice().len()
    }

    /// Whether the database was memory-mapped from a file
    pub fn is_mapped(&self) -> bool {
        matches!(self.storage, DatabaseStorage::Mmap(_))
    }

    /// Whether IPv4 lookups are supported
    pub fn is_ipv4_support(&self) -> bool {
        self.metadata.ip_version & IP_VERSION_V4 != 0
    }

    /// Whether IPv6 lookups are supported
    pub fn is_ipv6_support(&self) -> bool {
        self.metadata.ip_version & IP_VERSION_V6 != 0
    }
}

impl LookupEngine for IpdbReader {
    type Error = IpdbError;

    fn is_family_supported(&self, family: IpFamily) -> bool {
        match family {
            IpFamily::V4 => self.is_ipv4_support(),
            IpFamily::V6 => self.is_ipv6_support(),
        }
    }

    fn lookup(&self, bits: &[u8], bit_len: u32) -> Result<NodeId, IpdbError> {
        let start = match bit_len {
            32 => self.ipv4_start,
            128 => 0,
            other => return Err(IpdbError::NoSupportBits(other)),
        };
        self.tree().search(start, bits, bit_len).map(NodeId)
    }

    fn resolve_node(&self, node: NodeId) -> Result<RawRecord<'_>, IpdbError> {
        self.tree().resolve(node.0).map(RawRecord::new)
    }

    fn metadata(&self) -> &DatabaseMetadata {
        &self.metadata
    }
}

impl std::fmt::Debug for IpdbReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpdbReader")
            .field("size", &self.size())
            .field("header", &self.header)
            .field("metadata", &self.metadata)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipdb::FixtureBuilder;
    use std::net::IpAddr;

    fn reader() -> IpdbReader {
        let mut builder = FixtureBuilder::new(&["country_name", "region_name", "city_name"])
            .language("CN", 0)
            .language("EN", 3);
        builder
            .insert(
                "1.2.3.0".parse().unwrap(),
                24,
                "中国\t北京\t北京\tChina\tBeijing\tBeijing",
            )
            .unwrap();
        builder
            .insert(
                "2001:db8::".parse().unwrap(),
                32,
                "美国\t\t\tUnited States\t\t",
            )
            .unwrap();
        IpdbReader::from_bytes(builder.build().unwrap()).unwrap()
    }

    fn record(reader: &IpdbReader, ip: &str) -> Result<Vec<u8>, IpdbError> {
        let addr: IpAddr = ip.parse().unwrap();
        let (bits, len) = match addr {
            IpAddr::V4(v4) => (v4.octets().to_vec(), 32),
            IpAddr::V6(v6) => (v6.octets().to_vec(), 128),
        };
        let node = reader.lookup(&bits, len)?;
        Ok(reader.resolve_node(node)?.as_bytes().to_vec())
    }

    #[test]
    fn test_ipv4_lookup() {
        let reader = reader();
        let rec = record(&reader, "1.2.3.200").unwrap();
        assert_eq!(
            String::from_utf8(rec).unwrap(),
            "中国\t北京\t北京\tChina\tBeijing\tBeijing"
        );
    }

    #[test]
    fn test_ipv6_lookup() {
        let reader = reader();
        let rec = record(&reader, "2001:db8:ffff::1").unwrap();
        assert!(rec.starts_with("美国".as_bytes()));
    }

    #[test]
    fn test_ipv4_mapped_ipv6_lookup() {
        let reader = reader();
        let rec = record(&reader, "::ffff:1.2.3.4").unwrap();
        assert!(rec.ends_with(b"Beijing"));
    }

    #[test]
    fn test_not_found() {
        let reader = reader();
        assert!(matches!(
            record(&reader, "1.2.4.1"),
            Err(IpdbError::DataNotExists)
        ));
        assert!(matches!(
            record(&reader, "2001:db9::1"),
            Err(IpdbError::DataNotExists)
        ));
    }

    #[test]
    fn test_bad_bit_length() {
        let reader = reader();
        assert!(matches!(
            reader.lookup(&[0u8; 8], 64),
            Err(IpdbError::NoSupportBits(64))
        ));
    }

    #[test]
    fn test_family_support() {
        let reader = reader();
        assert!(reader.is_family_supported(IpFamily::V4));
        assert!(reader.is_family_supported(IpFamily::V6));
        assert!(!reader.is_mapped());

        let mut builder = FixtureBuilder::new(&["country_name"])
            .language("CN", 0)
            .ip_version(IP_VERSION_V4);
        builder.insert("10.0.0.0".parse().unwrap(), 8, "内网").unwrap();
        let v4_only = IpdbReader::from_bytes(builder.build().unwrap()).unwrap();
        assert!(v4_only.is_ipv4_support());
        assert!(!v4_only.is_ipv6_support());
    }

    #[test]
    fn test_metadata() {
        let reader = reader();
        let meta = reader.metadata();
        assert_eq!(meta.fields_per_language_block, 3);
        assert_eq!(meta.field_names, vec!["country_name", "region_name", "city_name"]);
        assert_eq!(meta.language_names().collect::<Vec<_>>(), vec!["CN", "EN"]);
    }

    #[test]
    fn test_open_mapped_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.ipdb");
        let mut builder = FixtureBuilder::new(&["country_name"]).language("EN", 0);
        builder.insert("8.8.8.0".parse().unwrap(), 24, "US").unwrap();
        std::fs::write(&path, builder.build().unwrap()).unwrap();

        let reader = IpdbReader::open(&path).unwrap();
        assert!(reader.is_mapped());
        assert_eq!(record(&reader, "8.8.8.8").unwrap(), b"US");
    }

    #[test]
    fn test_open_missing_file() {
        assert!(matches!(
            IpdbReader::open("/nonexistent/path.ipdb"),
            Err(IpdbError::Io(_))
        ));
    }
}

//! In-memory IPDB writer for tests, benchmarks and fuzzing
//!
//! Produces small but structurally faithful IPDB files. It is not a database
//! build tool: no size optimisation, no merging of adjacent networks.

use super::types::{IPV4_SUBTREE_DEPTH, META_LEN_SIZE, NODE_BYTES};
use crate::metadata::{IP_VERSION_V4, IP_VERSION_V6};
use std::collections::HashMap;
use std::net::IpAddr;

/// Bytes in front of the first record, so no data pointer equals `node_count`
const DATA_SECTION_SEPARATOR: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Empty,
    Node(usize),
    Record(usize),
}

/// Builder for IPDB database bytes
#[derive(Debug)]
pub struct FixtureBuilder {
    fields: Vec<String>,
    languages: Vec<(String, usize)>,
    ip_version: u16,
    build: u64,
    nodes: Vec<[Slot; 2]>,
    records: Vec<Vec<u8>>,
    record_index: HashMap<Vec<u8>, usize>,
}

impl FixtureBuilder {
    /// Create a builder whose language blocks hold `fields`
    pub fn new(fields: &[&str]) -> Self {
        Self {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            languages: Vec::new(),
            ip_version: IP_VERSION_V4 | IP_VERSION_V6,
            build: 0,
            nodes: vec![[Slot::Empty; 2]],
            records: Vec::new(),
            record_index: HashMap::new(),
        }
    }

    /// Declare a language block starting at `field_offset`
    pub fn language(mut self, name: &str, field_offset: usize) -> Self {
        self.languages.push((name.to_string(), field_offset));
        self
    }

    /// Set the supported IP version bits
    pub fn ip_version(mut self, ip_version: u16) -> Self {
        self.ip_version = ip_version;
        self
    }

    /// Set the build timestamp
    pub fn build_time(mut self, epoch: u64) -> Self {
        self.build = epoch;
        self
    }

    /// Map `network/prefix_len` to a tab-delimited record
    ///
    /// IPv4 networks are stored under `::ffff:0:0/96`. More specific networks
    /// inserted earlier keep their records.
    pub fn insert(&mut self, network: IpAddr, prefix_len: u8, record: &str) -> Result<(), String> {
        let (octets, depth) = match network {
            IpAddr::V4(v4) => {
                if prefix_len > 32 {
                    return Err(format!("invalid IPv4 prefix length {}", prefix_len));
                }
                (
                    v4.to_ipv6_mapped().octets(),
                    IPV4_SUBTREE_DEPTH + prefix_len as usize,
                )
            }
            IpAddr::V6(v6) => {
                if prefix_len == 0 || prefix_len > 128 {
                    return Err(format!("invalid IPv6 prefix length {}", prefix_len));
                }
                (v6.octets(), prefix_len as usize)
            }
        };

        if record.len() > u16::MAX as usize {
            return Err(format!("record of {} bytes is too long", record.len()));
        }
        let record_id = self.intern(record.as_bytes());

        let bits = u128::from_be_bytes(octets);
        let mut node = 0usize;
        for level in 0..depth {
            let side = ((bits >> (127 - level)) & 1) as usize;

            let slot = self.nodes[node][side];
            if level == depth - 1 {
                match slot {
                    Slot::Node(child) => self.fill_empty(child, record_id),
                    _ => self.nodes[node][side] = Slot::Record(record_id),
                }
                break;
            }

            node = match slot {
                Slot::Node(child) => child,
                Slot::Empty => self.push_node(node, side, [Slot::Empty; 2]),
                Slot::Record(existing) => {
                    self.push_node(node, side, [Slot::Record(existing); 2])
                }
            };
        }

        Ok(())
    }

    /// Serialize the database
    pub fn build(&self) -> Result<Vec<u8>, String> {
        let node_count = self.nodes.len();

        let mut data = vec![0u8; DATA_SECTION_SEPARATOR];
        let mut record_offsets = Vec::with_capacity(self.records.len());
        for record in &self.records {
            record_offsets.push(data.len());
            data.extend_from_slice(&(record.len() as u16).to_be_bytes());
            data.extend_from_slice(record);
        }

        let encode = |slot: Slot| -> Result<u32, String> {
            let value = match slot {
                Slot::Empty => node_count,
                Slot::Node(child) => child,
                Slot::Record(id) => node_count + record_offsets[id],
            };
            u32::try_from(value).map_err(|_| "database too large".to_string())
        };

        let mut body = Vec::with_capacity(node_count * NODE_BYTES + data.len());
        for node in &self.nodes {
            for &slot in node {
                body.extend_from_slice(&encode(slot)?.to_be_bytes());
            }
        }
        body.extend_from_slice(&data);

        let meta = self.meta_json(node_count, body.len())?;
        let meta_len = u32::try_from(meta.len()).map_err(|_| "metadata too large".to_string())?;

        let mut out = Vec::with_capacity(META_LEN_SIZE + meta.len() + body.len());
        out.extend_from_slice(&meta_len.to_be_bytes());
        out.extend_from_slice(meta.as_bytes());
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Metadata JSON with languages in declaration order
    fn meta_json(&self, node_count: usize, total_size: usize) -> Result<String, String> {
        let mut languages = Vec::with_capacity(self.languages.len());
        for (name, offset) in &self.languages {
            let key = serde_json::to_string(name).map_err(|e| e.to_string())?;
            languages.push(format!("{}:{}", key, offset));
        }
        let fields = serde_json::to_string(&self.fields).map_err(|e| e.to_string())?;

        Ok(format!(
            r#"{{"build":{},"ip_version":{},"languages":{{{}}},"node_count":{},"total_size":{},"fields":{}}}"#,
            self.build,
            self.ip_version,
            languages.join(","),
            node_count,
            total_size,
            fields
        ))
    }

    fn intern(&mut self, record: &[u8]) -> usize {
        if let Some(&id) = self.record_index.get(record) {
            return id;
        }
        let id = self.records.len();
        self.records.push(record.to_vec());
        self.record_index.insert(record.to_vec(), id);
        id
    }

    fn push_node(&mut self, parent: usize, side: usize, slots: [Slot; 2]) -> usize {
        let id = self.nodes.len();
        self.nodes.push(slots);
        self.nodes[parent][side] = Slot::Node(id);
        id
    }

    fn fill_empty(&mut self, node: usize, record_id: usize) {
        for side in 0..2 {
            let slot = self.nodes[node][side];
            match slot {
                Slot::Empty => self.nodes[node][side] = Slot::Record(record_id),
                Slot::Node(child) => self.fill_empty(child, record_id),
                Slot::Record(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipdb::IpdbHeader;

    #[test]
    fn test_build_parses() {
        let mut builder = FixtureBuilder::new(&["country_name", "city_name"])
            .language("EN", 0)
            .language("CN", 2)
            .build_time(1_700_000_000);
        builder
            .insert("1.0.0.0".parse().unwrap(), 8, "AU\tSydney\t澳大利亚\t悉尼")
            .unwrap();

        let bytes = builder.build().unwrap();
        let (header, meta) = IpdbHeader::from_file(&bytes).unwrap();
        assert_eq!(header.node_count as usize, builder.nodes.len());
        assert_eq!(meta.build, 1_700_000_000);
        assert_eq!(meta.language_names().collect::<Vec<_>>(), vec!["EN", "CN"]);
    }

    #[test]
    fn test_identical_records_are_shared() {
        let mut builder = FixtureBuilder::new(&["a"]).language("EN", 0);
        builder.insert("1.0.0.0".parse().unwrap(), 8, "x").unwrap();
        builder.insert("2.0.0.0".parse().unwrap(), 8, "x").unwrap();
        assert_eq!(builder.records.len(), 1);
    }

    #[test]
    fn test_invalid_prefixes() {
        let mut builder = FixtureBuilder::new(&["a"]);
        assert!(builder.insert("1.0.0.0".parse().unwrap(), 33, "x").is_err());
        assert!(builder.insert("::".parse().unwrap(), 0, "x").is_err());
        assert!(builder.insert("::".parse().unwrap(), 129, "x").is_err());
    }
}

//! IPDB Search Tree Traversal
//!
//! Each node holds two big-endian u32 records, left for a 0 bit and right for
//! a 1 bit. A record points to either:
//! - Another node (value < node_count)
//! - Nothing (value == node_count)
//! - A record in the data section (value > node_count)

use super::types::{
    IpdbError, IPV4_SUBTREE_DEPTH, IPV4_ZERO_BITS, NODE_BYTES, RECORD_LEN_SIZE,
};
use zerocopy::byteorder::big_endian::{U16, U32};
use zerocopy::FromBytes;

/// Search tree over the body of an IPDB file (nodes followed by records)
pub struct SearchTree<'a> {
    body: &'a [u8],
    node_count: u32,
}

impl<'a> SearchTree<'a> {
    /// Create a tree over `body`, which starts at the first node
    pub fn new(body: &'a [u8], node_count: u32) -> Self {
        Self { body, node_count }
    }

    /// Number of nodes in the tree
    pub fn node_count(&self) -> u32 {
        self.node_count
    }

    /// Find the node where IPv4 addresses start
    ///
    /// Walks 80 zero bits then 16 one bits, stopping early if the path leaves
    /// the tree.
    pub fn ipv4_start(&self) -> Result<u32, IpdbError> {
        let mut node = 0u32;
        for depth in 0..IPV4_SUBTREE_DEPTH {
            if node >= self.node_count {
                break;
            }
            let side = u8::from(depth >= IPV4_ZERO_BITS);
            node = self.read_node(node, side)?;
        }
        Ok(node)
    }

    /// Walk `bit_len` bits of `bits` starting at `start`
    ///
    /// Returns the data pointer reached, or `DataNotExists` when the walk ends
    /// on an empty record or runs out of bits inside the tree.
    pub fn search(&self, start: u32, bits: &[u8], bit_len: u32) -> Result<u32, IpdbError> {
        let mut node = start;
        for i in 0..bit_len as usize {
            if node >= self.node_count {
                break;
            }
            let byte = *bits.get(i >> 3).ok_or(IpdbError::NoSupportBits(bit_len))?;
            let side = (byte >> (7 - (i % 8))) & 1;
            node = self.read_node(node, side)?;
        }

        if node > self.node_count {
            Ok(node)
        } else {
            Err(IpdbError::DataNotExists)
        }
    }

    /// Return the record bytes a data pointer refers to
    pub fn resolve(&self, node: u32) -> Result<&'a [u8], IpdbError> {
        let relative = node.checked_sub(self.node_count).ok_or_else(|| {
            IpdbError::DatabaseError(format!("node {} is not a data pointer", node))
        })?;
        let offset = relative as usize + self.node_count as usize * NODE_BYTES;

        let len_bytes = self
            .body
            .get(offset..offset + RECORD_LEN_SIZE)
            .ok_or_else(|| {
                IpdbError::DatabaseError(format!(
                    "record offset {} exceeds database size {}",
                    offset,
                    self.body.len()
                ))
            })?;
        let (len, _) = U16::read_from_prefix(len_bytes)
            .map_err(|_| IpdbError::DatabaseError("truncated record length".to_string()))?;

        let start = offset + RECORD_LEN_SIZE;
        let end = start + len.get() as usize;
        self.body.get(start..end).ok_or_else(|| {
            IpdbError::DatabaseError(format!(
                "record [{}, {}) exceeds database size {}",
                start,
                end,
                self.body.len()
            ))
        })
    }

    /// Read one side of a node
    fn read_node(&self, node: u32, side: u8) -> Result<u32, IpdbError> {
        let offset = node as usize * NODE_BYTES + side as usize * 4;
        let bytes = self.body.get(offset..offset + 4).ok_or_else(|| {
            IpdbError::DatabaseError(format!(
                "node {} exceeds node count {}",
                node, self.node_count
            ))
        })?;
        let (value, _) = U32::read_from_prefix(bytes)
            .map_err(|_| IpdbError::DatabaseError("truncated node".to_string()))?;
        Ok(value.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One node: left side is empty, right side points at a record
    fn single_node_body() -> Vec<u8> {
        let node_count = 1u32;
        let mut body = Vec::new();
        body.extend_from_slice(&node_count.to_be_bytes());
        // Data section starts right after the node; record at relative offset 4
        body.extend_from_slice(&(node_count + 4).to_be_bytes());
        body.extend_from_slice(&[0, 0, 0, 0]);
        body.extend_from_slice(&5u16.to_be_bytes());
        body.extend_from_slice(b"CN\tBJ");
        body
    }

    #[test]
    fn test_search_and_resolve() {
        let body = single_node_body();
        let tree = SearchTree::new(&body, 1);

        let node = tree.search(0, &[0x80], 1).unwrap();
        assert_eq!(node, 5);
        assert_eq!(tree.resolve(node).unwrap(), b"CN\tBJ");
    }

    #[test]
    fn test_empty_side_is_not_found() {
        let body = single_node_body();
        let tree = SearchTree::new(&body, 1);
        assert!(matches!(
            tree.search(0, &[0x00], 1),
            Err(IpdbError::DataNotExists)
        ));
    }

    #[test]
    fn test_short_bit_string() {
        let body = single_node_body();
        let tree = SearchTree::new(&body, 1);
        assert!(matches!(
            tree.search(0, &[], 8),
            Err(IpdbError::NoSupportBits(8))
        ));
    }

    #[test]
    fn test_resolve_out_of_bounds() {
        let body = single_node_body();
        let tree = SearchTree::new(&body, 1);
        assert!(matches!(
            tree.resolve(1000),
            Err(IpdbError::DatabaseError(_))
        ));
        assert!(matches!(tree.resolve(0), Err(IpdbError::DatabaseError(_))));
    }

    #[test]
    fn test_truncated_record() {
        let mut body = single_node_body();
        body.truncate(body.len() - 2);
        let tree = SearchTree::new(&body, 1);
        assert!(matches!(tree.resolve(5), Err(IpdbError::DatabaseError(_))));
    }

    #[test]
    fn test_node_past_tree() {
        // node_count claims two nodes but body only holds one
        let body = 2u32.to_be_bytes().repeat(2);
        let tree = SearchTree::new(&body, 2);
        assert!(matches!(
            tree.search(1, &[0x00], 1),
            Err(IpdbError::DatabaseError(_))
        ));
    }

    #[test]
    fn test_ipv4_start_on_empty_tree() {
        let tree = SearchTree::new(&[], 0);
        assert_eq!(tree.ipv4_start().unwrap(), 0);
        assert!(matches!(
            tree.search(0, &[1, 2, 3, 4], 32),
            Err(IpdbError::DataNotExists)
        ));
    }
}

//! Lookup engine capability
//!
//! The engine maps an address bit string to an opaque node and resolves the node
//! to the raw tab-delimited record. The pipeline only ever talks to it through
//! [`LookupEngine`], so tests can substitute an in-memory engine and the IPDB
//! reader is just one implementation.

use crate::address::IpFamily;
use crate::metadata::DatabaseMetadata;
use std::fmt;
use std::sync::Arc;

/// Opaque node identifier produced by [`LookupEngine::lookup`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Raw delimited record for one address
///
/// Borrowed from the engine for the duration of a single resolution; never kept
/// across calls.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawRecord<'a>(&'a [u8]);

impl<'a> RawRecord<'a> {
    /// Wrap engine-owned record bytes
    pub fn new(bytes: &'a [u8]) -> Self {
        Self(bytes)
    }

    /// Record bytes, delimiters included
    pub fn as_bytes(&self) -> &'a [u8] {
        self.0
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for a zero-length record
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for RawRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawRecord({:?})", String::from_utf8_lossy(self.0))
    }
}

/// Address-to-record lookup engine
///
/// Implementations must be usable through a shared reference: the pipeline never
/// mutates the engine or its metadata.
pub trait LookupEngine {
    /// Engine-defined failure, passed through the pipeline verbatim
    type Error: std::error::Error + Send + Sync + 'static;

    /// Whether the loaded database covers `family`
    fn is_family_supported(&self, family: IpFamily) -> bool;

    /// Walk `bit_len` bits of `bits` (network order) and return the node reached
    fn lookup(&self, bits: &[u8], bit_len: u32) -> Result<NodeId, Self::Error>;

    /// Fetch the raw record a node points at
    fn resolve_node(&self, node: NodeId) -> Result<RawRecord<'_>, Self::Error>;

    /// Database metadata, fixed for the engine's lifetime
    fn metadata(&self) -> &DatabaseMetadata;
}

impl<E: LookupEngine + ?Sized> LookupEngine for &E {
    type Error = E::Error;

    fn is_family_supported(&self, family: IpFamily) -> bool {
        (**self).is_family_supported(family)
    }

    fn lookup(&self, bits: &[u8], bit_len: u32) -> Result<NodeId, Self::Error> {
        (**self).lookup(bits, bit_len)
    }

    fn resolve_node(&self, node: NodeId) -> Result<RawRecord<'_>, Self::Error> {
        (**self).resolve_node(node)
    }

    fn metadata(&self) -> &DatabaseMetadata {
        (**self).metadata()
    }
}

impl<E: LookupEngine + ?Sized> LookupEngine for Box<E> {
    type Error = E::Error;

    fn is_family_supported(&self, family: IpFamily) -> bool {
        (**self).is_family_supported(family)
    }

    fn lookup(&self, bits: &[u8], bit_len: u32) -> Result<NodeId, Self::Error> {
        (**self).lookup(bits, bit_len)
    }

    fn resolve_node(&self, node: NodeId) -> Result<RawRecord<'_>, Self::Error> {
        (**self).resolve_node(node)
    }

    fn metadata(&self) -> &DatabaseMetadata {
        (**self).metadata()
    }
}

impl<E: LookupEngine + ?Sized> LookupEngine for Arc<E> {
    type Error = E::Error;

    fn is_family_supported(&self, family: IpFamily) -> bool {
        (**self).is_family_supported(family)
    }

    fn lookup(&self, bits: &[u8], bit_len: u32) -> Result<NodeId, Self::Error> {
        (**self).lookup(bits, bit_len)
    }

    fn resolve_node(&self, node: NodeId) -> Result<RawRecord<'_>, Self::Error> {
        (**self).resolve_node(node)
    }

    fn metadata(&self) -> &DatabaseMetadata {
        (**self).metadata()
    }
}

//! IPDB database reader
//!
//! IPDB files pair a binary search tree over 128-bit addresses with a data
//! section of tab-delimited records, one field block per language.
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │  u32 (big-endian) metadata length    │
//! ├──────────────────────────────────────┤
//! │  JSON metadata                       │
//! ├──────────────────────────────────────┤
//! │  Nodes: node_count × [u32; 2]        │
//! ├──────────────────────────────────────┤
//! │  Records: u16 length + bytes         │
//! └──────────────────────────────────────┘
//! ```
//!
//! IPv4 addresses live under `::ffff:0:0/96`. A record value below `node_count`
//! is a child node, equal to it means "no data" and above it points into the
//! record section.
//!
//! ## Architecture
//!
//! - **types**: error type and constants
//! - **format**: header and metadata parsing
//! - **tree**: tree traversal and record resolution
//! - **reader**: [`IpdbReader`], the [`LookupEngine`](crate::LookupEngine) implementation
//! - **fixture**: small in-memory writer used by tests and benchmarks

pub mod format;
pub mod reader;
pub mod tree;
pub mod types;

#[doc(hidden)]
pub mod fixture;

pub use fixture::FixtureBuilder;
pub use format::IpdbHeader;
pub use reader::IpdbReader;
pub use types::IpdbError;

//! IPDB-specific type definitions

use thiserror::Error;

/// Size of the big-endian metadata length prefix
pub const META_LEN_SIZE: usize = 4;

/// Bytes per tree node (two big-endian u32 records)
pub const NODE_BYTES: usize = 8;

/// Bytes of the length prefix in front of each record
pub const RECORD_LEN_SIZE: usize = 2;

/// Tree depth at which IPv4 addresses start (`::ffff:0:0/96`)
pub const IPV4_SUBTREE_DEPTH: usize = 96;

/// Zero bits before the `ffff` run of the IPv4-mapped prefix
pub const IPV4_ZERO_BITS: usize = 80;

/// IPDB errors
#[derive(Error, Debug)]
pub enum IpdbError {
    /// Failed to open or map the file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File length disagrees with the header
    #[error("file size mismatch: {0}")]
    FileSize(String),

    /// Metadata missing, unparseable or inconsistent
    #[error("invalid metadata: {0}")]
    Metadata(String),

    /// Lookup bit length is neither 32 nor 128
    #[error("unsupported lookup bit length: {0}")]
    NoSupportBits(u32),

    /// The address has no record
    #[error("data not exists")]
    DataNotExists,

    /// Tree or record section points outside the file
    #[error("database error: {0}")]
    DatabaseError(String),
}

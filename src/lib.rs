//! ipdb-field - Geolocation Field Decoding for IPDB Databases
//!
//! Resolves a client address against an IPDB database and returns one field of
//! one language block of the matching record. Records are tab-delimited byte
//! strings holding every language back to back; the database metadata says
//! where each language's block starts and how many fields it holds.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ipdb_field::{Field, GeoConfig, GeoDatabase, Language};
//! use std::net::Ipv4Addr;
//!
//! let config = GeoConfig::new("/var/lib/ipdb/city.ipdb").with_language(Language::Cn);
//! let db = GeoDatabase::open(&config)?;
//!
//! let city = db.field(Ipv4Addr::new(36, 102, 4, 81), Field::CityName)?;
//! println!("{}", city);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Pipeline
//!
//! ```text
//! language ──► locate ──► (start_field, field_count)
//!                                  │
//! address ──► dispatch ──► lookup ──► resolve_node ──► extract_range ──► field_at
//!             (family check)  (engine)   (raw record)    (block)           (field)
//! ```
//!
//! The decoding stages are independent of the storage format: anything that
//! implements [`LookupEngine`] can be queried with [`get_field`]. [`IpdbReader`]
//! is the engine for IPDB files.
//!
//! Failures are terminal and reported as [`FieldError`]; there are no partial
//! results.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod address;
pub mod c_api;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod file_reader;
pub mod geo;
pub mod ipdb;
pub mod locator;
pub mod logging;
pub mod lookup;
pub mod metadata;
pub mod resolver;
pub mod scanner;

pub use crate::address::{ClientAddress, IpFamily};
pub use crate::config::{ConfigError, GeoConfig, Language};
pub use crate::engine::{LookupEngine, NodeId, RawRecord};
pub use crate::error::{FieldError, Result};
pub use crate::extract::{field_at, ExtractedField};
pub use crate::geo::{Field, GeoDatabase};
pub use crate::ipdb::{IpdbError, IpdbReader};
pub use crate::locator::{locate, FieldLocator};
pub use crate::lookup::{get_block, get_field};
pub use crate::metadata::DatabaseMetadata;
pub use crate::resolver::RecordResolver;
pub use crate::scanner::extract_range;

/// Library version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! C API
//!
//! A stable C ABI over [`GeoDatabase`](crate::GeoDatabase) for servers written
//! in C. The generated header lives at `include/ipdb_field/ipdb_field.h`.

pub mod ipdb_field;

pub use ipdb_field::*;

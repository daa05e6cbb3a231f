//! Composed field resolution
//!
//! Chains language location, record resolution, range extraction and field
//! selection. Any failure ends the request; there are no partial results.

use crate::address::ClientAddress;
use crate::engine::LookupEngine;
use crate::error::Result;
use crate::extract::{field_at, ExtractedField};
use crate::resolver::RecordResolver;
use crate::scanner::extract_range;

/// Resolve `address` and return field `field_index` of the `language` block
///
/// # Example
///
/// ```no_run
/// use ipdb_field::{get_field, ClientAddress, IpdbReader};
/// use std::net::Ipv4Addr;
///
/// let reader = IpdbReader::open("city.ipdb")?;
/// let addr = ClientAddress::from(Ipv4Addr::new(36, 102, 4, 81));
/// let city = get_field(&reader, &addr, "EN", 2)?;
/// println!("{}", city);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn get_field<E>(
    engine: &E,
    address: &ClientAddress,
    language: &str,
    field_index: usize,
) -> Result<ExtractedField>
where
    E: LookupEngine + ?Sized,
{
    with_block(engine, address, language, |block| {
        let field = field_at(block, field_index)?;
        tracing::debug!(
            field_index,
            value = %String::from_utf8_lossy(field),
            "extracted field"
        );
        Ok(ExtractedField::new(field))
    })
}

/// Resolve `address` and return the whole `language` block, delimiters included
pub fn get_block<E>(engine: &E, address: &ClientAddress, language: &str) -> Result<ExtractedField>
where
    E: LookupEngine + ?Sized,
{
    with_block(engine, address, language, |block| Ok(ExtractedField::new(block)))
}

fn with_block<E, T, F>(engine: &E, address: &ClientAddress, language: &str, f: F) -> Result<T>
where
    E: LookupEngine + ?Sized,
    F: FnOnce(&[u8]) -> Result<T>,
{
    // Metadata check first: an unknown language never costs a tree walk
    let locator = engine.metadata().locate(language)?;
    let record = RecordResolver::new(engine).resolve(address)?;
    let block = extract_range(record.as_bytes(), locator.start_field, locator.field_count)?;

    tracing::debug!(
        language,
        block = %String::from_utf8_lossy(block),
        "extracted language block"
    );
    f(block)
}

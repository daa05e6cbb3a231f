//! Named geolocation fields over an opened database
//!
//! [`GeoDatabase`] pairs a shared [`IpdbReader`] with the configured language
//! and exposes the conventional IPDB city fields by name. Each lookup is
//! independent; the handle is cheap to clone and safe to share across threads.

use crate::address::ClientAddress;
use crate::config::{GeoConfig, Language};
use crate::engine::LookupEngine;
use crate::error::{FieldError, Result};
use crate::extract::{split_fields, ExtractedField};
use crate::ipdb::{IpdbError, IpdbReader};
use crate::lookup::{get_block, get_field};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Conventional field positions inside an IPDB city language block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Country name
    CountryName,
    /// Region or province name
    RegionName,
    /// City name
    CityName,
    /// Owner domain
    OwnerDomain,
    /// ISP domain
    IspDomain,
    /// Latitude
    Latitude,
    /// Longitude
    Longitude,
}

impl Field {
    /// All fields in block order
    pub const ALL: [Field; 7] = [
        Field::CountryName,
        Field::RegionName,
        Field::CityName,
        Field::OwnerDomain,
        Field::IspDomain,
        Field::Latitude,
        Field::Longitude,
    ];

    /// Zero-based position inside the language block
    pub fn index(self) -> usize {
        match self {
            Field::CountryName => 0,
            Field::RegionName => 1,
            Field::CityName => 2,
            Field::OwnerDomain => 3,
            Field::IspDomain => 4,
            Field::Latitude => 5,
            Field::Longitude => 6,
        }
    }

    /// Field name as used in IPDB metadata
    pub fn name(self) -> &'static str {
        match self {
            Field::CountryName => "country_name",
            Field::RegionName => "region_name",
            Field::CityName => "city_name",
            Field::OwnerDomain => "owner_domain",
            Field::IspDomain => "isp_domain",
            Field::Latitude => "latitude",
            Field::Longitude => "longitude",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Field::ALL
            .iter()
            .copied()
            .find(|field| field.name() == s)
            .ok_or_else(|| {
                let known: Vec<_> = Field::ALL.iter().map(|f| f.name()).collect();
                format!("unknown field {:?} (expected one of {})", s, known.join(", "))
            })
    }
}

/// Shared database handle with a fixed language
#[derive(Clone)]
pub struct GeoDatabase {
    reader: Arc<IpdbReader>,
    language: Language,
}

impl GeoDatabase {
    /// Open the database a configuration names
    pub fn open(config: &GeoConfig) -> std::result::Result<Self, IpdbError> {
        let reader = IpdbReader::open(&config.database)?;
        if !reader
            .metadata()
            .language_names()
            .any(|name| name == config.language.as_str())
        {
            tracing::warn!(
                database = %config.database.display(),
                language = %config.language,
                "configured language is not declared by the database"
            );
        }
        Ok(Self::new(reader, config.language))
    }

    /// Wrap an already opened reader
    pub fn new(reader: IpdbReader, language: Language) -> Self {
        Self::from_shared(Arc::new(reader), language)
    }

    /// Share a reader with other handles
    pub fn from_shared(reader: Arc<IpdbReader>, language: Language) -> Self {
        Self { reader, language }
    }

    /// The same database read in another language
    pub fn with_language(&self, language: Language) -> Self {
        Self::from_shared(Arc::clone(&self.reader), language)
    }

    /// Configured language
    pub fn language(&self) -> Language {
        self.language
    }

    /// Underlying reader
    pub fn reader(&self) -> &IpdbReader {
        &self.reader
    }

    /// Field at `index` of the configured block
    pub fn field_at<A: Into<ClientAddress>>(&self, address: A, index: usize) -> Result<ExtractedField> {
        get_field(&*self.reader, &address.into(), self.language.as_str(), index)
    }

    /// Named field of the configured block
    pub fn field<A: Into<ClientAddress>>(&self, address: A, field: Field) -> Result<ExtractedField> {
        self.field_at(address, field.index())
    }

    /// Named field, or `None` when the lookup fails for any reason
    ///
    /// Failures are logged at debug level; a host variable that cannot be
    /// resolved is simply absent.
    pub fn get<A: Into<ClientAddress>>(&self, address: A, field: Field) -> Option<ExtractedField> {
        let address = address.into();
        match self.field_at(address, field.index()) {
            Ok(value) => Some(value),
            Err(err) => {
                log_not_found(&address, field.name(), &err);
                None
            }
        }
    }

    /// Every field of the configured block paired with its name
    ///
    /// Names come from the database metadata; positions past the declared names
    /// are called `field_N`.
    pub fn fields<A: Into<ClientAddress>>(&self, address: A) -> Result<Vec<(String, ExtractedField)>> {
        let block = get_block(&*self.reader, &address.into(), self.language.as_str())?;
        let names = &self.reader.metadata().field_names;

        Ok(split_fields(block.as_bytes())
            .enumerate()
            .map(|(i, value)| {
                let name = names
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("field_{}", i));
                (name, ExtractedField::new(value))
            })
            .collect())
    }
}

impl fmt::Debug for GeoDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeoDatabase")
            .field("language", &self.language)
            .field("reader", &self.reader)
            .finish()
    }
}

fn log_not_found(address: &ClientAddress, field: &str, err: &FieldError) {
    tracing::debug!(address = ?address, field, error = %err, "field not found");
}

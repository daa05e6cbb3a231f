use anyhow::{bail, Context, Result};
use clap::Args;
use ipdb_field::{Field, FieldError, GeoConfig, GeoDatabase, IpdbError, Language};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Database selection shared by all commands
#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// IPDB database file (overrides the configuration file)
    #[arg(short, long, value_name = "FILE")]
    pub database: Option<PathBuf>,

    /// Language block: EN or CN (overrides the configuration file)
    #[arg(short, long)]
    pub language: Option<Language>,
}

/// A field given by name or by position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSelector {
    Named(Field),
    Index(usize),
}

impl FieldSelector {
    pub fn index(self) -> usize {
        match self {
            FieldSelector::Named(field) => field.index(),
            FieldSelector::Index(index) => index,
        }
    }

    /// Display name, using the database's field names for bare indices
    pub fn label(self, db: &GeoDatabase) -> String {
        use ipdb_field::LookupEngine;
        match self {
            FieldSelector::Named(field) => field.name().to_string(),
            FieldSelector::Index(index) => db
                .reader()
                .metadata()
                .field_names
                .get(index)
                .cloned()
                .unwrap_or_else(|| format!("field_{}", index)),
        }
    }
}

impl FromStr for FieldSelector {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.parse::<usize>() {
            Ok(index) => Ok(FieldSelector::Index(index)),
            Err(_) => s.parse::<Field>().map(FieldSelector::Named),
        }
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldSelector::Named(field) => write!(f, "{}", field),
            FieldSelector::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Merge the configuration file with command-line overrides
pub fn resolve_config(config: Option<&Path>, args: &DatabaseArgs) -> Result<GeoConfig> {
    let loaded = match config {
        Some(path) => Some(
            GeoConfig::load(path)
                .with_context(|| format!("Failed to load configuration: {}", path.display()))?,
        ),
        None => None,
    };

    let database = match (&args.database, &loaded) {
        (Some(path), _) => path.clone(),
        (None, Some(config)) => config.database.clone(),
        (None, None) => bail!("No database given: pass --database or --config"),
    };
    let language = args
        .language
        .or(loaded.map(|config| config.language))
        .unwrap_or_default();

    Ok(GeoConfig::new(database).with_language(language))
}

/// Open the database the configuration and flags select
pub fn open_database(config: Option<&Path>, args: &DatabaseArgs) -> Result<(GeoConfig, GeoDatabase)> {
    let config = resolve_config(config, args)?;
    let db = GeoDatabase::open(&config)
        .with_context(|| format!("Failed to load database: {}", config.database.display()))?;
    Ok((config, db))
}

/// Whether a lookup failed only because the address has no record
pub fn is_not_found(err: &FieldError) -> bool {
    matches!(err.engine_error::<IpdbError>(), Some(IpdbError::DataNotExists))
}

pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

pub fn format_bytes(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Format seconds since the epoch as a UTC date and time
pub fn format_unix_timestamp(timestamp: u64) -> String {
    let days = timestamp / 86400;
    let secs = timestamp % 86400;
    let (year, month, day) = days_to_ymd(days);

    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02} UTC",
        year,
        month,
        day,
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

fn days_to_ymd(mut days: u64) -> (u64, u64, u64) {
    let mut year = 1970;
    loop {
        let year_days = if is_leap_year(year) { 366 } else { 365 };
        if days < year_days {
            break;
        }
        days -= year_days;
        year += 1;
    }

    let month_days = [
        31,
        if is_leap_year(year) { 29 } else { 28 },
        31,
        30,
        31,
        30,
        31,
        31,
        30,
        31,
        30,
        31,
    ];
    let mut month = 1;
    for len in month_days {
        if days < len {
            break;
        }
        days -= len;
        month += 1;
    }
    (year, month, days + 1)
}

fn is_leap_year(year: u64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_selector() {
        assert_eq!(
            "city_name".parse::<FieldSelector>().unwrap(),
            FieldSelector::Named(Field::CityName)
        );
        assert_eq!("4".parse::<FieldSelector>().unwrap(), FieldSelector::Index(4));
        assert_eq!("4".parse::<FieldSelector>().unwrap().index(), 4);
        assert!("zip".parse::<FieldSelector>().is_err());
    }

    #[test]
    fn test_resolve_config_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geo.json");
        std::fs::write(&path, r#"{"database": "/srv/a.ipdb", "language": "CN"}"#).unwrap();

        let args = DatabaseArgs {
            database: None,
            language: Some(Language::En),
        };
        let config = resolve_config(Some(&path), &args).unwrap();
        assert_eq!(config.database, PathBuf::from("/srv/a.ipdb"));
        assert_eq!(config.language, Language::En);

        let args = DatabaseArgs {
            database: None,
            language: None,
        };
        assert!(resolve_config(None, &args).is_err());
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_unix_timestamp(0), "1970-01-01 00:00:00 UTC");
        assert_eq!(format_unix_timestamp(1_535_696_240), "2018-08-31 06:17:20 UTC");
        assert_eq!(format_unix_timestamp(951_782_400), "2000-02-29 00:00:00 UTC");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(1234567), "1,234,567");
    }
}

//! Configuration for the geolocation host layer
//!
//! A configuration names the database file and the language block every lookup
//! reads from. Both are fixed at load time; a language the host does not know
//! is rejected here rather than at request time.
//!
//! ```json
//! { "database": "/var/lib/ipdb/city.ipdb", "language": "CN" }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid JSON or has unknown keys
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// Only EN and CN blocks can be selected
    #[error("unsupported language {0:?} (expected EN or CN)")]
    UnsupportedLanguage(String),
}

/// Language block selected by the host
///
/// The decoder itself accepts any language the database declares; the host
/// only ever asks for these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Language {
    /// English block
    #[default]
    En,
    /// Chinese block
    Cn,
}

impl Language {
    /// Name as declared in IPDB metadata
    pub fn as_str(self) -> &'static str {
        match self {
            Language::En => "EN",
            Language::Cn => "CN",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EN" => Ok(Language::En),
            "CN" => Ok(Language::Cn),
            other => Err(ConfigError::UnsupportedLanguage(other.to_string())),
        }
    }
}

impl TryFrom<String> for Language {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Language> for String {
    fn from(language: Language) -> Self {
        language.as_str().to_string()
    }
}

/// Host configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeoConfig {
    /// Path of the IPDB file
    pub database: PathBuf,
    /// Language block used for every lookup
    #[serde(default)]
    pub language: Language,
}

impl GeoConfig {
    /// Configuration for `database` with the default language
    pub fn new<P: Into<PathBuf>>(database: P) -> Self {
        Self {
            database: database.into(),
            language: Language::default(),
        }
    }

    /// Replace the language
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Load a JSON configuration file
    ///
    /// A relative `database` path is taken relative to the configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::from_json_str(&text)?;
        if config.database.is_relative() {
            if let Some(dir) = path.parent() {
                config.database = dir.join(&config.database);
            }
        }
        tracing::debug!(
            config = %path.display(),
            database = %config.database.display(),
            language = %config.language,
            "loaded configuration"
        );
        Ok(config)
    }

    /// Parse configuration from a JSON string
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_language_parse() {
        assert_eq!("EN".parse::<Language>().unwrap(), Language::En);
        assert_eq!("CN".parse::<Language>().unwrap(), Language::Cn);
        assert!(matches!(
            "FR".parse::<Language>(),
            Err(ConfigError::UnsupportedLanguage(ref l)) if l == "FR"
        ));
        // Names are exact, as in the metadata
        assert!("en".parse::<Language>().is_err());
    }

    #[test]
    fn test_default_language() {
        let config = GeoConfig::from_json_str(r#"{"database": "a.ipdb"}"#).unwrap();
        assert_eq!(config.language, Language::En);
        assert_eq!(config.database, PathBuf::from("a.ipdb"));
    }

    #[test]
    fn test_rejects_unknown_language() {
        let err = GeoConfig::from_json_str(r#"{"database": "a.ipdb", "language": "JP"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("JP"));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        assert!(GeoConfig::from_json_str(r#"{"database": "a.ipdb", "cache": 10}"#).is_err());
    }

    #[test]
    fn test_serialize_language() {
        let config = GeoConfig::new("x.ipdb").with_language(Language::Cn);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["language"], "CN");
    }

    #[test]
    fn test_load_relative_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geo.json");
        std::fs::write(&path, r#"{"database": "city.ipdb", "language": "CN"}"#).unwrap();

        let config = GeoConfig::load(&path).unwrap();
        assert_eq!(config.database, dir.path().join("city.ipdb"));
        assert_eq!(config.language, Language::Cn);
    }

    #[test]
    fn test_load_absolute_database() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"database": "/srv/city.ipdb"}}"#).unwrap();
        file.flush().unwrap();

        let config = GeoConfig::load(file.path()).unwrap();
        assert_eq!(config.database, PathBuf::from("/srv/city.ipdb"));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            GeoConfig::load("/nonexistent/geo.json"),
            Err(ConfigError::Io { .. })
        ));
    }
}

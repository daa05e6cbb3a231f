//! Database metadata
//!
//! Describes how a raw record is laid out: each language owns a contiguous block
//! of `fields_per_language_block` fields starting at its field offset.

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// IP version bit for IPv4 support
pub const IP_VERSION_V4: u16 = 0x01;
/// IP version bit for IPv6 support
pub const IP_VERSION_V6: u16 = 0x02;

/// One language's position within a raw record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageBlock {
    /// Language code as declared by the database (e.g. "EN")
    pub name: String,
    /// Index of the language's first field, in fields (not bytes)
    pub field_offset: usize,
}

/// Layout metadata shared by every record in a database
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseMetadata {
    /// Fields allocated to each language block
    pub fields_per_language_block: usize,
    /// Languages in declaration order
    pub languages: Vec<LanguageBlock>,
    /// Names of the fields within a block, when the database declares them
    pub field_names: Vec<String>,
    /// Build time (unix epoch seconds), 0 if unknown
    pub build: u64,
    /// Supported IP versions as a bit set of `IP_VERSION_*`
    pub ip_version: u16,
}

impl DatabaseMetadata {
    /// Build metadata from a block size and `(language, field_offset)` pairs
    pub fn new<I, S>(fields_per_language_block: usize, languages: I) -> Self
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        Self {
            fields_per_language_block,
            languages: languages
                .into_iter()
                .map(|(name, field_offset)| LanguageBlock {
                    name: name.into(),
                    field_offset,
                })
                .collect(),
            field_names: Vec::new(),
            build: 0,
            ip_version: IP_VERSION_V4 | IP_VERSION_V6,
        }
    }

    /// Attach field names; also fixes the block size to their count
    pub fn with_field_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_names = names.into_iter().map(Into::into).collect();
        self.fields_per_language_block = self.field_names.len();
        self
    }

    /// Language codes in declaration order
    pub fn language_names(&self) -> impl Iterator<Item = &str> {
        self.languages.iter().map(|l| l.name.as_str())
    }

    /// Check structural invariants
    ///
    /// Language names must be distinct, blocks must be non-empty and the end of
    /// every block must be representable.
    pub fn validate(&self) -> Result<(), String> {
        if self.fields_per_language_block == 0 {
            return Err("language blocks declare no fields".to_string());
        }

        let mut seen = HashSet::new();
        for lang in &self.languages {
            if !seen.insert(lang.name.as_str()) {
                return Err(format!("language {:?} declared twice", lang.name));
            }
            if lang
                .field_offset
                .checked_add(self.fields_per_language_block)
                .is_none()
            {
                return Err(format!(
                    "language {:?} field offset {} overflows",
                    lang.name, lang.field_offset
                ));
            }
        }

        Ok(())
    }
}

/// Deserialize a JSON object of `name -> offset` keeping declaration order
pub(crate) fn deserialize_languages<'de, D>(deserializer: D) -> Result<Vec<LanguageBlock>, D::Error>
where
    D: Deserializer<'de>,
{
    struct LanguagesVisitor;

    impl<'de> Visitor<'de> for LanguagesVisitor {
        type Value = Vec<LanguageBlock>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of language name to field offset")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut languages = Vec::with_capacity(map.size_hint().unwrap_or(2));
            while let Some((name, field_offset)) = map.next_entry::<String, usize>()? {
                languages.push(LanguageBlock { name, field_offset });
            }
            Ok(languages)
        }
    }

    deserializer.deserialize_map(LanguagesVisitor)
}

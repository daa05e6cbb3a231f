//! Error types for field resolution
//!
//! Every stage of the pipeline fails with a [`FieldError`]. Engine failures are
//! carried through untouched so callers can inspect the engine's own error value.

use crate::address::IpFamily;
use thiserror::Error;

/// Result type alias for field resolution
pub type Result<T> = std::result::Result<T, FieldError>;

/// Terminal outcome of a failed field resolution
#[derive(Error, Debug)]
pub enum FieldError {
    /// The loaded database has no tree for this address family
    #[error("database does not support {0} addresses")]
    UnsupportedFamily(IpFamily),

    /// The address is neither IPv4 nor IPv6 (or IPv6 support is compiled out)
    #[error("invalid address format")]
    InvalidAddressFormat,

    /// The requested language is not declared in the database metadata
    #[error("database does not support language {0:?}")]
    UnsupportedLanguage(String),

    /// The record holds fewer fields than the metadata promises
    #[error("malformed record: need {required} fields, record has {available}")]
    MalformedRecord {
        /// Fields required to cover the language block
        required: usize,
        /// Fields actually present in the record
        available: usize,
    },

    /// The field index is past the end of the language block
    #[error("field index {index} out of range ({available} fields in block)")]
    FieldIndexOutOfRange {
        /// Requested zero-based field index
        index: usize,
        /// Fields present in the language block
        available: usize,
    },

    /// Error reported by the lookup engine, passed through unchanged
    #[error(transparent)]
    Engine(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl FieldError {
    /// Wrap an engine error without reinterpreting it
    pub fn engine<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        FieldError::Engine(Box::new(err))
    }

    /// Borrow the engine's error value if this is a pass-through failure of type `T`
    pub fn engine_error<T>(&self) -> Option<&T>
    where
        T: std::error::Error + 'static,
    {
        match self {
            FieldError::Engine(err) => err.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// True when the failure came from the engine rather than the pipeline
    pub fn is_engine_error(&self) -> bool {
        matches!(self, FieldError::Engine(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug, PartialEq)]
    struct Code(i32);

    impl fmt::Display for Code {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "engine code {}", self.0)
        }
    }

    impl std::error::Error for Code {}

    #[test]
    fn test_engine_error_round_trips() {
        let err = FieldError::engine(Code(7));
        assert!(err.is_engine_error());
        assert_eq!(err.engine_error::<Code>(), Some(&Code(7)));
        assert_eq!(err.to_string(), "engine code 7");
    }

    #[test]
    fn test_pipeline_errors_are_not_engine_errors() {
        let err = FieldError::UnsupportedLanguage("FR".to_string());
        assert!(!err.is_engine_error());
        assert!(err.engine_error::<Code>().is_none());
        assert_eq!(err.to_string(), "database does not support language \"FR\"");
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            FieldError::UnsupportedFamily(IpFamily::V6).to_string(),
            "database does not support IPv6 addresses"
        );
        assert_eq!(
            FieldError::MalformedRecord {
                required: 10,
                available: 6
            }
            .to_string(),
            "malformed record: need 10 fields, record has 6"
        );
    }
}

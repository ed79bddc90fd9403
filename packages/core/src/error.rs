//! Error types for the record layer.
//!
//! Every error is fatal to the call that raised it and is never retried
//! internally. Encoding always finishes in memory before the store is
//! written, so a failed call leaves no partial write behind. "Not found" is
//! not an error: lookups return `Option`.

use kvtables_kv_store::KvError;

use crate::path::PathError;
use crate::{TableKey, TableShape};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A schema, foreign mapping or resolver lookup is unusable, e.g. it names
    /// an unknown table key.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// A record's variant disagrees with its table's declared shape.
    #[error("table '{table}' is declared {declared} but the record passed is {actual}")]
    StructureMismatch {
        table: TableKey,
        declared: TableShape,
        actual: TableShape,
    },

    /// A new unstructured value already exists in the table.
    #[error("an unstructured record with the same value {value} already exists in table '{table}'")]
    DuplicateValue { table: TableKey, value: String },

    /// An embedded foreign value cannot be turned into an id.
    #[error("malformed reference at '{path}' into table '{table}': {message}")]
    MalformedReference {
        table: TableKey,
        path: String,
        message: String,
    },

    /// The reserved id was requested explicitly.
    #[error("protocol error: {message}")]
    Protocol { message: String },

    /// A stored payload could not be parsed.
    #[error("decode error: {message}")]
    Decode { message: String },

    /// A value could not be serialized.
    #[error("encode error: {message}")]
    Encode { message: String },

    /// The persisted id counter is missing after initialization or unparseable.
    #[error("id counter '{key}' is corrupt: {message}")]
    CorruptCounter { key: String, message: String },

    /// Error from the backing store.
    #[error("store error: {0}")]
    Store(#[from] KvError),
}

impl Error {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }
}

impl From<PathError> for Error {
    fn from(e: PathError) -> Self {
        Error::configuration(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn structure_mismatch_display() {
        let e = Error::StructureMismatch {
            table: TableKey::new("tags"),
            declared: TableShape::Unstructured,
            actual: TableShape::Structured,
        };
        assert_eq!(
            format!("{}", e),
            "table 'tags' is declared unstructured but the record passed is structured"
        );
    }

    #[test]
    fn path_error_is_configuration() {
        let e: Error = PathError::InvalidPath {
            message: "empty path".to_string(),
        }
        .into();
        assert!(matches!(e, Error::Configuration { .. }));
        assert!(format!("{}", e).contains("empty path"));
    }

    #[test]
    fn store_error_source() {
        let e: Error = KvError::Io(std::io::Error::other("disk gone")).into();
        assert!(matches!(e, Error::Store(_)));
        assert!(StdError::source(&e).is_some());
    }
}

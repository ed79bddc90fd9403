//! Error types for the KV layer.
//!
//! Errors at this level are transport-focused. Nothing here knows about
//! records, tables or identifiers - those failures belong in higher layers.

use std::io;
use std::path::PathBuf;

/// Errors raised by a [`KvStore`](crate::KvStore) implementation.
#[derive(thiserror::Error, Debug)]
pub enum KvError {
    /// Generic I/O or transport failure.
    #[error("transport error: {0}")]
    Io(#[from] io::Error),

    /// The key cannot be represented by this store.
    #[error("invalid key '{key}': {message}")]
    InvalidKey { key: String, message: String },

    /// The root location of a store is missing or unusable.
    #[error("store root {} is invalid: {source}", path.display())]
    RootPathInvalid {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl KvError {
    pub(crate) fn invalid_key(key: &str, message: impl Into<String>) -> Self {
        KvError::InvalidKey {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

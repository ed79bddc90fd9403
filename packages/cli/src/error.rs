use std::path::PathBuf;

use thiserror::Error;

use kvtables_core::PathError;
use kvtables_kv_store::KvError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Database(#[from] kvtables_core::Error),

    #[error("cannot open data directory: {0}")]
    Store(#[from] KvError),

    #[error("invalid field path: {0}")]
    Path(#[from] PathError),

    #[error("cannot read schema file '{}': {source}", path.display())]
    SchemaFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON '{input}': {source}")]
    InvalidJson {
        input: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no data directory given and no platform default is available; pass --data-dir")]
    NoDataDir,

    #[error("{0}")]
    Usage(String),
}

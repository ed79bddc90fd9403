//! Where the CLI finds its schema and data.

use std::fs::File;
use std::path::{Path, PathBuf};

use kvtables_core::{Database, DatabaseSchema};
use kvtables_kv_store::LocalDiskKvStore;

use crate::error::CliError;

/// `<platform data dir>/kvtables`, e.g. `~/.local/share/kvtables` on Linux.
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("kvtables"))
}

pub fn load_schema(path: &Path) -> Result<DatabaseSchema, CliError> {
    let file = File::open(path).map_err(|source| CliError::SchemaFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(DatabaseSchema::from_reader(file)?)
}

/// Open (creating if needed) the data directory and wire the schema over it.
pub fn open_database(
    data_dir: &Path,
    schema_path: &Path,
) -> Result<Database<LocalDiskKvStore>, CliError> {
    let schema = load_schema(schema_path)?;
    let store = LocalDiskKvStore::open_or_create(data_dir)?;
    log::info!(
        "Using data directory {} with schema {}",
        store.root().display(),
        schema_path.display()
    );
    Ok(Database::open(&schema, store)?)
}

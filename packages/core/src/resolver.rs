//! Cross-table lookup.

use std::collections::BTreeMap;

use kvtables_kv_store::KvStore;

use crate::{Error, RecordId, Table, TableKey};

/// Looks up an already constructed table by its key.
///
/// Tables refer to each other by key rather than by handle, so every table of
/// a schema can be built before any cross-table link is followed.
pub trait TableResolver {
    /// Fails with [`Error::Configuration`] for unknown keys.
    fn resolve(&self, key: &TableKey) -> Result<&Table, Error>;
}

/// What every table operation runs against: the shared store and the
/// resolver for foreign tables.
///
/// It also remembers which records are being decoded right now, so that
/// foreign-key expansion stops at reference cycles.
pub struct TableContext<'a> {
    pub store: &'a mut dyn KvStore,
    pub resolver: &'a dyn TableResolver,
    expanding: Vec<(TableKey, RecordId)>,
}

impl<'a> TableContext<'a> {
    pub fn new(store: &'a mut dyn KvStore, resolver: &'a dyn TableResolver) -> Self {
        Self {
            store,
            resolver,
            expanding: Vec::new(),
        }
    }

    pub(crate) fn is_expanding(&self, table: &TableKey, id: RecordId) -> bool {
        self.expanding
            .iter()
            .any(|(key, expanding)| key == table && *expanding == id)
    }

    /// Run `decode` with `(table, id)` marked as being expanded.
    pub(crate) fn expanding<T>(
        &mut self,
        table: &TableKey,
        id: RecordId,
        decode: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        self.expanding.push((table.clone(), id));
        let result = decode(self);
        self.expanding.pop();
        result
    }
}

/// Tables keyed by [`TableKey`].
///
/// Registration enforces the key-space invariant: no table's `{key}_`
/// prefix may be a prefix of another's, or prefix scans would pick up the
/// other table's records.
#[derive(Debug, Default)]
pub struct TableRegistry {
    tables: BTreeMap<TableKey, Table>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, table: Table) -> Result<(), Error> {
        let key = table.key();
        if key.as_str().is_empty() {
            return Err(Error::configuration("table keys must not be empty"));
        }
        if self.tables.contains_key(key) {
            return Err(Error::configuration(format!(
                "table key '{}' is declared twice",
                key
            )));
        }
        let prefix = key.prefix();
        if let Some(clash) = self.tables.keys().find(|other| {
            let other_prefix = other.prefix();
            other_prefix.starts_with(&prefix) || prefix.starts_with(&other_prefix)
        }) {
            return Err(Error::configuration(format!(
                "table keys '{}' and '{}' overlap: one key prefix contains the other",
                key, clash
            )));
        }
        self.tables.insert(key.clone(), table);
        Ok(())
    }

    /// Check that every foreign mapping names a registered table.
    pub fn validate_links(&self) -> Result<(), Error> {
        for table in self.tables.values() {
            for mapping in table.foreign_keys() {
                if !self.tables.contains_key(&mapping.table) {
                    return Err(Error::configuration(format!(
                        "field '{}' of table '{}' references unknown table key '{}'",
                        mapping.path,
                        table.key(),
                        mapping.table
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, key: &TableKey) -> Option<&Table> {
        self.tables.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl TableResolver for TableRegistry {
    fn resolve(&self, key: &TableKey) -> Result<&Table, Error> {
        self.tables
            .get(key)
            .ok_or_else(|| Error::configuration(format!("table with key '{}' not found", key)))
    }
}

//! Schema-to-table wiring.

use std::collections::BTreeMap;

use kvtables_kv_store::KvStore;

use crate::{
    DatabaseSchema, Error, Record, RecordId, Table, TableContext, TableKey, TableRegistry,
};

/// Every table of a schema, cross-wired over one store.
///
/// Construction happens in two phases: all tables are built and registered
/// first, then foreign links are checked. Tables find each other through
/// the registry at call time, so declaration order never matters.
///
/// # Single writer
///
/// A database assumes it is the only writer of its store. Within a process
/// the `&mut` borrow behind [`Database::table`] serializes all access, but
/// two processes (or two `Database` values over clones of one backing
/// location) can race on the id counter and on the unstructured duplicate
/// check. Nothing here locks or retries.
///
/// # Example
///
/// ```rust
/// use kvtables_core::{Database, DatabaseSchema, Record, TableSchema};
/// use kvtables_kv_store::InMemoryKvStore;
///
/// let schema = DatabaseSchema::new()
///     .with_table("users", TableSchema::structured("u"))
///     .with_table("tags", TableSchema::unstructured("t"));
/// let mut db = Database::open(&schema, InMemoryKvStore::new()).unwrap();
///
/// let ann = db.table("users").unwrap().put(Record::structured([("name", "Ann")])).unwrap();
/// let rust = db.table("tags").unwrap().put(Record::unstructured("rust")).unwrap();
/// assert_eq!(ann.id().get(), 1);
/// assert_eq!(rust.id().get(), 2);
/// ```
pub struct Database<S: KvStore> {
    store: S,
    registry: TableRegistry,
    names: BTreeMap<String, TableKey>,
}

impl<S: KvStore> Database<S> {
    /// Validate `schema` and build one table per entry over `store`.
    pub fn open(schema: &DatabaseSchema, store: S) -> Result<Self, Error> {
        let mut registry = TableRegistry::new();
        let mut names = BTreeMap::new();
        for (name, table_schema) in &schema.tables {
            registry.register(table_schema.build()?)?;
            names.insert(name.clone(), table_schema.key.clone());
        }
        registry.validate_links()?;
        log::debug!("Opened database with {} tables", registry.len());

        Ok(Self {
            store,
            registry,
            names,
        })
    }

    /// Handle to the table declared under `name`.
    pub fn table(&mut self, name: &str) -> Result<TableRef<'_>, Error> {
        let key = self
            .names
            .get(name)
            .ok_or_else(|| Error::configuration(format!("no table named '{}'", name)))?;
        let table = self.registry.get(key).ok_or_else(|| {
            Error::configuration(format!("table with key '{}' not found in the database", key))
        })?;
        Ok(TableRef {
            table,
            ctx: TableContext::new(&mut self.store, &self.registry),
        })
    }

    /// Handle to the table whose store key prefix is `key`.
    pub fn table_by_key(&mut self, key: &TableKey) -> Result<TableRef<'_>, Error> {
        let table = self
            .registry
            .get(key)
            .ok_or_else(|| Error::configuration(format!("table with key '{}' not found", key)))?;
        Ok(TableRef {
            table,
            ctx: TableContext::new(&mut self.store, &self.registry),
        })
    }

    /// Declared table names with their tables.
    pub fn tables(&self) -> impl Iterator<Item = (&str, &Table)> {
        self.names
            .iter()
            .filter_map(|(name, key)| Some((name.as_str(), self.registry.get(key)?)))
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

/// A table bound to its database's store and resolver.
pub struct TableRef<'a> {
    table: &'a Table,
    ctx: TableContext<'a>,
}

impl<'a> TableRef<'a> {
    pub fn table(&self) -> &'a Table {
        self.table
    }

    /// Every record of the table.
    pub fn get_all(&mut self) -> Result<Vec<Record>, Error> {
        self.table.get_all(&mut self.ctx)
    }

    pub fn get(&mut self, id: RecordId) -> Result<Option<Record>, Error> {
        self.table.get(&mut self.ctx, id)
    }

    pub fn get_many(&mut self, ids: &[RecordId]) -> Result<Vec<Record>, Error> {
        self.table.get_many(&mut self.ctx, ids)
    }

    pub fn put(&mut self, record: Record) -> Result<Record, Error> {
        self.table.put(&mut self.ctx, record)
    }

    pub fn find<F>(&mut self, matcher: F) -> Result<Option<Record>, Error>
    where
        F: FnMut(&Record) -> bool,
    {
        self.table.find(&mut self.ctx, matcher)
    }

    pub fn filter<F>(&mut self, matcher: F, limit: Option<usize>) -> Result<Vec<Record>, Error>
    where
        F: FnMut(&Record) -> bool,
    {
        self.table.filter(&mut self.ctx, matcher, limit)
    }

    pub fn delete(&mut self, id: RecordId) -> Result<(), Error> {
        self.table.delete(&mut self.ctx, id)
    }

    pub fn count(&mut self) -> Result<usize, Error> {
        self.table.count(&mut self.ctx)
    }
}

//! In-memory key-value store.

use std::collections::BTreeMap;

use crate::{KvError, KvStore};

/// A `BTreeMap`-backed store.
///
/// Keys enumerate in lexicographic order, which is stable across runs and
/// convenient in tests. Nothing is persisted.
///
/// # Example
///
/// ```rust
/// use kvtables_kv_store::{InMemoryKvStore, KvStore};
///
/// let mut store = InMemoryKvStore::new();
/// store.set("maxID", "0").unwrap();
/// store.remove("maxID").unwrap();
/// assert!(store.is_empty());
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryKvStore {
    entries: BTreeMap<String, String>,
}

impl InMemoryKvStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with initial entries.
    pub fn with_data(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over raw entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl KvStore for InMemoryKvStore {
    fn list_keys(&self) -> Result<Vec<String>, KvError> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), KvError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), KvError> {
        self.entries.remove(key);
        Ok(())
    }
}

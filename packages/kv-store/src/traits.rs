//! The backing-store capability trait.

use crate::KvError;

/// A synchronous string-keyed, string-valued store.
///
/// Implementations are assumed to be read-your-writes consistent: a `get`
/// issued after a `set` on the same handle observes the new value. No method
/// may suspend or block beyond the store's own I/O.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `&mut dyn KvStore` or `Box<dyn KvStore>`.
pub trait KvStore: Send + Sync {
    /// Enumerate every key currently held by the store.
    ///
    /// The order is the store's own enumeration order. Callers must not assume
    /// it is sorted numerically or by insertion.
    fn list_keys(&self) -> Result<Vec<String>, KvError>;

    /// Read the value stored under `key`.
    ///
    /// * `Ok(None)` - The key does not exist (not an error condition).
    /// * `Ok(Some(value))` - The stored value.
    fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), KvError>;

    /// Remove `key`. Removing an absent key is a no-op.
    fn remove(&mut self, key: &str) -> Result<(), KvError>;
}

// Blanket implementations for references and boxes

impl<T: KvStore + ?Sized> KvStore for &mut T {
    fn list_keys(&self) -> Result<Vec<String>, KvError> {
        (**self).list_keys()
    }

    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), KvError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), KvError> {
        (**self).remove(key)
    }
}

impl<T: KvStore + ?Sized> KvStore for Box<T> {
    fn list_keys(&self) -> Result<Vec<String>, KvError> {
        self.as_ref().list_keys()
    }

    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        self.as_ref().get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), KvError> {
        self.as_mut().set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), KvError> {
        self.as_mut().remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryKvStore;

    fn write_through(store: &mut dyn KvStore) {
        store.set("k", "v").unwrap();
    }

    #[test]
    fn object_safety_works() {
        let mut store = InMemoryKvStore::new();
        write_through(&mut store);
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn mut_ref_blanket_impl_works() {
        let mut store = InMemoryKvStore::new();
        let mut store_ref: &mut InMemoryKvStore = &mut store;

        KvStore::set(&mut store_ref, "ref_test", "ref_data").unwrap();
        assert_eq!(
            KvStore::get(&store_ref, "ref_test").unwrap().as_deref(),
            Some("ref_data")
        );
        KvStore::remove(&mut store_ref, "ref_test").unwrap();
        assert!(KvStore::list_keys(&store_ref).unwrap().is_empty());
    }

    #[test]
    fn box_dyn_works() {
        let mut boxed: Box<dyn KvStore> = Box::new(InMemoryKvStore::new());

        boxed.set("dyn_test", "dyn_data").unwrap();
        assert_eq!(boxed.get("dyn_test").unwrap().as_deref(), Some("dyn_data"));
        assert_eq!(boxed.list_keys().unwrap(), vec!["dyn_test".to_string()]);
    }
}

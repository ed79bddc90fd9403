//! Persisted, monotonically increasing record id counter.

use kvtables_kv_store::KvStore;

use crate::record::COUNTER_KEY;
use crate::{Error, RecordId};

/// Mints record ids from the counter stored under [`COUNTER_KEY`].
///
/// The counter is part of the store's visible state and is shared by every
/// table registered against that store, so ids are unique database-wide.
/// The allocator holds the store handle only for the duration of a borrow.
///
/// # Single writer
///
/// Allocation is a read-modify-write of one key with no compare-and-swap.
/// Two writers sharing a store can mint the same id.
pub struct IdAllocator<'s> {
    store: &'s mut dyn KvStore,
}

impl<'s> IdAllocator<'s> {
    pub fn new(store: &'s mut dyn KvStore) -> Self {
        Self { store }
    }

    /// The last id ever allocated from this store, `RecordId::NEW` if none.
    ///
    /// A missing or empty counter is initialized to `"0"` first.
    pub fn current_id(&mut self) -> Result<RecordId, Error> {
        let existing = self.store.get(COUNTER_KEY)?;
        if existing.as_deref().unwrap_or_default().is_empty() {
            log::debug!("Initializing id counter '{}'", COUNTER_KEY);
            self.store.set(COUNTER_KEY, "0")?;
        }

        let raw = self
            .store
            .get(COUNTER_KEY)?
            .ok_or_else(|| Error::CorruptCounter {
                key: COUNTER_KEY.to_string(),
                message: "value missing right after initialization".to_string(),
            })?;

        raw.trim()
            .parse::<u64>()
            .map(RecordId)
            .map_err(|e| Error::CorruptCounter {
                key: COUNTER_KEY.to_string(),
                message: format!("'{}': {}", raw, e),
            })
    }

    /// Allocate the next id, handing it to `assign` before publishing it.
    ///
    /// `assign` persists the record under the new id; only once it returns
    /// `Ok` is the counter advanced. If `assign` fails, the counter is left
    /// untouched and the error is returned.
    ///
    /// # Crash safety
    ///
    /// Record persistence happens-before counter publication, and the two
    /// writes are not atomic. If the process dies between them the counter
    /// under-reports, and the next allocation recomputes the same id and
    /// silently overwrites the record written by the interrupted call.
    pub fn allocate_next<F>(&mut self, assign: F) -> Result<RecordId, Error>
    where
        F: FnOnce(&mut dyn KvStore, RecordId) -> Result<(), Error>,
    {
        let current = self.current_id()?;
        let next = RecordId(current.get().saturating_add(1));
        if !next.is_storable() {
            return Err(Error::CorruptCounter {
                key: COUNTER_KEY.to_string(),
                message: format!("no ids left after {}", current),
            });
        }
        assign(&mut *self.store, next)?;
        self.store.set(COUNTER_KEY, &next.to_string())?;
        log::debug!("Allocated record id {}", next);
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvtables_kv_store::InMemoryKvStore;

    #[test]
    fn current_id_initializes_counter() {
        let mut store = InMemoryKvStore::new();
        assert_eq!(
            IdAllocator::new(&mut store).current_id().unwrap(),
            RecordId::NEW
        );
        assert_eq!(store.get(COUNTER_KEY).unwrap().as_deref(), Some("0"));
    }

    #[test]
    fn empty_counter_is_reinitialized() {
        let mut store = InMemoryKvStore::new();
        store.set(COUNTER_KEY, "").unwrap();
        assert_eq!(
            IdAllocator::new(&mut store).current_id().unwrap(),
            RecordId::NEW
        );
    }

    #[test]
    fn allocation_is_monotonic() {
        let mut store = InMemoryKvStore::new();
        let mut allocator = IdAllocator::new(&mut store);

        let first = allocator.allocate_next(|_, _| Ok(())).unwrap();
        let second = allocator.allocate_next(|_, _| Ok(())).unwrap();
        assert_eq!(first, RecordId(1));
        assert_eq!(second, RecordId(2));
        assert_eq!(allocator.current_id().unwrap(), RecordId(2));
    }

    #[test]
    fn assign_runs_before_counter_is_published() {
        let mut store = InMemoryKvStore::new();
        let id = IdAllocator::new(&mut store)
            .allocate_next(|store, id| {
                // The counter still reports the previous id while assigning.
                assert_eq!(store.get(COUNTER_KEY)?.as_deref(), Some("0"));
                store.set(&format!("t_{}", id), "\"x\"")?;
                Ok(())
            })
            .unwrap();

        assert_eq!(id, RecordId(1));
        assert_eq!(store.get("t_1").unwrap().as_deref(), Some("\"x\""));
        assert_eq!(store.get(COUNTER_KEY).unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn failed_assign_leaves_counter_alone() {
        let mut store = InMemoryKvStore::new();
        let err = IdAllocator::new(&mut store)
            .allocate_next(|_, _| Err(Error::configuration("boom")))
            .unwrap_err();

        assert!(matches!(err, Error::Configuration { .. }));
        assert_eq!(store.get(COUNTER_KEY).unwrap().as_deref(), Some("0"));
    }

    #[test]
    fn interrupted_allocation_reuses_the_id() {
        let mut store = InMemoryKvStore::new();
        // A record written without the counter being advanced, as after a crash.
        store.set("t_1", "\"lost\"").unwrap();

        let id = IdAllocator::new(&mut store)
            .allocate_next(|store, id| Ok(store.set(&format!("t_{}", id), "\"new\"")?))
            .unwrap();

        assert_eq!(id, RecordId(1));
        assert_eq!(store.get("t_1").unwrap().as_deref(), Some("\"new\""));
    }

    #[test]
    fn garbage_counter_is_corrupt() {
        let mut store = InMemoryKvStore::new();
        store.set(COUNTER_KEY, "seven").unwrap();
        assert!(matches!(
            IdAllocator::new(&mut store).current_id(),
            Err(Error::CorruptCounter { .. })
        ));
    }

    #[test]
    fn exhausted_counter_is_corrupt() {
        let mut store = InMemoryKvStore::new();
        store
            .set(COUNTER_KEY, &RecordId::MAX.to_string())
            .unwrap();
        let err = IdAllocator::new(&mut store)
            .allocate_next(|_, _| panic!("no id should be handed out"))
            .unwrap_err();

        assert!(matches!(err, Error::CorruptCounter { .. }));
        assert_eq!(
            store.get(COUNTER_KEY).unwrap(),
            Some(RecordId::MAX.to_string())
        );
    }
}

//! kvtables KV layer: the backing-store capability.
//!
//! This is the narrow waist of the kvtables stack. Everything at this level is
//! plain strings - no record semantics, no serialization, no key grammar.
//! The record layer above owns all of that.
//!
//! Implement [`KvStore`] for any synchronous store that can enumerate its keys
//! and get/set/remove string values under string keys. Two implementations
//! ship with the crate:
//! - [`InMemoryKvStore`]: a `BTreeMap`, mostly for tests and scratch databases
//! - [`LocalDiskKvStore`]: one file per key under a directory, the persistent default
//!
//! # Example
//!
//! ```rust
//! use kvtables_kv_store::{InMemoryKvStore, KvStore};
//!
//! let mut store = InMemoryKvStore::new();
//! store.set("u_1", r#"{"name":"Ann"}"#).unwrap();
//!
//! assert_eq!(store.get("u_1").unwrap().as_deref(), Some(r#"{"name":"Ann"}"#));
//! assert_eq!(store.list_keys().unwrap(), vec!["u_1".to_string()]);
//! ```

mod error;
mod in_memory;
mod local_disk;
mod traits;

pub use error::KvError;
pub use in_memory::InMemoryKvStore;
pub use local_disk::LocalDiskKvStore;
pub use traits::KvStore;

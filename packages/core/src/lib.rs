//! kvtables core: named tables of records over a key-value store.
//!
//! This layer adds meaning to the plain strings of the KV layer:
//! - [`Record`]: structured (field mapping) or unstructured (one opaque value), plus an id
//! - [`Table`]: CRUD over the store keys `{table key}_{id}`
//! - [`IdAllocator`]: one persisted counter (`maxID`) minting ids for every table of a store
//! - [`transform`]: foreign-key contraction/expansion and date/boolean coercion at field paths
//! - [`Database`]: a whole [`DatabaseSchema`] wired over one store
//!
//! # Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use kvtables_core::{CoercionKind, Database, DatabaseSchema, Record, RecordId, TableSchema, Value};
//! use kvtables_kv_store::{InMemoryKvStore, KvStore};
//!
//! let schema = DatabaseSchema::new().with_table(
//!     "users",
//!     TableSchema::structured("u").with_type("born", CoercionKind::Date),
//! );
//! let mut db = Database::open(&schema, InMemoryKvStore::new()).unwrap();
//!
//! let born = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
//! let ann = db
//!     .table("users")
//!     .unwrap()
//!     .put(Record::structured([("name", Value::from("Ann")), ("born", Value::from(born))]))
//!     .unwrap();
//!
//! assert_eq!(ann.id(), RecordId(1));
//! assert_eq!(ann.field("born"), Some(&Value::Date(born)));
//! assert_eq!(
//!     db.store().get("u_1").unwrap().as_deref(),
//!     Some(r#"{"born":946684800000,"name":"Ann"}"#)
//! );
//! assert_eq!(db.store().get("maxID").unwrap().as_deref(), Some("1"));
//! ```

mod allocator;
pub mod codec;
mod database;
mod error;
mod path;
mod record;
mod resolver;
mod schema;
mod table;
pub mod transform;
mod value;

pub use allocator::IdAllocator;
pub use database::{Database, TableRef};
pub use error::Error;
pub use path::{FieldPath, PathError};
pub use record::{
    Record, RecordId, StructuredRecord, TableKey, TableShape, UnstructuredRecord, COUNTER_KEY,
    ID_FIELD, KEY_SEPARATOR, VALUE_FIELD,
};
pub use resolver::{TableContext, TableRegistry, TableResolver};
pub use schema::{DatabaseSchema, ForeignTable, TableSchema};
pub use table::Table;
pub use transform::{CoercionKind, ForeignKeyMapping, TypeMapping};
pub use value::Value;

// Re-export the KV layer for convenience
pub use kvtables_kv_store::{InMemoryKvStore, KvError, KvStore, LocalDiskKvStore};

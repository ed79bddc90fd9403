//! kvtables: named tables of records over a plain key-value store.
//!
//! This crate bundles the layers:
//! - [`kv`]: the string-to-string store capability and its backends
//! - everything else: the record layer from `kvtables-core`

pub use kvtables_core::*;

pub mod kv {
    pub use kvtables_kv_store::*;
}

//! Record transforms applied between the application form of a record and
//! its stored payload.
//!
//! Write path, per structured record: foreign-key contraction for every
//! declared foreign mapping, then storage coercion for every type mapping.
//! Read path: foreign-key expansion, then application coercion. Each step is
//! a converter applied at one [`FieldPath`](crate::FieldPath) by
//! [`map_field_path`].

pub mod coercion;
pub mod foreign;
mod path_mapper;

pub use coercion::{CoercionKind, TypeMapping};
pub use foreign::ForeignKeyMapping;
pub use path_mapper::map_field_path;

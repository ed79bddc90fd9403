//! Declarative database schema.
//!
//! A schema names every table and says how each one is stored. It is plain
//! serde data, so it can be written in Rust or loaded from JSON:
//!
//! ```json
//! {
//!   "users":  { "key": "u", "type_mappings": { "born": "Date" } },
//!   "posts":  { "key": "p", "foreign_key_mappings": { "author": { "table_key": "u" } } },
//!   "tags":   { "key": "t", "unstructured": true }
//! }
//! ```

use std::collections::BTreeMap;
use std::io;

use serde::{Deserialize, Serialize};

use crate::transform::{CoercionKind, ForeignKeyMapping, TypeMapping};
use crate::{Error, FieldPath, Table, TableKey, TableShape};

/// Target of a foreign-key mapping.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignTable {
    pub table_key: TableKey,
    #[serde(default)]
    pub owned: bool,
}

/// How one table is stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub key: TableKey,
    #[serde(default)]
    pub unstructured: bool,
    /// Dotted field path -> referenced table.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub foreign_key_mappings: BTreeMap<String, ForeignTable>,
    /// Dotted field path -> application-side kind.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub type_mappings: BTreeMap<String, CoercionKind>,
}

impl TableSchema {
    pub fn structured(key: impl Into<TableKey>) -> Self {
        Self {
            key: key.into(),
            unstructured: false,
            foreign_key_mappings: BTreeMap::new(),
            type_mappings: BTreeMap::new(),
        }
    }

    pub fn unstructured(key: impl Into<TableKey>) -> Self {
        Self {
            unstructured: true,
            ..Self::structured(key)
        }
    }

    #[must_use]
    pub fn with_foreign_key(mut self, path: &str, table_key: impl Into<TableKey>) -> Self {
        self.foreign_key_mappings.insert(
            path.to_string(),
            ForeignTable {
                table_key: table_key.into(),
                owned: false,
            },
        );
        self
    }

    #[must_use]
    pub fn with_owned_foreign_key(mut self, path: &str, table_key: impl Into<TableKey>) -> Self {
        self.foreign_key_mappings.insert(
            path.to_string(),
            ForeignTable {
                table_key: table_key.into(),
                owned: true,
            },
        );
        self
    }

    #[must_use]
    pub fn with_type(mut self, path: &str, kind: CoercionKind) -> Self {
        self.type_mappings.insert(path.to_string(), kind);
        self
    }

    pub fn shape(&self) -> TableShape {
        if self.unstructured {
            TableShape::Unstructured
        } else {
            TableShape::Structured
        }
    }

    /// Parse every field path and build the table.
    pub fn build(&self) -> Result<Table, Error> {
        let mut table = Table::new(self.key.clone(), self.shape());
        for (path, foreign) in &self.foreign_key_mappings {
            let mut mapping =
                ForeignKeyMapping::new(FieldPath::parse(path)?, foreign.table_key.clone());
            mapping.owned = foreign.owned;
            table = table.with_foreign_key(mapping)?;
        }
        for (path, kind) in &self.type_mappings {
            table = table.with_type_mapping(TypeMapping::new(FieldPath::parse(path)?, *kind))?;
        }
        Ok(table)
    }
}

/// Table name -> table schema.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatabaseSchema {
    pub tables: BTreeMap<String, TableSchema>,
}

impl DatabaseSchema {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_table(mut self, name: impl Into<String>, table: TableSchema) -> Self {
        self.tables.insert(name.into(), table);
        self
    }

    pub fn from_json_str(s: &str) -> Result<Self, Error> {
        serde_json::from_str(s).map_err(|e| Error::configuration(format!("invalid schema: {}", e)))
    }

    pub fn from_reader(reader: impl io::Read) -> Result<Self, Error> {
        serde_json::from_reader(reader)
            .map_err(|e| Error::configuration(format!("invalid schema: {}", e)))
    }

    pub fn to_json_pretty(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Encode {
            message: e.to_string(),
        })
    }
}

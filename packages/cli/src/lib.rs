//! # kvtables-cli
//!
//! Command-line access to a kvtables database kept in a local directory.
//!
//! The database layout comes from a JSON schema file (see
//! [`kvtables_core::DatabaseSchema`]); records are stored one file per key
//! under the data directory.
//!
//! ## Usage
//!
//! ```bash
//! export KVTABLES_SCHEMA=schema.json
//! kvtables put users '{"name": "Ann", "born": 946684800000}'
//! kvtables get users 1
//! kvtables filter users --field name --equals '"Ann"' --limit 10
//! kvtables tables
//! ```

pub mod commands;
pub mod config;
pub mod error;

pub use commands::{execute, render, Command, FieldQuery};
pub use error::CliError;

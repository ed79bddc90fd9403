//! CLI command parsing and execution.
//!
//! Commands:
//! - `tables` - List tables with key, shape and record count
//! - `get <table> [ids...]` - Print records (all of them when no id is given)
//! - `put <table> <json>` - Insert, or update when the JSON carries a non-zero `id`
//! - `delete <table> <id>` - Remove a record
//! - `count <table>` - Number of records
//! - `filter <table> --field <path> --equals <json> [--limit N]` - Records whose field equals a value
//! - `find <table> --field <path> --equals <json>` - First such record

use clap::{Args, Subcommand};
use serde_json::{json, Value as JsonValue};

use kvtables_core::{
    codec, Database, FieldPath, Record, RecordId, Table, TableShape, Value, ID_FIELD, VALUE_FIELD,
};
use kvtables_kv_store::KvStore;

use crate::error::CliError;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List tables with their key, shape and record count
    Tables,
    /// Print records by id, or every record of the table when no id is given
    Get { table: String, ids: Vec<u64> },
    /// Store a record given as JSON; an object with a non-zero "id" updates that record
    Put { table: String, json: String },
    /// Delete a record
    Delete { table: String, id: u64 },
    /// Count the records of a table
    Count { table: String },
    /// Print the records whose field equals a JSON value
    Filter {
        table: String,
        #[command(flatten)]
        query: FieldQuery,
        /// Stop after this many matches (0 means no limit)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print the first record whose field equals a JSON value
    Find {
        table: String,
        #[command(flatten)]
        query: FieldQuery,
    },
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct FieldQuery {
    /// Dotted field path; use "value" for unstructured tables
    #[arg(long)]
    pub field: String,
    /// JSON value to compare against; dates compare as RFC 3339 strings
    #[arg(long)]
    pub equals: String,
}

/// Run `command` against `db`. `None` means there is nothing to print.
pub fn execute<S: KvStore>(
    db: &mut Database<S>,
    command: &Command,
) -> Result<Option<JsonValue>, CliError> {
    let output = match command {
        Command::Tables => {
            let names: Vec<String> = db.table_names().map(str::to_string).collect();
            let mut tables = Vec::with_capacity(names.len());
            for name in names {
                let mut table = db.table(&name)?;
                let count = table.count()?;
                tables.push(json!({
                    "name": name,
                    "key": table.table().key().as_str(),
                    "shape": table.table().shape().to_string(),
                    "count": count,
                }));
            }
            JsonValue::Array(tables)
        }
        Command::Get { table, ids } => {
            let mut table = db.table(table)?;
            match ids.as_slice() {
                [] => records_to_json(table.get_all()?),
                [id] => table
                    .get(RecordId(*id))?
                    .map_or(JsonValue::Null, record_to_json),
                ids => {
                    let ids: Vec<RecordId> = ids.iter().copied().map(RecordId).collect();
                    records_to_json(table.get_many(&ids)?)
                }
            }
        }
        Command::Put { table, json } => {
            let mut table = db.table(table)?;
            let record = parse_record(table.table(), json)?;
            record_to_json(table.put(record)?)
        }
        Command::Delete { table, id } => {
            db.table(table)?.delete(RecordId(*id))?;
            return Ok(None);
        }
        Command::Count { table } => json!(db.table(table)?.count()?),
        Command::Filter {
            table,
            query,
            limit,
        } => {
            let matcher = field_equals(query)?;
            records_to_json(db.table(table)?.filter(matcher, *limit)?)
        }
        Command::Find { table, query } => {
            let matcher = field_equals(query)?;
            db.table(table)?
                .find(matcher)?
                .map_or(JsonValue::Null, record_to_json)
        }
    };
    Ok(Some(output))
}

pub fn render(output: &JsonValue) -> Result<String, CliError> {
    serde_json::to_string_pretty(output).map_err(|e| CliError::Usage(e.to_string()))
}

fn record_to_json(record: Record) -> JsonValue {
    codec::value_to_json(record.to_value())
}

fn records_to_json(records: Vec<Record>) -> JsonValue {
    JsonValue::Array(records.into_iter().map(record_to_json).collect())
}

fn parse_json(input: &str) -> Result<JsonValue, CliError> {
    serde_json::from_str(input).map_err(|source| CliError::InvalidJson {
        input: input.to_string(),
        source,
    })
}

/// Turn command-line JSON into a record of the table's shape.
///
/// Structured tables take an object; its `id` (if any) selects the record.
/// Unstructured tables take any value; an object of exactly `id` and
/// `value` is read as the mapping form of an existing record.
fn parse_record(table: &Table, input: &str) -> Result<Record, CliError> {
    let value = codec::json_to_value(parse_json(input)?);
    match (table.shape(), value) {
        (TableShape::Structured, Value::Map(mut fields)) => {
            let id = match fields.remove(ID_FIELD) {
                Some(id) => parse_id(&id)?,
                None => RecordId::NEW,
            };
            Ok(Record::structured(fields).with_id(id))
        }
        (TableShape::Structured, other) => Err(CliError::Usage(format!(
            "table '{}' is structured and needs a JSON object, got {}",
            table.key(),
            codec::value_to_json(other)
        ))),
        (TableShape::Unstructured, Value::Map(mut fields))
            if fields.len() == 2
                && fields.contains_key(ID_FIELD)
                && fields.contains_key(VALUE_FIELD) =>
        {
            let id = parse_id(&fields[ID_FIELD])?;
            let value = fields.remove(VALUE_FIELD).unwrap_or_default();
            Ok(Record::unstructured(value).with_id(id))
        }
        (TableShape::Unstructured, other) => Ok(Record::unstructured(other)),
    }
}

fn parse_id(value: &Value) -> Result<RecordId, CliError> {
    value
        .as_i64()
        .and_then(|raw| u64::try_from(raw).ok())
        .map(RecordId)
        .ok_or_else(|| {
            CliError::Usage(format!(
                "'id' must be a non-negative integer, got {}",
                codec::value_to_json(value.clone())
            ))
        })
}

/// Matcher comparing the JSON form of one field, so dates match their
/// RFC 3339 rendering.
fn field_equals(query: &FieldQuery) -> Result<impl FnMut(&Record) -> bool, CliError> {
    let path: FieldPath = query.field.parse()?;
    let expected = parse_json(&query.equals)?;
    Ok(move |record: &Record| {
        record
            .to_value()
            .get(&path)
            .is_some_and(|found| codec::value_to_json(found.clone()) == expected)
    })
}

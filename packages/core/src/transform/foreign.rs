//! Foreign-key contraction (write path) and expansion (read path).

use std::collections::BTreeMap;

use crate::record::{ID_FIELD, VALUE_FIELD};
use crate::{
    Error, FieldPath, Record, RecordId, StructuredRecord, Table, TableContext, TableKey,
    TableShape, UnstructuredRecord, Value,
};

/// Declares that the field at `path` references records of `table`.
///
/// `owned` records whether the referencing table owns the referenced
/// records. It is carried as declared data; contraction and expansion treat
/// owned and shared references alike.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForeignKeyMapping {
    pub path: FieldPath,
    pub table: TableKey,
    pub owned: bool,
}

impl ForeignKeyMapping {
    pub fn new(path: FieldPath, table: impl Into<TableKey>) -> Self {
        Self {
            path,
            table: table.into(),
            owned: false,
        }
    }

    #[must_use]
    pub fn owned(mut self) -> Self {
        self.owned = true;
        self
    }
}

/// Replace embedded foreign record(s) with their id(s).
///
/// - a map with a non-zero `id` becomes that id; the foreign record is not re-saved
/// - a map with `id: 0` is first created in `foreign`, then replaced by the minted id
/// - a map without `id` is a [`Error::MalformedReference`]
/// - a positive integer is taken as an id already contracted by an earlier
///   write; zero or a negative integer is a [`Error::MalformedReference`]
/// - arrays are contracted element-wise by the same rules
/// - anything else passes through unchanged
///
/// Re-submitting the same embedded `id: 0` record on a later write creates a
/// second foreign row: the minted id is never written back into the caller's
/// copy.
pub fn contract(
    ctx: &mut TableContext<'_>,
    foreign: &Table,
    path: &FieldPath,
    leaf: Option<Value>,
) -> Result<Option<Value>, Error> {
    match leaf {
        Some(Value::Map(embedded)) => {
            let id = contract_one(ctx, foreign, path, embedded)?;
            Ok(Some(id.to_value()))
        }
        Some(Value::Integer(raw)) => Ok(Some(stored_id(foreign, path, raw)?.to_value())),
        Some(Value::Array(items)) => {
            let mut ids = Vec::with_capacity(items.len());
            for item in items {
                let id = match item {
                    Value::Map(embedded) => contract_one(ctx, foreign, path, embedded)?,
                    Value::Integer(raw) => stored_id(foreign, path, raw)?,
                    other => {
                        return Err(malformed(
                            foreign,
                            path,
                            format!("list element {:?} is neither a record nor an id", other),
                        ))
                    }
                };
                ids.push(id.to_value());
            }
            Ok(Some(Value::Array(ids)))
        }
        other => Ok(other),
    }
}

fn stored_id(foreign: &Table, path: &FieldPath, raw: i64) -> Result<RecordId, Error> {
    match u64::try_from(raw) {
        Ok(id) if id > 0 => Ok(RecordId(id)),
        _ => Err(malformed(
            foreign,
            path,
            format!("{} is not the id of a stored record", raw),
        )),
    }
}

fn contract_one(
    ctx: &mut TableContext<'_>,
    foreign: &Table,
    path: &FieldPath,
    mut embedded: BTreeMap<String, Value>,
) -> Result<RecordId, Error> {
    let Some(id_value) = embedded.remove(ID_FIELD) else {
        return Err(malformed(foreign, path, "embedded record has no id field"));
    };
    let Some(id) = RecordId::from_value(&id_value) else {
        return Err(malformed(
            foreign,
            path,
            format!("embedded id {:?} is not a record id", id_value),
        ));
    };
    if !id.is_new() {
        return Ok(id);
    }

    let record = match foreign.shape() {
        TableShape::Structured => Record::Structured(StructuredRecord {
            id: RecordId::NEW,
            fields: embedded,
        }),
        TableShape::Unstructured => {
            let value = embedded.remove(VALUE_FIELD);
            match value {
                Some(value) if embedded.is_empty() => Record::Unstructured(UnstructuredRecord {
                    id: RecordId::NEW,
                    value,
                }),
                _ => {
                    return Err(Error::StructureMismatch {
                        table: foreign.key().clone(),
                        declared: TableShape::Unstructured,
                        actual: TableShape::Structured,
                    })
                }
            }
        }
    };

    log::trace!(
        "Cascade-creating a record in '{}' for field '{}'",
        foreign.key(),
        path
    );
    Ok(foreign.put(ctx, record)?.id())
}

/// Replace stored foreign id(s) with the referenced record(s).
///
/// - an id becomes the foreign record in mapping form, or `Null` if it no longer exists
/// - a non-empty list of ids becomes the records that still exist, in list order
/// - an empty list is returned as is without touching the foreign table
/// - anything else, including lists that are not all ids, passes through unchanged
///
/// Id 0 is never stored, so it expands like a missing record. A reference to
/// a record that is itself still being expanded (a reference cycle) stays a
/// bare id.
pub fn expand(
    ctx: &mut TableContext<'_>,
    foreign: &Table,
    leaf: Option<Value>,
) -> Result<Option<Value>, Error> {
    match leaf {
        Some(Value::Integer(raw)) if raw >= 0 => {
            let expanded = expand_one(ctx, foreign, RecordId(raw as u64))?;
            Ok(Some(expanded.unwrap_or(Value::Null)))
        }
        Some(Value::Array(items)) if !items.is_empty() => {
            let ids: Option<Vec<RecordId>> = items.iter().map(RecordId::from_value).collect();
            let Some(ids) = ids else {
                return Ok(Some(Value::Array(items)));
            };
            let mut records = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(record) = expand_one(ctx, foreign, id)? {
                    records.push(record);
                }
            }
            Ok(Some(Value::Array(records)))
        }
        other => Ok(other),
    }
}

fn expand_one(
    ctx: &mut TableContext<'_>,
    foreign: &Table,
    id: RecordId,
) -> Result<Option<Value>, Error> {
    if id.is_new() {
        return Ok(None);
    }
    if ctx.is_expanding(foreign.key(), id) {
        log::trace!(
            "Leaving '{}' unexpanded: reference cycle",
            foreign.key().record_key(id)
        );
        return Ok(Some(id.to_value()));
    }
    Ok(foreign.get(ctx, id)?.map(|record| record.to_value()))
}

fn malformed(foreign: &Table, path: &FieldPath, message: impl Into<String>) -> Error {
    Error::MalformedReference {
        table: foreign.key().clone(),
        path: path.to_string(),
        message: message.into(),
    }
}

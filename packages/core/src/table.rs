//! The table engine: CRUD over one table's slice of the shared store.

use std::collections::BTreeMap;

use crate::allocator::IdAllocator;
use crate::codec;
use crate::record::ID_FIELD;
use crate::transform::coercion::{self, TypeMapping};
use crate::transform::foreign::{self, ForeignKeyMapping};
use crate::transform::map_field_path;
use crate::{
    Error, Record, RecordId, StructuredRecord, TableContext, TableKey, TableShape,
    UnstructuredRecord, Value,
};

/// One declared table.
///
/// A table holds configuration only, never records: every query re-derives
/// its result from a scan of the store passed in through [`TableContext`].
/// Records come back in the store's key enumeration order.
///
/// All operations are synchronous. A failed operation has issued no write of
/// its own; the only writes that can precede a failure are cascade creations
/// in foreign tables.
#[derive(Clone, Debug)]
pub struct Table {
    key: TableKey,
    shape: TableShape,
    foreign_keys: Vec<ForeignKeyMapping>,
    type_mappings: Vec<TypeMapping>,
}

impl Table {
    pub fn new(key: impl Into<TableKey>, shape: TableShape) -> Self {
        Self {
            key: key.into(),
            shape,
            foreign_keys: Vec::new(),
            type_mappings: Vec::new(),
        }
    }

    /// Declare a foreign-key mapping. Only structured tables have fields to map.
    pub fn with_foreign_key(mut self, mapping: ForeignKeyMapping) -> Result<Self, Error> {
        self.ensure_mappable(&mapping.path.to_string())?;
        self.foreign_keys.push(mapping);
        Ok(self)
    }

    /// Declare a type mapping. Only structured tables have fields to map.
    pub fn with_type_mapping(mut self, mapping: TypeMapping) -> Result<Self, Error> {
        self.ensure_mappable(&mapping.path.to_string())?;
        self.type_mappings.push(mapping);
        Ok(self)
    }

    fn ensure_mappable(&self, path: &str) -> Result<(), Error> {
        match self.shape {
            TableShape::Structured => Ok(()),
            TableShape::Unstructured => Err(Error::configuration(format!(
                "unstructured table '{}' cannot map field '{}'",
                self.key, path
            ))),
        }
    }

    pub fn key(&self) -> &TableKey {
        &self.key
    }

    pub fn shape(&self) -> TableShape {
        self.shape
    }

    pub fn foreign_keys(&self) -> &[ForeignKeyMapping] {
        &self.foreign_keys
    }

    pub fn type_mappings(&self) -> &[TypeMapping] {
        &self.type_mappings
    }

    // === Reads ===

    /// Every decodable record of this table.
    ///
    /// Payloads that fail to decode are logged and skipped.
    pub fn get_all(&self, ctx: &mut TableContext<'_>) -> Result<Vec<Record>, Error> {
        self.filter(ctx, |_| true, None)
    }

    /// The record stored under `id`, or `None`.
    ///
    /// Asking for `RecordId::NEW` is a [`Error::Protocol`] error.
    pub fn get(&self, ctx: &mut TableContext<'_>, id: RecordId) -> Result<Option<Record>, Error> {
        match self.raw_payload(ctx, id)? {
            Some(raw) => self.decode(ctx, id, raw).map(Some),
            None => Ok(None),
        }
    }

    /// The records for those of `ids` that exist, in the order given.
    pub fn get_many(
        &self,
        ctx: &mut TableContext<'_>,
        ids: &[RecordId],
    ) -> Result<Vec<Record>, Error> {
        let mut records = Vec::with_capacity(ids.len());
        for &id in ids {
            if let Some(record) = self.get(ctx, id)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// The first record, in enumeration order, that `matcher` accepts.
    pub fn find<F>(&self, ctx: &mut TableContext<'_>, matcher: F) -> Result<Option<Record>, Error>
    where
        F: FnMut(&Record) -> bool,
    {
        Ok(self.filter(ctx, matcher, Some(1))?.into_iter().next())
    }

    /// Records `matcher` accepts, in enumeration order.
    ///
    /// Stops once `limit` matches are collected; `None` (or `Some(0)`) means
    /// no limit.
    pub fn filter<F>(
        &self,
        ctx: &mut TableContext<'_>,
        mut matcher: F,
        limit: Option<usize>,
    ) -> Result<Vec<Record>, Error>
    where
        F: FnMut(&Record) -> bool,
    {
        let limit = limit.filter(|&n| n > 0).unwrap_or(usize::MAX);
        let mut matches = Vec::new();
        for id in self.ids(ctx)? {
            let record = match self.get(ctx, id) {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(Error::Decode { message }) => {
                    log::warn!(
                        "Skipping undecodable record '{}': {}",
                        self.key.record_key(id),
                        message
                    );
                    continue;
                }
                Err(e) => return Err(e),
            };
            if matcher(&record) {
                matches.push(record);
                if matches.len() >= limit {
                    break;
                }
            }
        }
        Ok(matches)
    }

    /// Number of store keys that currently belong to this table.
    pub fn count(&self, ctx: &mut TableContext<'_>) -> Result<usize, Error> {
        Ok(self.ids(ctx)?.len())
    }

    // === Writes ===

    /// Insert (`id == 0`) or update a record; returns it as now stored.
    ///
    /// Inserts allocate a fresh id. For unstructured tables an insert is
    /// rejected if an existing record already holds an equal value. Updates
    /// of structured records merge the supplied fields over the stored ones,
    /// so omitted fields keep their stored values. An update to an id with
    /// no stored entry writes it under that id without touching the counter.
    ///
    /// The returned record is re-read from the store, showing cascaded
    /// foreign ids and coerced types as stored.
    pub fn put(&self, ctx: &mut TableContext<'_>, record: Record) -> Result<Record, Error> {
        if record.shape() != self.shape {
            return Err(Error::StructureMismatch {
                table: self.key.clone(),
                declared: self.shape,
                actual: record.shape(),
            });
        }

        let id = record.id();
        if id > RecordId::MAX {
            return Err(self.out_of_range(id));
        }
        let payload = match record {
            Record::Unstructured(UnstructuredRecord { value, .. }) => {
                if id.is_new() {
                    self.ensure_unique(ctx, &value)?;
                }
                codec::encode(&value)?
            }
            Record::Structured(StructuredRecord { fields, .. }) => {
                let mut merged = if id.is_new() {
                    BTreeMap::new()
                } else {
                    self.stored_fields(ctx, id)?
                };
                merged.extend(fields);
                self.encode_structured(ctx, merged)?
            }
        };

        let id = if id.is_new() {
            let key = &self.key;
            IdAllocator::new(&mut *ctx.store)
                .allocate_next(|store, id| Ok(store.set(&key.record_key(id), &payload)?))?
        } else {
            ctx.store.set(&self.key.record_key(id), &payload)?;
            id
        };
        log::debug!("Stored record '{}'", self.key.record_key(id));

        self.get(ctx, id)?.ok_or_else(|| Error::Decode {
            message: format!(
                "record '{}' is missing right after being written",
                self.key.record_key(id)
            ),
        })
    }

    /// Remove the entry for `id`; a no-op when absent. Ids are never reused.
    pub fn delete(&self, ctx: &mut TableContext<'_>, id: RecordId) -> Result<(), Error> {
        ctx.store.remove(&self.key.record_key(id))?;
        log::debug!("Deleted record '{}'", self.key.record_key(id));
        Ok(())
    }

    // === Internals ===

    fn ids(&self, ctx: &TableContext<'_>) -> Result<Vec<RecordId>, Error> {
        Ok(ctx
            .store
            .list_keys()?
            .iter()
            .filter_map(|key| self.key.parse_record_key(key))
            .collect())
    }

    fn raw_payload(&self, ctx: &TableContext<'_>, id: RecordId) -> Result<Option<Value>, Error> {
        if id.is_new() {
            return Err(Error::Protocol {
                message: format!(
                    "record id 0 of table '{}' was requested; 0 marks unsaved records",
                    self.key
                ),
            });
        }
        if id > RecordId::MAX {
            return Err(self.out_of_range(id));
        }
        let store_key = self.key.record_key(id);
        match ctx.store.get(&store_key)? {
            Some(payload) => codec::decode(&payload).map(Some).map_err(|e| match e {
                Error::Decode { message } => Error::Decode {
                    message: format!("'{}': {}", store_key, message),
                },
                other => other,
            }),
            None => Ok(None),
        }
    }

    fn stored_fields(
        &self,
        ctx: &TableContext<'_>,
        id: RecordId,
    ) -> Result<BTreeMap<String, Value>, Error> {
        match self.raw_payload(ctx, id)? {
            Some(Value::Map(fields)) => Ok(fields),
            Some(other) => Err(self.not_a_map(id, &other)),
            None => Ok(BTreeMap::new()),
        }
    }

    fn ensure_unique(&self, ctx: &mut TableContext<'_>, value: &Value) -> Result<(), Error> {
        let existing = self.find(ctx, |record| {
            record
                .as_unstructured()
                .is_some_and(|existing| &existing.value == value)
        })?;
        match existing {
            Some(_) => Err(Error::DuplicateValue {
                table: self.key.clone(),
                value: codec::encode(value)?,
            }),
            None => Ok(()),
        }
    }

    fn encode_structured(
        &self,
        ctx: &mut TableContext<'_>,
        fields: BTreeMap<String, Value>,
    ) -> Result<String, Error> {
        let resolver = ctx.resolver;
        let mut value = Value::Map(fields);

        for mapping in &self.foreign_keys {
            let foreign_table = resolver.resolve(&mapping.table)?;
            value = map_field_path(value, &mapping.path, &mut |leaf| {
                foreign::contract(ctx, foreign_table, &mapping.path, leaf)
            })?;
        }

        for mapping in &self.type_mappings {
            value = map_field_path(value, &mapping.path, &mut |leaf| {
                Ok(leaf.map(coercion::to_storage))
            })?;
        }

        if let Value::Map(map) = &mut value {
            map.remove(ID_FIELD);
        }
        log::trace!("Encoded record for table '{}'", self.key);
        codec::encode(&value)
    }

    fn decode(&self, ctx: &mut TableContext<'_>, id: RecordId, raw: Value) -> Result<Record, Error> {
        match self.shape {
            TableShape::Unstructured => Ok(Record::Unstructured(UnstructuredRecord { id, value: raw })),
            TableShape::Structured => {
                if !raw.is_map() {
                    return Err(self.not_a_map(id, &raw));
                }
                let resolver = ctx.resolver;
                let mut value = ctx.expanding(&self.key, id, |ctx| {
                    let mut value = raw;
                    for mapping in &self.foreign_keys {
                        let foreign_table = resolver.resolve(&mapping.table)?;
                        value = map_field_path(value, &mapping.path, &mut |leaf| {
                            foreign::expand(ctx, foreign_table, leaf)
                        })?;
                    }
                    Ok(value)
                })?;

                for mapping in &self.type_mappings {
                    let kind = mapping.kind;
                    value = map_field_path(value, &mapping.path, &mut |leaf| {
                        Ok(leaf.map(|v| coercion::from_storage(v, kind)))
                    })?;
                }

                match value {
                    Value::Map(mut fields) => {
                        fields.remove(ID_FIELD);
                        Ok(Record::Structured(StructuredRecord { id, fields }))
                    }
                    other => Err(self.not_a_map(id, &other)),
                }
            }
        }
    }

    fn out_of_range(&self, id: RecordId) -> Error {
        Error::Protocol {
            message: format!(
                "record id {} of table '{}' is beyond the largest storable id {}",
                id,
                self.key,
                RecordId::MAX
            ),
        }
    }

    fn not_a_map(&self, id: RecordId, found: &Value) -> Error {
        Error::Decode {
            message: format!(
                "'{}' of structured table '{}' holds {:?}, not a field mapping",
                self.key.record_key(id),
                self.key,
                found
            ),
        }
    }
}

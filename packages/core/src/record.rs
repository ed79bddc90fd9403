//! Record identifiers, table keys and the two record variants.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::{Error, Value};

/// Name of the identifier field in a record's mapping form.
pub const ID_FIELD: &str = "id";

/// Name of the value field in an unstructured record's mapping form.
pub const VALUE_FIELD: &str = "value";

/// Key of the persisted id counter shared by every table of a store.
pub const COUNTER_KEY: &str = "maxID";

/// Separator between a table key and a record id in a store key.
pub const KEY_SEPARATOR: char = '_';

/// Integer identifier of a record.
///
/// `RecordId::NEW` (zero) is the sentinel for "not yet persisted" and is never
/// a stored identifier. Ids are unique across every table of a store.
#[derive(
    Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl RecordId {
    pub const NEW: RecordId = RecordId(0);

    /// Largest storable id. Ids travel as JSON integers read back as `i64`.
    pub const MAX: RecordId = RecordId(i64::MAX as u64);

    pub fn is_new(self) -> bool {
        self.0 == 0
    }

    /// Whether this id can name a stored record: non-zero and at most [`RecordId::MAX`].
    pub fn is_storable(self) -> bool {
        !self.is_new() && self <= Self::MAX
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// The id as an integer field; `Null` for ids beyond [`RecordId::MAX`],
    /// which no stored record carries.
    pub(crate) fn to_value(self) -> Value {
        i64::try_from(self.0).map_or(Value::Null, Value::Integer)
    }

    /// Read an id out of a stored or embedded value.
    ///
    /// Only non-negative integers qualify.
    pub(crate) fn from_value(value: &Value) -> Option<RecordId> {
        match value {
            Value::Integer(i) if *i >= 0 => Some(RecordId(*i as u64)),
            _ => None,
        }
    }
}

impl From<u64> for RecordId {
    fn from(v: u64) -> Self {
        RecordId(v)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Namespace of a table inside the shared store; the prefix of its keys.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableKey(String);

impl TableKey {
    pub fn new(key: impl Into<String>) -> Self {
        TableKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `{key}_` prefix shared by every store key of this table.
    pub fn prefix(&self) -> String {
        format!("{}{}", self.0, KEY_SEPARATOR)
    }

    /// Store key of one record: `{key}_{id}`.
    pub fn record_key(&self, id: RecordId) -> String {
        format!("{}{}{}", self.0, KEY_SEPARATOR, id)
    }

    /// Recover the record id from a store key, if the key belongs to this table.
    ///
    /// The remainder after the prefix must be a plain decimal, non-zero id;
    /// anything else is some other table's (or nobody's) key.
    pub fn parse_record_key(&self, store_key: &str) -> Option<RecordId> {
        let rest = store_key
            .strip_prefix(self.0.as_str())?
            .strip_prefix(KEY_SEPARATOR)?;
        if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        rest.parse::<u64>()
            .ok()
            .map(RecordId)
            .filter(|id| id.is_storable())
    }
}

impl From<&str> for TableKey {
    fn from(v: &str) -> Self {
        TableKey::new(v)
    }
}

impl From<String> for TableKey {
    fn from(v: String) -> Self {
        TableKey(v)
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which record variant a table holds, declared once per table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TableShape {
    Structured,
    Unstructured,
}

impl fmt::Display for TableShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableShape::Structured => f.write_str("structured"),
            TableShape::Unstructured => f.write_str("unstructured"),
        }
    }
}

/// A field mapping plus an id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StructuredRecord {
    pub id: RecordId,
    pub fields: BTreeMap<String, Value>,
}

/// A single opaque value plus an id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UnstructuredRecord {
    pub id: RecordId,
    pub value: Value,
}

/// A record as seen by callers of a table.
#[derive(Clone, Debug, PartialEq)]
pub enum Record {
    Structured(StructuredRecord),
    Unstructured(UnstructuredRecord),
}

impl Record {
    /// A new, unsaved structured record.
    pub fn structured<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Record::Structured(StructuredRecord {
            id: RecordId::NEW,
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        })
    }

    /// A new, unsaved unstructured record.
    pub fn unstructured(value: impl Into<Value>) -> Self {
        Record::Unstructured(UnstructuredRecord {
            id: RecordId::NEW,
            value: value.into(),
        })
    }

    /// Serialize any `T` into a new structured record's fields.
    pub fn from_serialize<T: Serialize>(data: &T) -> Result<Self, Error> {
        match codec::to_value(data)? {
            Value::Map(fields) => Ok(Record::Structured(StructuredRecord {
                id: RecordId::NEW,
                fields,
            })),
            _ => Err(Error::Encode {
                message: "a structured record must serialize to a map".to_string(),
            }),
        }
    }

    /// Same record with a different id; used to address updates.
    #[must_use]
    pub fn with_id(mut self, id: RecordId) -> Self {
        match &mut self {
            Record::Structured(r) => r.id = id,
            Record::Unstructured(r) => r.id = id,
        }
        self
    }

    pub fn id(&self) -> RecordId {
        match self {
            Record::Structured(r) => r.id,
            Record::Unstructured(r) => r.id,
        }
    }

    pub fn shape(&self) -> TableShape {
        match self {
            Record::Structured(_) => TableShape::Structured,
            Record::Unstructured(_) => TableShape::Unstructured,
        }
    }

    pub fn as_structured(&self) -> Option<&StructuredRecord> {
        match self {
            Record::Structured(r) => Some(r),
            Record::Unstructured(_) => None,
        }
    }

    pub fn as_unstructured(&self) -> Option<&UnstructuredRecord> {
        match self {
            Record::Unstructured(r) => Some(r),
            Record::Structured(_) => None,
        }
    }

    /// A structured field by name; `None` for unstructured records.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.as_structured()?.fields.get(name)
    }

    /// Mapping form: structured fields plus `id`, or `{id, value}`.
    ///
    /// This is the form an expanded foreign reference takes inside the
    /// referencing record.
    pub fn to_value(&self) -> Value {
        let mut map = BTreeMap::new();
        match self {
            Record::Structured(r) => {
                map.extend(r.fields.iter().map(|(k, v)| (k.clone(), v.clone())));
                map.insert(ID_FIELD.to_string(), r.id.to_value());
            }
            Record::Unstructured(r) => {
                map.insert(ID_FIELD.to_string(), r.id.to_value());
                map.insert(VALUE_FIELD.to_string(), r.value.clone());
            }
        }
        Value::Map(map)
    }

    /// Deserialize the mapping form into any `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, Error> {
        codec::from_value(self.to_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_key_grammar() {
        let key = TableKey::new("u");
        assert_eq!(key.record_key(RecordId(1)), "u_1");
        assert_eq!(key.prefix(), "u_");
        assert_eq!(key.parse_record_key("u_1"), Some(RecordId(1)));
        assert_eq!(key.parse_record_key("u_42"), Some(RecordId(42)));
    }

    #[test]
    fn foreign_and_malformed_keys_are_not_records() {
        let key = TableKey::new("u");
        assert_eq!(key.parse_record_key("maxID"), None);
        assert_eq!(key.parse_record_key("u_"), None);
        assert_eq!(key.parse_record_key("u_0"), None);
        assert_eq!(key.parse_record_key("u_9223372036854775808"), None);
        assert_eq!(key.parse_record_key("u_1.5"), None);
        assert_eq!(key.parse_record_key("u_-1"), None);
        assert_eq!(key.parse_record_key("u_x_1"), None);
        assert_eq!(key.parse_record_key("users_1"), None);
        assert_eq!(key.parse_record_key("v_1"), None);
    }

    #[test]
    fn mapping_form_carries_id() {
        let record = Record::structured([("name", "Ann")]).with_id(RecordId(3));
        assert_eq!(
            record.to_value(),
            Value::from_iter([("id", Value::Integer(3)), ("name", Value::from("Ann"))])
        );

        let record = Record::unstructured("blue").with_id(RecordId(4));
        assert_eq!(
            record.to_value(),
            Value::from_iter([("id", Value::Integer(4)), ("value", Value::from("blue"))])
        );
    }

    #[test]
    fn ids_beyond_i64_never_wrap() {
        assert!(RecordId::MAX.is_storable());
        assert!(!RecordId::NEW.is_storable());
        assert!(!RecordId(u64::MAX).is_storable());

        assert_eq!(RecordId::MAX.to_value(), Value::Integer(i64::MAX));
        assert_eq!(RecordId(u64::MAX).to_value(), Value::Null);
        assert_eq!(RecordId(1 << 63).to_value(), Value::Null);
    }

    #[test]
    fn typed_round_trip() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Tag {
            id: u64,
            label: String,
        }

        let record = Record::from_serialize(&serde_json::json!({"label": "rust"}))
            .unwrap()
            .with_id(RecordId(9));
        assert_eq!(record.shape(), TableShape::Structured);
        assert_eq!(
            record.deserialize::<Tag>().unwrap(),
            Tag {
                id: 9,
                label: "rust".to_string()
            }
        );
    }

    #[test]
    fn scalars_do_not_make_structured_records() {
        assert!(matches!(
            Record::from_serialize(&5),
            Err(Error::Encode { .. })
        ));
    }
}

//! Conversion between value kinds the store cannot hold and their numeric
//! stored form.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::{FieldPath, Value};

/// Application-side kind of a type-mapped field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoercionKind {
    /// Stored as integer epoch milliseconds.
    Date,
    /// Stored as `1` or `0`.
    Boolean,
}

/// Declares that the field at `path` is a `kind` to callers and a number in
/// the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeMapping {
    pub path: FieldPath,
    pub kind: CoercionKind,
}

impl TypeMapping {
    pub fn new(path: FieldPath, kind: CoercionKind) -> Self {
        Self { path, kind }
    }
}

/// Application value to stored value.
///
/// Dates become epoch milliseconds, booleans `1`/`0`; anything else,
/// including values already in stored form, is returned as is.
pub fn to_storage(value: Value) -> Value {
    match value {
        Value::Date(d) => Value::Integer(d.timestamp_millis()),
        Value::Bool(b) => Value::Integer(i64::from(b)),
        other => other,
    }
}

/// Stored value to application value of the declared kind.
///
/// Only numbers are converted. Milliseconds outside chrono's range are left
/// as numbers.
pub fn from_storage(value: Value, kind: CoercionKind) -> Value {
    match (value, kind) {
        (Value::Integer(ms), CoercionKind::Date) => DateTime::from_timestamp_millis(ms)
            .map(Value::Date)
            .unwrap_or(Value::Integer(ms)),
        (Value::Float(ms), CoercionKind::Date) if ms.is_finite() => {
            DateTime::from_timestamp_millis(ms.trunc() as i64)
                .map(Value::Date)
                .unwrap_or(Value::Float(ms))
        }
        (Value::Integer(n), CoercionKind::Boolean) => Value::Bool(n != 0),
        (Value::Float(n), CoercionKind::Boolean) => Value::Bool(n != 0.0 && !n.is_nan()),
        (other, _) => other,
    }
}

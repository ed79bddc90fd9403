//! JSON codec and serde conversions for [`Value`].
//!
//! The store only holds strings; every payload goes through here on its way
//! in and out.

use chrono::SecondsFormat;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{Error, Value};

/// Serialize a value into the string form written to the store.
pub fn encode(value: &Value) -> Result<String, Error> {
    serde_json::to_string(&value_to_json(value.clone())).map_err(|e| Error::Encode {
        message: e.to_string(),
    })
}

/// Parse a stored string back into a value.
pub fn decode(payload: &str) -> Result<Value, Error> {
    let json: serde_json::Value = serde_json::from_str(payload).map_err(|e| Error::Decode {
        message: e.to_string(),
    })?;
    Ok(json_to_value(json))
}

/// Convert a Value to a Rust type via serde.
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    serde_json::from_value(value_to_json(value)).map_err(|e| Error::Decode {
        message: e.to_string(),
    })
}

/// Convert a Rust type to a Value via serde.
pub fn to_value<T: Serialize>(data: &T) -> Result<Value, Error> {
    let json = serde_json::to_value(data).map_err(|e| Error::Encode {
        message: e.to_string(),
    })?;
    Ok(json_to_value(json))
}

/// `Value` to its JSON payload form.
///
/// JSON has no date type: a `Date` that reaches this point without a type
/// mapping becomes an RFC 3339 string with millisecond precision. NaN and
/// the infinities have no JSON form either and are written as `null`.
pub fn value_to_json(value: Value) -> serde_json::Value {
    use serde_json::Value as Json;

    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(b),
        Value::Integer(i) => Json::from(i),
        Value::Float(f) => serde_json::Number::from_f64(f).map_or(Json::Null, Json::Number),
        Value::String(s) => Json::String(s),
        Value::Date(d) => Json::String(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
        Value::Array(items) => items.into_iter().map(value_to_json).collect(),
        Value::Map(fields) => Json::Object(
            fields
                .into_iter()
                .map(|(name, v)| (name, value_to_json(v)))
                .collect(),
        ),
    }
}

/// A decoded JSON payload as a `Value`.
///
/// Numbers that fit `i64` (every id and epoch-millisecond timestamp) come
/// back as `Integer`; larger unsigned integers and fractions come back as
/// `Float`, so a payload number is never turned into a string.
pub fn json_to_value(json: serde_json::Value) -> Value {
    use serde_json::Value as Json;

    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => n.as_f64().map_or(Value::Null, Value::Float),
        },
        Json::String(s) => Value::String(s),
        Json::Array(items) => Value::Array(items.into_iter().map(json_to_value).collect()),
        Json::Object(fields) => Value::Map(
            fields
                .into_iter()
                .map(|(name, v)| (name, json_to_value(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde::Deserialize;

    #[test]
    fn encodes_compact_json() {
        let value = Value::from_iter([
            ("name", Value::from("Ann")),
            ("born", Value::Integer(946684800000)),
        ]);
        assert_eq!(
            encode(&value).unwrap(),
            r#"{"born":946684800000,"name":"Ann"}"#
        );
    }

    #[test]
    fn decode_numbers() {
        let value = decode(r#"{"integer": 42, "float": 2.75, "negative": -100}"#).unwrap();
        assert_eq!(value.field("integer"), Some(&Value::Integer(42)));
        assert_eq!(value.field("negative"), Some(&Value::Integer(-100)));
        match value.field("float") {
            Some(Value::Float(f)) => assert!((f - 2.75).abs() < 0.001),
            other => panic!("expected float, got {:?}", other),
        }
    }

    #[test]
    fn integers_beyond_i64_decode_as_floats() {
        let value = decode("18446744073709551615").unwrap();
        assert_eq!(value, Value::Float(u64::MAX as f64));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(decode("{not json"), Err(Error::Decode { .. })));
    }

    #[test]
    fn unmapped_dates_encode_as_iso_strings() {
        let date = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            encode(&Value::Date(date)).unwrap(),
            "\"2000-01-01T00:00:00.000Z\""
        );
    }

    #[test]
    fn non_finite_floats_encode_as_null() {
        assert_eq!(encode(&Value::Float(f64::NAN)).unwrap(), "null");
    }

    #[test]
    fn serde_round_trip_struct() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Settings {
            theme: String,
            size: u32,
            compact: bool,
        }

        let original = Settings {
            theme: "dark".to_string(),
            size: 12,
            compact: true,
        };
        let value = to_value(&original).unwrap();
        assert!(value.is_map());
        let recovered: Settings = from_value(value).unwrap();
        assert_eq!(original, recovered);
    }
}

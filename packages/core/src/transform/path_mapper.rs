use crate::{Error, FieldPath, Value};

/// Replace the leaf at `path` inside `record` with `convert(leaf)`.
///
/// The converter sees `None` when the leaf field is absent and returns
/// `None` to leave (or make) it absent. Only the maps on the path from the
/// root to the leaf are rebuilt; every sibling subtree is moved across
/// untouched, never cloned.
///
/// A non-map anywhere on the path (including the root) stops the walk and
/// is returned unchanged, as is a missing intermediate field. Records are
/// trees; there is no cycle detection.
///
/// ```rust
/// use kvtables_core::{field_path, Value};
/// use kvtables_core::transform::map_field_path;
///
/// let record = Value::from_iter([
///     ("name", Value::from("Ann")),
///     ("profile", Value::from_iter([("age", 41i64)])),
/// ]);
///
/// let record = map_field_path(record, &field_path!("profile.age"), &mut |leaf| {
///     Ok(leaf.and_then(|v| v.as_i64()).map(|age| Value::Integer(age + 1)))
/// })
/// .unwrap();
///
/// assert_eq!(
///     record.get(&field_path!("profile.age")),
///     Some(&Value::Integer(42))
/// );
/// ```
pub fn map_field_path<F>(record: Value, path: &FieldPath, convert: &mut F) -> Result<Value, Error>
where
    F: FnMut(Option<Value>) -> Result<Option<Value>, Error>,
{
    map_components(record, path.components(), convert)
}

fn map_components<F>(value: Value, components: &[String], convert: &mut F) -> Result<Value, Error>
where
    F: FnMut(Option<Value>) -> Result<Option<Value>, Error>,
{
    let Value::Map(mut map) = value else {
        return Ok(value);
    };
    let Some((first, rest)) = components.split_first() else {
        return Ok(Value::Map(map));
    };

    if rest.is_empty() {
        let leaf = map.remove(first);
        if let Some(converted) = convert(leaf)? {
            map.insert(first.clone(), converted);
        }
    } else if let Some(child) = map.remove(first) {
        let child = map_components(child, rest, convert)?;
        map.insert(first.clone(), child);
    }

    Ok(Value::Map(map))
}

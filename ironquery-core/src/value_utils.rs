//! JSON value helpers used by the in-memory engine
//!
//! Attribute paths use dot notation (`"address.city"`, `"tags.0"`).

use serde_json::Value;
use std::cmp::Ordering;

/// Resolve a dot-notation attribute path inside a document
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use ironquery_core::value_utils::get_path;
///
/// let doc = json!({"address": {"city": "Cologne"}, "tags": ["a", "b"]});
/// assert_eq!(get_path(&doc, "address.city"), Some(&json!("Cologne")));
/// assert_eq!(get_path(&doc, "tags.1"), Some(&json!("b")));
/// assert_eq!(get_path(&doc, "address.zip"), None);
/// ```
pub fn get_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    if !path.contains('.') {
        return doc.get(path);
    }

    let mut value = doc;
    for part in path.split('.') {
        value = match value {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(value)
}

/// Order two scalars of the same JSON type
///
/// Numbers compare as f64, so `1` and `1.0` are equal. Mixed types and
/// compound values have no order and yield `None`.
pub fn compare_scalars(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(n1), Value::Number(n2)) => n1.as_f64()?.partial_cmp(&n2.as_f64()?),
        (Value::String(s1), Value::String(s2)) => Some(s1.cmp(s2)),
        (Value::Bool(b1), Value::Bool(b2)) => Some(b1.cmp(b2)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// Example-style equality: numbers by value, everything else structurally
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare_scalars(a, b) == Some(Ordering::Equal),
        _ => a == b,
    }
}

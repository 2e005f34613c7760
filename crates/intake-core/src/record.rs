//! Path-based access to the open-ended record tree.
//!
//! Parsed submissions are kept as `serde_json::Value` until they pass schema
//! validation. Every probe here returns `Option` so the validation passes can
//! walk deeply nested optional structure without caring which ancestors are
//! missing or mistyped.

use serde_json::Value;

/// Look up a dotted path (`"result_data.submission.submitted_by"`) inside a
/// record tree. Returns `None` if any segment is absent or a non-object is
/// traversed.
pub fn get_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut cur = root;
    for seg in path.split('.') {
        cur = cur.as_object()?.get(seg)?;
    }
    Some(cur)
}

pub fn get_object<'a>(root: &'a Value, path: &str) -> Option<&'a serde_json::Map<String, Value>> {
    get_path(root, path).and_then(Value::as_object)
}

pub fn get_array<'a>(root: &'a Value, path: &str) -> Option<&'a Vec<Value>> {
    get_path(root, path).and_then(Value::as_array)
}

pub fn get_str<'a>(root: &'a Value, path: &str) -> Option<&'a str> {
    get_path(root, path).and_then(Value::as_str)
}

/// A field counts as present only when it exists and is not `null`, matching
/// the required-field semantics of the submission schema.
pub fn is_present(obj: &serde_json::Map<String, Value>, key: &str) -> bool {
    matches!(obj.get(key), Some(v) if !v.is_null())
}

/// JSON type name used in type-mismatch messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "integer"
            } else {
                "number"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub fn is_integer(value: &Value) -> bool {
    matches!(value, Value::Number(n) if n.is_i64() || n.is_u64())
}

pub fn is_number(value: &Value) -> bool {
    value.is_number()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_path_walks_nested_objects() {
        let v = json!({"a": {"b": {"c": 3}}});
        assert_eq!(get_path(&v, "a.b.c"), Some(&json!(3)));
        assert_eq!(get_path(&v, "a.b.missing"), None);
        assert_eq!(get_path(&v, "a.b.c.d"), None);
    }

    #[test]
    fn presence_requires_non_null() {
        let v = json!({"x": null, "y": 0});
        let obj = v.as_object().unwrap();
        assert!(!is_present(obj, "x"));
        assert!(is_present(obj, "y"));
        assert!(!is_present(obj, "z"));
    }

    #[test]
    fn type_names_distinguish_integer_from_number() {
        assert_eq!(type_name(&json!(1)), "integer");
        assert_eq!(type_name(&json!(1.5)), "number");
        assert_eq!(type_name(&json!("s")), "string");
        assert_eq!(type_name(&json!([1])), "array");
    }
}

//! Attribute-map records exchanged with the persistence layer.
//!
//! Handlers hand candidate records to the engine as JSON attribute maps;
//! row filtering and column masking operate on this shape directly, so no
//! per-resource struct definitions are needed at the security boundary.

use serde_json::{Map, Value};

/// A candidate record as an attribute map.
pub type Record = Map<String, Value>;

/// Read a string attribute from a record.
pub fn str_attr<'a>(record: &'a Record, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str)
}

/// Build a record from a JSON object literal.
///
/// Returns `None` when the value is not an object. Mostly useful in tests
/// and at handler boundaries that already hold `serde_json::Value`s.
pub fn as_record(value: Value) -> Option<Record> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_str_attr() {
        let record = as_record(json!({"ownerId": "u1", "amount": 10})).unwrap();
        assert_eq!(str_attr(&record, "ownerId"), Some("u1"));
        assert_eq!(str_attr(&record, "amount"), None);
        assert_eq!(str_attr(&record, "missing"), None);
    }

    #[test]
    fn test_as_record_rejects_non_objects() {
        assert!(as_record(json!([1, 2, 3])).is_none());
        assert!(as_record(json!("plain")).is_none());
    }
}

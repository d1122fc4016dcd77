//! Conversion between JSON documents and Firestore REST typed values.
//!
//! Firestore wraps every value in a single-key object naming its type
//! (`{"stringValue": "x"}`, `{"integerValue": "12"}`, ...). Integers travel
//! as strings.

use serde_json::{json, Map, Number, Value};

use crate::domain::foundation::Document;

/// Encode a document body as a Firestore `fields` map.
pub fn encode_fields(document: &Document) -> Map<String, Value> {
    document
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}

pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Decode a Firestore `fields` map into a document body.
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Document, String> {
    fields
        .iter()
        .map(|(key, value)| Ok((key.clone(), decode_value(value)?)))
        .collect()
}

pub fn decode_value(value: &Value) -> Result<Value, String> {
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return Err(format!("expected a typed value, got {}", value));
    };
    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| format!("bad booleanValue {}", inner)),
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .or_else(|| inner.as_i64())
            .map(|i| Value::Number(i.into()))
            .ok_or_else(|| format!("bad integerValue {}", inner)),
        "doubleValue" => inner
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| format!("bad doubleValue {}", inner)),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| format!("bad {} {}", kind, inner)),
        "geoPointValue" => Ok(inner.clone()),
        "arrayValue" => {
            let values = inner
                .get("values")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            values
                .iter()
                .map(decode_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        "mapValue" => {
            let empty = Map::new();
            let fields = inner
                .get("fields")
                .and_then(Value::as_object)
                .unwrap_or(&empty);
            decode_fields(fields).map(Value::Object)
        }
        other => Err(format!("unsupported value type {}", other)),
    }
}

/// Quote a top-level key for an update mask when it is not a plain
/// identifier.
pub fn field_path(key: &str) -> String {
    let plain = key
        .chars()
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false)
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        key.to_string()
    } else {
        format!("`{}`", key.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_each_kind() {
        assert_eq!(encode_value(&json!(12)), json!({"integerValue": "12"}));
        assert_eq!(encode_value(&json!(12.5)), json!({"doubleValue": 12.5}));
        assert_eq!(encode_value(&json!("x")), json!({"stringValue": "x"}));
        assert_eq!(encode_value(&json!(null)), json!({"nullValue": null}));
        assert_eq!(
            encode_value(&json!([10, 12, 1990])),
            json!({"arrayValue": {"values": [
                {"integerValue": "10"}, {"integerValue": "12"}, {"integerValue": "1990"}
            ]}})
        );
    }

    #[test]
    fn nested_document_survives_encoding() {
        let doc = json!({
            "status": "succeeded",
            "amount": 1200,
            "transfer_data": {"amount": 1000, "destination": "acct_1"},
            "dob": [1, 2, 1990],
            "primary": true,
            "ratio": 0.5,
            "none": null
        });
        let doc = doc.as_object().unwrap();
        let decoded = decode_fields(&encode_fields(doc)).unwrap();
        assert_eq!(&decoded, doc);
    }

    #[test]
    fn decodes_timestamps_as_strings() {
        let value = json!({"timestampValue": "2024-01-01T00:00:00Z"});
        assert_eq!(decode_value(&value).unwrap(), json!("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn empty_array_and_map_decode() {
        assert_eq!(decode_value(&json!({"arrayValue": {}})).unwrap(), json!([]));
        assert_eq!(decode_value(&json!({"mapValue": {}})).unwrap(), json!({}));
    }

    #[test]
    fn rejects_untyped_values() {
        assert!(decode_value(&json!("bare")).is_err());
        assert!(decode_value(&json!({"integerValue": "twelve"})).is_err());
    }

    #[test]
    fn field_paths_are_quoted_when_needed() {
        assert_eq!(field_path("last4"), "last4");
        assert_eq!(field_path("_private"), "_private");
        assert_eq!(field_path("4digits"), "`4digits`");
        assert_eq!(field_path("a-b"), "`a-b`");
    }
}

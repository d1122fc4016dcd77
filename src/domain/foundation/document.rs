//! Schemaless document bodies and typed views over them.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::errors::ValidationError;

/// A document body: a JSON object of top-level fields.
pub type Document = serde_json::Map<String, Value>;

/// Decode a typed view of `doc`.
///
/// `what` names the document kind in the resulting error.
pub fn decode<T: DeserializeOwned>(what: &str, doc: &Document) -> Result<T, ValidationError> {
    serde_json::from_value(Value::Object(doc.clone()))
        .map_err(|e| ValidationError::invalid_format(what, e.to_string()))
}

/// Encode `value` as document fields. Non-object values are rejected.
pub fn encode<T: Serialize>(what: &str, value: &T) -> Result<Document, ValidationError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(ValidationError::invalid_format(
            what,
            format!("expected an object, got {}", other),
        )),
        Err(e) => Err(ValidationError::invalid_format(what, e.to_string())),
    }
}

/// Single-field document, the common shape of merge writes.
pub fn field(name: &str, value: impl Into<Value>) -> Document {
    let mut doc = Document::new();
    doc.insert(name.to_string(), value.into());
    doc
}

/// Non-empty string field.
pub fn str_field<'a>(doc: &'a Document, name: &str) -> Option<&'a str> {
    doc.get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Non-empty string field or a missing-field error.
pub fn required_str<'a>(doc: &'a Document, name: &str) -> Result<&'a str, ValidationError> {
    str_field(doc, name).ok_or_else(|| ValidationError::missing_field(name))
}

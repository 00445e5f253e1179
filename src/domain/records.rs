//! Schema-less records and their identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::DomainError;

/// Name of the identifier field at the API boundary.
pub const ID_FIELD: &str = "_id";

/// Opaque, store-assigned record identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The fields of a record, without its identifier.
///
/// The identifier is owned by the store, so any `_id` carried by a request body
/// is dropped on the way in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new(mut fields: Map<String, Value>) -> Self {
        fields.remove(ID_FIELD);
        Self(fields)
    }

    /// Accept a request body; only JSON objects are records.
    pub fn from_body(body: Value) -> Result<Self, DomainError> {
        match body {
            Value::Object(fields) => Ok(Self::new(fields)),
            other => Err(DomainError::validation(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Accept a bulk request body: a JSON array whose elements are all objects.
    pub fn many_from_body(body: Value) -> Result<Vec<Self>, DomainError> {
        let Value::Array(items) = body else {
            return Err(DomainError::validation(format!(
                "expected a JSON array, found {}",
                json_kind(&body)
            )));
        };

        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                Self::from_body(item).map_err(|err| match err {
                    DomainError::Validation { message } => {
                        DomainError::validation(format!("element {index}: {message}"))
                    }
                    other => other,
                })
            })
            .collect()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Shallow merge: top-level fields from `patch` win, everything else is kept.
    /// Nested objects are replaced wholesale.
    pub fn merge(&mut self, patch: &Record) {
        for (key, value) in &patch.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn merged(mut self, patch: &Record) -> Self {
        self.merge(patch);
        self
    }

    pub fn with_id(self, id: RecordId) -> StoredRecord {
        StoredRecord { id, record: self }
    }
}

/// A record together with its identifier, as the store returns it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: RecordId,
    pub record: Record,
}

impl StoredRecord {
    /// The API representation: the record's fields plus `_id` as a string.
    pub fn to_document(&self) -> Value {
        let mut fields = self.record.fields().clone();
        fields.insert(ID_FIELD.to_string(), Value::String(self.id.to_string()));
        Value::Object(fields)
    }

    pub fn into_document(self) -> Value {
        let mut fields = self.record.into_fields();
        fields.insert(ID_FIELD.to_string(), Value::String(self.id.into_string()));
        Value::Object(fields)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(value: Value) -> Record {
        Record::from_body(value).expect("object body")
    }

    #[test]
    fn from_body_rejects_non_objects() {
        for body in [json!(null), json!(1), json!("x"), json!([1, 2]), json!(true)] {
            let err = Record::from_body(body).expect_err("non-object must fail");
            assert!(matches!(err, DomainError::Validation { .. }));
        }
    }

    #[test]
    fn from_body_drops_client_identifier() {
        let record = record(json!({"_id": "forged", "name": "x"}));
        assert!(!record.fields().contains_key(ID_FIELD));
        assert_eq!(record.fields().get("name"), Some(&json!("x")));
    }

    #[test]
    fn merge_is_shallow_and_patch_wins() {
        let existing = record(json!({"a": 0, "b": 2, "nested": {"x": 1, "y": 2}}));
        let patch = record(json!({"a": 1, "nested": {"x": 9}}));

        let merged = existing.merged(&patch);

        assert_eq!(
            Value::Object(merged.into_fields()),
            json!({"a": 1, "b": 2, "nested": {"x": 9}})
        );
    }

    #[test]
    fn document_carries_identifier_as_string() {
        let stored = record(json!({"name": "x"})).with_id(RecordId::from("abc"));
        assert_eq!(stored.to_document(), json!({"name": "x", "_id": "abc"}));
        assert_eq!(stored.into_document(), json!({"name": "x", "_id": "abc"}));
    }

    #[test]
    fn many_from_body_reports_offending_element() {
        let err = Record::many_from_body(json!([{"a": 1}, 2])).expect_err("mixed array");
        match err {
            DomainError::Validation { message } => assert!(message.starts_with("element 1")),
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(Record::many_from_body(json!({"a": 1})).is_err());
        assert_eq!(
            Record::many_from_body(json!([{"a": 1}, {"b": 2}]))
                .expect("all objects")
                .len(),
            2
        );
    }
}

//! Request and response bodies of the recache HTTP API.
//!
//! Records themselves travel as plain JSON objects (`serde_json::Value`); the
//! types here cover the fixed-shape envelopes around them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MSG_CREATED: &str = "Data created";
pub const MSG_UPDATED: &str = "Data updated";
pub const MSG_PATCHED: &str = "Data patched";
pub const MSG_DELETED: &str = "Data deleted";
pub const MSG_NOT_FOUND: &str = "Data not found";
pub const MSG_CACHE_FLUSHED: &str = "Redis cache flushed successfully";
pub const MSG_CACHE_PURGED: &str = "Cached records purged";
pub const MSG_BULK_NOT_A_LIST: &str = "Input data should be a list of JSON objects";

/// `{"message": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `{"error": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub message: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkCreatedResponse {
    pub message: String,
    pub inserted_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeResponse {
    pub message: String,
    pub removed: u64,
}

/// Cache key to decoded cached value.
pub type CacheSnapshot = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub document_store: String,
    pub cache_store: String,
}

impl HealthResponse {
    pub const OK: &'static str = "ok";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointInfo {
    pub method: String,
    pub path: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceIndex {
    pub message: String,
    pub version: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_response_wire_shape() {
        let body = CreatedResponse {
            message: MSG_CREATED.to_string(),
            id: "abc".to_string(),
        };
        let value = serde_json::to_value(&body).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({"message": "Data created", "id": "abc"})
        );
    }
}

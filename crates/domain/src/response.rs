//! Response envelope
//!
//! Every Document API response is one JSON envelope with up to three parts:
//! `status` (command-specific scalars such as counts), `data` (documents and
//! the continuation token) and `errors`. A non-empty `errors` array marks the
//! call failed regardless of the HTTP status it arrived with.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Deserialized body of a Document API response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Command-specific result fields (counts, inserted ids, flags).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Map<String, Value>>,

    /// Returned documents and pagination state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ApiData>,

    /// Application-level errors. Non-empty means the command failed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ApiErrorDetail>,
}

impl ApiResponse {
    /// Whether the envelope reports an application-level failure.
    pub fn is_error(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Raw status field by key.
    pub fn status_value(&self, key: &str) -> Option<&Value> {
        self.status.as_ref().and_then(|status| status.get(key))
    }

    /// Status field interpreted as an unsigned integer.
    pub fn status_u64(&self, key: &str) -> Option<u64> {
        self.status_value(key).and_then(Value::as_u64)
    }

    /// Status field interpreted as a boolean.
    pub fn status_bool(&self, key: &str) -> Option<bool> {
        self.status_value(key).and_then(Value::as_bool)
    }

    /// The single document in `data`, when present.
    pub fn document(&self) -> Option<&Value> {
        self.data.as_ref().and_then(|data| data.document.as_ref())
    }

    /// The document list in `data`, when present.
    pub fn documents(&self) -> Option<&[Value]> {
        self.data.as_ref().and_then(|data| data.documents.as_deref())
    }

    /// Continuation token for the next page, when the result is paged.
    pub fn next_page_state(&self) -> Option<&str> {
        self.data.as_ref().and_then(|data| data.next_page_state.as_deref())
    }
}

/// Document payload of a response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiData {
    /// Single document, set by point reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<Value>,

    /// Document batch, set by queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<Value>>,

    /// Opaque continuation token. Absent on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_state: Option<String>,
}

/// One application-level error reported by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorDetail {
    /// Human-readable description.
    pub message: String,

    /// Stable machine-readable code, when the service provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,

    /// Any additional fields the service attached to the error.
    #[serde(default, flatten)]
    pub fields: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_full_envelope() {
        let body = json!({
            "status": { "insertedIds": [1, 2], "count": 2 },
            "data": {
                "documents": [{"_id": 1}, {"_id": 2}],
                "nextPageState": "abc123"
            }
        });

        let response: ApiResponse = serde_json::from_value(body).unwrap();
        assert!(!response.is_error());
        assert_eq!(response.status_u64("count"), Some(2));
        assert_eq!(response.documents().map(<[Value]>::len), Some(2));
        assert_eq!(response.next_page_state(), Some("abc123"));
    }

    #[test]
    fn missing_sections_default_cleanly() {
        let response: ApiResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.status.is_none());
        assert!(response.data.is_none());
        assert!(response.errors.is_empty());
        assert!(!response.is_error());
    }

    #[test]
    fn errors_flag_the_envelope_even_with_data() {
        let body = json!({
            "data": { "document": {"_id": 9} },
            "errors": [
                { "message": "collection quota reached", "errorCode": "QUOTA" }
            ]
        });

        let response: ApiResponse = serde_json::from_value(body).unwrap();
        assert!(response.is_error());
        assert_eq!(response.errors[0].error_code.as_deref(), Some("QUOTA"));
        assert!(response.document().is_some());
    }

    #[test]
    fn unknown_error_fields_are_retained() {
        let body = json!({
            "errors": [
                { "message": "boom", "family": "SERVER", "scope": "EMBEDDING" }
            ]
        });

        let response: ApiResponse = serde_json::from_value(body).unwrap();
        assert_eq!(
            response.errors[0].fields.get("family"),
            Some(&json!("SERVER"))
        );
    }
}

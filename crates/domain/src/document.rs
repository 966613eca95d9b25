//! Schemaless JSON documents

use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{Error, Result};

/// Reserved field holding the document identifier.
pub const ID_FIELD: &str = "_id";

/// A schemaless JSON document stored in a collection.
///
/// Thin wrapper around a JSON object that keeps field order stable and adds
/// typed accessors on top of raw values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build a document from an arbitrary JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the value is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::Validation(format!(
                "document must be a JSON object, got {other}"
            ))),
        }
    }

    /// Identifier of the document, when present.
    pub fn id(&self) -> Option<&Value> {
        self.0.get(ID_FIELD)
    }

    /// Set the document identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.0.insert(ID_FIELD.to_string(), id.into());
        self
    }

    /// Add a field, replacing any previous value under the same key.
    #[must_use]
    pub fn append(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Raw value of a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Deserialize a field into a concrete type, `None` when the field is
    /// missing or does not deserialize cleanly.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.0
            .get(key)
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
    }

    /// Number of top-level fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the document has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the document into its JSON object form.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Borrow the underlying field map.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        doc.into_value()
    }
}

/// Extended-JSON helpers for values the wire format encodes as tagged
/// objects rather than JSON primitives.
pub mod ejson {
    use super::{DateTime, TimeZone, Utc, Value};

    /// Encode a timestamp as `{"$date": <epoch millis>}`.
    pub fn date(ts: DateTime<Utc>) -> Value {
        serde_json::json!({ "$date": ts.timestamp_millis() })
    }

    /// Decode a `{"$date": <epoch millis>}` value back into a timestamp.
    pub fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
        let millis = value.get("$date")?.as_i64()?;
        Utc.timestamp_millis_opt(millis).single()
    }
}

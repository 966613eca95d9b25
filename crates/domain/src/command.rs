//! Wire-level commands
//!
//! A [`Command`] is the unit of work the engine executes: a name, a JSON
//! payload, optional extra headers and an optional per-call deadline. Once
//! constructed a command never changes; retries re-send the same value.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::{Map, Value};

/// A named command addressed to the Document API.
///
/// Serializes to the single-key wire form `{"<name>": { ...payload }}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    name: String,
    payload: Map<String, Value>,
    headers: HashMap<String, String>,
    deadline: Option<Duration>,
}

impl Command {
    /// Create a command with an empty payload.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: Map::new(),
            headers: HashMap::new(),
            deadline: None,
        }
    }

    /// Replace the whole payload object.
    #[must_use]
    pub fn with_payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = payload;
        self
    }

    /// Add one payload field, replacing any previous value under the key.
    ///
    /// Fields set to `Value::Null` are dropped so optional parameters can be
    /// passed through unconditionally.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        if !value.is_null() {
            self.payload.insert(key.into(), value);
        }
        self
    }

    /// Attach an extra header sent only with this command.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Override the client-level deadline for this command.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Command name, the single top-level key on the wire.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Payload object carried under the command name.
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Extra headers for this command.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Per-command deadline override, when set.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Wire form of the command: `{"<name>": { ...payload }}`.
    pub fn wire_body(&self) -> Value {
        let mut outer = Map::with_capacity(1);
        outer.insert(self.name.clone(), Value::Object(self.payload.clone()));
        Value::Object(outer)
    }
}

//! Error types used throughout the client

use serde_json::Value;
use thiserror::Error;

use crate::execution::ExecutionInfo;
use crate::response::{ApiErrorDetail, ApiResponse};

/// Detail of one failed chunk in a bulk run.
#[derive(Debug, Clone)]
pub struct ChunkFailure {
    /// Position of the chunk in the partitioned input, zero-based.
    pub chunk_index: usize,
    /// Summary of what went wrong.
    pub message: String,
    /// Application-level errors reported for the chunk, when any.
    pub errors: Vec<ApiErrorDetail>,
}

/// Successes collected before or alongside chunk failures in a bulk run.
#[derive(Debug, Clone, Default)]
pub struct PartialBulk {
    /// Identifiers of documents that were inserted.
    pub inserted_ids: Vec<Value>,
    /// Envelopes of chunks that completed.
    pub responses: Vec<ApiResponse>,
}

/// Main error type for Folio
#[derive(Error, Debug)]
pub enum Error {
    /// Client-side input rejected before anything was sent. Never retried.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The request never produced a usable response, retries included.
    #[error("Transport failure: {message}")]
    Transport {
        /// What failed at the connection or protocol level.
        message: String,
        /// Whether the condition was classified transient.
        retryable: bool,
    },

    /// The service answered with a non-empty `errors` array.
    #[error("Command '{}' failed: {}", .info.command().name(), first_error(.info))]
    Api {
        /// Full record of the failed execution.
        info: Box<ExecutionInfo>,
    },

    /// A count came back larger than the caller's upper bound.
    #[error("Document count exceeds upper bound {upper_bound}")]
    TooManyResults {
        /// Count observed before giving up.
        count: u64,
        /// Bound the caller requested.
        upper_bound: u64,
    },

    /// One or more chunks of a bulk run failed.
    #[error("Bulk run failed in {} chunk(s)", .failures.len())]
    Aggregated {
        /// Successes gathered before or alongside the failures.
        partial: Box<PartialBulk>,
        /// Per-chunk failure detail, ordered by chunk index.
        failures: Vec<ChunkFailure>,
    },

    /// The caller used an object outside its legal lifecycle.
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// The response shape does not support the requested mapping.
    #[error("Cannot map response: {0}")]
    Mapping(String),
}

impl Error {
    /// Whether the condition may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { retryable: true, .. })
    }

    /// Transport error with transient classification.
    pub fn transport(message: impl Into<String>, retryable: bool) -> Self {
        Self::Transport { message: message.into(), retryable }
    }

    /// Application failure carrying its execution record.
    pub fn api(info: ExecutionInfo) -> Self {
        Self::Api { info: Box::new(info) }
    }
}

fn first_error(info: &ExecutionInfo) -> String {
    info.error_details()
        .first()
        .map_or_else(|| "unknown error".to_string(), |detail| detail.message.clone())
}

/// Result type alias for Folio operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::command::Command;
    use crate::execution::ExecutionInfoBuilder;

    #[test]
    fn api_error_display_quotes_first_service_error() {
        let command = Command::new("insertOne");
        let mut builder = ExecutionInfoBuilder::new(&command);
        let response: ApiResponse = serde_json::from_value(json!({
            "errors": [{ "message": "document already exists" }]
        }))
        .unwrap();
        builder.api_response(&response);

        let error = Error::api(builder.build());
        assert_eq!(
            error.to_string(),
            "Command 'insertOne' failed: document already exists"
        );
    }

    #[test]
    fn only_transient_transport_errors_are_retryable() {
        assert!(Error::transport("connection reset", true).is_retryable());
        assert!(!Error::transport("TLS handshake rejected", false).is_retryable());
        assert!(!Error::Validation("bad filter".into()).is_retryable());
    }

    #[test]
    fn aggregated_error_reports_failure_count() {
        let error = Error::Aggregated {
            partial: Box::new(PartialBulk::default()),
            failures: vec![
                ChunkFailure { chunk_index: 1, message: "boom".into(), errors: Vec::new() },
                ChunkFailure { chunk_index: 3, message: "boom".into(), errors: Vec::new() },
            ],
        };
        assert_eq!(error.to_string(), "Bulk run failed in 2 chunk(s)");
    }
}

//! Transport port
//!
//! The engine never talks HTTP directly; it hands a fully-prepared request
//! to whatever implements [`CommandTransport`]. The adapter owns connection
//! management and the retry loop, so a `roundtrip` that returns has already
//! exhausted its transient-failure budget.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use folio_domain::Result;
use serde_json::Value;

/// A prepared request to one endpoint, headers and deadline included.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// Absolute URL of the command endpoint.
    pub url: String,
    /// JSON body in the single-key wire form.
    pub body: Value,
    /// All headers for the request, authentication included.
    pub headers: HashMap<String, String>,
    /// Deadline applied to each attempt; a retried call may take up to
    /// attempts x timeout plus backoff overall.
    pub timeout: Duration,
}

/// The raw result of a dispatched request.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status of the final attempt.
    pub status: u16,
    /// Response headers of the final attempt.
    pub headers: HashMap<String, String>,
    /// Raw response body, expected to hold the envelope.
    pub body: String,
}

/// Dispatches prepared requests and absorbs transient failures.
///
/// Implementations retry transient conditions internally; a returned error
/// is final. Non-2xx statuses that are not transient come back as ordinary
/// responses so envelope inspection stays the single source of truth.
#[async_trait]
pub trait CommandTransport: Send + Sync {
    /// Send the request, retrying transient failures, and return the final
    /// response.
    async fn roundtrip(&self, request: TransportRequest) -> Result<TransportResponse>;
}

//! Client-level constants
//!
//! Centralized location for wire header names, protocol defaults and the
//! hard limits enforced before a command leaves the client.

// Protocol defaults
pub const DEFAULT_API_VERSION: &str = "v1";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;

// Client-side limits
pub const DEFAULT_MAX_DOCUMENTS_COUNT: u64 = 1000;
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 20;
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 20;
pub const DEFAULT_INSERT_CONCURRENCY: usize = 1;

// Header names
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_ACCEPT: &str = "Accept";
pub const HEADER_USER_AGENT: &str = "User-Agent";
pub const HEADER_REQUESTED_WITH: &str = "X-Requested-With";
pub const HEADER_REQUEST_ID: &str = "X-Request-Id";
pub const HEADER_AUTHORIZATION: &str = "Authorization";
// Kept for services that still read the pre-bearer token header.
pub const HEADER_LEGACY_TOKEN: &str = "X-Folio-Token";

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// HTTP statuses treated as transient by the default retry policy.
pub const RETRYABLE_STATUS_CODES: [u16; 4] = [500, 502, 503, 504];

/// Client identifier reported in the user agent.
pub const CLIENT_NAME: &str = "folio";
/// Client version reported in the user agent.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

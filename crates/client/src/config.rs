//! Client configuration
//!
//! Plain validated struct, constructed once and treated as immutable. The
//! builder-free shape keeps call sites honest: everything the transport and
//! runner need is decided before the first command goes out.

use std::time::Duration;

use folio_common::RetryOptions;
use folio_domain::constants::{
    CLIENT_NAME, CLIENT_VERSION, DEFAULT_API_VERSION, DEFAULT_CONNECT_TIMEOUT_SECS,
    DEFAULT_MAX_CHUNK_SIZE, DEFAULT_MAX_DOCUMENTS_COUNT, DEFAULT_MAX_PAGE_SIZE,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
use folio_domain::{Error, Result};
use url::Url;

/// Configuration for the Folio client.
#[derive(Debug, Clone)]
pub struct FolioConfig {
    /// API version segment of every command URL (e.g. "v1").
    pub api_version: String,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Default deadline for a whole call, retries included. Commands may
    /// override it per call.
    pub request_timeout: Duration,
    /// Retry budget and backoff for transient transport failures.
    pub retry: RetryOptions,
    /// Hard ceiling a count upper bound may not exceed.
    pub max_documents_count: u64,
    /// Largest page the service returns for one find call.
    pub max_page_size: u32,
    /// Largest chunk a bulk operation sends in one command.
    pub max_chunk_size: usize,
    /// Optional caller application name, prepended to the user agent.
    pub caller_name: Option<String>,
    /// Optional caller application version, reported with the name.
    pub caller_version: Option<String>,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_API_VERSION.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            retry: RetryOptions::default(),
            max_documents_count: DEFAULT_MAX_DOCUMENTS_COUNT,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            caller_name: None,
            caller_version: None,
        }
    }
}

impl FolioConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] on an empty api version, zero limits or
    /// an invalid retry configuration.
    pub fn validate(&self) -> Result<()> {
        if self.api_version.trim().is_empty() {
            return Err(Error::Validation("api_version must not be empty".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::Validation("request_timeout must be greater than zero".into()));
        }
        if self.max_documents_count == 0 {
            return Err(Error::Validation("max_documents_count must be greater than zero".into()));
        }
        if self.max_page_size == 0 {
            return Err(Error::Validation("max_page_size must be greater than zero".into()));
        }
        if self.max_chunk_size == 0 {
            return Err(Error::Validation("max_chunk_size must be greater than zero".into()));
        }
        self.retry
            .validate()
            .map_err(|error| Error::Validation(error.to_string()))?;
        Ok(())
    }

    /// User agent advertising the caller first and this client last.
    pub fn user_agent(&self) -> String {
        let own = format!("{CLIENT_NAME}/{CLIENT_VERSION}");
        match &self.caller_name {
            Some(name) => {
                let caller = match &self.caller_version {
                    Some(version) => format!("{name}/{version}"),
                    None => name.clone(),
                };
                format!("{caller} {own}")
            }
            None => own,
        }
    }
}

/// Parse and normalize the service endpoint, dropping any trailing slash.
///
/// # Errors
///
/// Returns [`Error::Validation`] when the endpoint is not an absolute
/// http(s) URL.
pub(crate) fn normalize_endpoint(endpoint: &str) -> Result<String> {
    let parsed = Url::parse(endpoint)
        .map_err(|error| Error::Validation(format!("invalid endpoint '{endpoint}': {error}")))?;
    if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::Validation(format!(
            "invalid endpoint '{endpoint}': expected an absolute http(s) URL"
        )));
    }
    Ok(endpoint.trim_end_matches('/').to_string())
}

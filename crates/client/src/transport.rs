//! Retrying HTTP transport
//!
//! One reqwest client behind the [`CommandTransport`] port. The attempt
//! loop lives here: transient faults are classified, the retry policy is
//! consulted after each failure and the caller only ever sees the final
//! outcome. Responses with non-transient statuses are returned as ordinary
//! responses so the runner can inspect the envelope.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use folio_common::{policies::PredicateRetry, RetryDecision, RetryOptions, RetryPolicy};
use folio_core::{CommandTransport, TransportRequest, TransportResponse};
use folio_domain::constants::RETRYABLE_STATUS_CODES;
use folio_domain::{Error, Result};
use reqwest::Client as ReqwestClient;
use tracing::{debug, warn};

use crate::config::FolioConfig;

/// One observable transport failure, as seen by the retry policy.
#[derive(Debug, Clone)]
pub enum TransportFault {
    /// The request never produced an HTTP response.
    Network {
        /// Human-readable cause.
        message: String,
        /// Whether the failure class is worth retrying at all.
        transient: bool,
    },
    /// The request produced a response with this status code.
    Status(u16),
}

impl TransportFault {
    /// Whether the default policy considers this fault transient.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { transient, .. } => *transient,
            Self::Status(code) => RETRYABLE_STATUS_CODES.contains(code),
        }
    }
}

/// Default policy: retry transient network faults and the designated
/// retryable status codes, nothing else.
pub fn default_retry_policy() -> Arc<dyn RetryPolicy<TransportFault>> {
    Arc::new(PredicateRetry::new(|fault: &TransportFault, _attempt| fault.is_transient()))
}

/// HTTP transport with built-in retry support.
pub struct HttpTransport {
    client: ReqwestClient,
    retry: RetryOptions,
    policy: Arc<dyn RetryPolicy<TransportFault>>,
}

impl HttpTransport {
    /// Build a transport from the client configuration with the default
    /// retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: &FolioConfig) -> Result<Self> {
        Self::with_policy(config, default_retry_policy())
    }

    /// Build a transport with a caller-supplied retry policy, e.g. one that
    /// only retries read commands.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the underlying HTTP client cannot be
    /// constructed.
    pub fn with_policy(
        config: &FolioConfig,
        policy: Arc<dyn RetryPolicy<TransportFault>>,
    ) -> Result<Self> {
        let client = ReqwestClient::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|error| {
                Error::transport(format!("failed to build HTTP client: {error}"), false)
            })?;

        Ok(Self { client, retry: config.retry.clone(), policy })
    }

    /// Delay before the next attempt, or `None` when the policy stops.
    fn retry_delay(&self, fault: &TransportFault, attempt: u32) -> Option<Duration> {
        match self.policy.should_retry(fault, attempt) {
            RetryDecision::Retry => Some(self.retry.delay_for(attempt)),
            RetryDecision::RetryAfter(delay) => Some(delay),
            RetryDecision::Stop => None,
        }
    }

    async fn pause(delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl CommandTransport for HttpTransport {
    async fn roundtrip(&self, request: TransportRequest) -> Result<TransportResponse> {
        let attempts = self.retry.attempts().max(1);
        let mut builder = self
            .client
            .post(&request.url)
            .timeout(request.timeout)
            .json(&request.body);
        // Apply the headers with replace semantics so entries like
        // `Content-Type`, already set by `.json()`, are not duplicated.
        let mut header_map = reqwest::header::HeaderMap::new();
        for (name, value) in &request.headers {
            match (
                reqwest::header::HeaderName::try_from(name.as_str()),
                reqwest::header::HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    header_map.insert(name, value);
                }
                // Let reqwest surface its own error for malformed entries.
                _ => builder = builder.header(name, value),
            }
        }
        builder = builder.headers(header_map);

        for attempt in 0..attempts {
            let cloned_builder = builder.try_clone().ok_or_else(|| {
                Error::transport(
                    "request body cannot be cloned; buffer the body to enable retries",
                    false,
                )
            })?;

            debug!(attempt = attempt + 1, url = %request.url, "sending command request");

            match cloned_builder.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    debug!(attempt = attempt + 1, url = %request.url, status, "received response");

                    if !response.status().is_success() && attempt + 1 < attempts {
                        let fault = TransportFault::Status(status);
                        if let Some(delay) = self.retry_delay(&fault, attempt) {
                            warn!(
                                attempt = attempt + 1,
                                status, "retryable status, repeating command request"
                            );
                            Self::pause(delay).await;
                            continue;
                        }
                    }

                    let headers = response
                        .headers()
                        .iter()
                        .map(|(name, value)| {
                            (
                                name.to_string(),
                                String::from_utf8_lossy(value.as_bytes()).into_owned(),
                            )
                        })
                        .collect::<HashMap<_, _>>();

                    let body = response.text().await.map_err(|error| {
                        Error::transport(format!("failed to read response body: {error}"), true)
                    })?;

                    return Ok(TransportResponse { status, headers, body });
                }
                Err(error) => {
                    let fault = TransportFault::Network {
                        message: error.to_string(),
                        transient: should_retry_error(&error),
                    };
                    debug!(attempt = attempt + 1, url = %request.url, error = %error, "request failed");

                    if attempt + 1 < attempts {
                        if let Some(delay) = self.retry_delay(&fault, attempt) {
                            Self::pause(delay).await;
                            continue;
                        }
                    }

                    return Err(Error::transport(
                        format!("request to {} failed: {error}", request.url),
                        fault.is_transient(),
                    ));
                }
            }
        }

        Err(Error::transport("transport exhausted retries without producing a result", false))
    }
}

fn should_retry_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_fault_transience_follows_designated_codes() {
        assert!(TransportFault::Status(500).is_transient());
        assert!(TransportFault::Status(502).is_transient());
        assert!(TransportFault::Status(503).is_transient());
        assert!(TransportFault::Status(504).is_transient());
        assert!(!TransportFault::Status(200).is_transient());
        assert!(!TransportFault::Status(404).is_transient());
        assert!(!TransportFault::Status(429).is_transient());
    }

    #[test]
    fn default_policy_stops_on_non_transient_faults() {
        let policy = default_retry_policy();
        let timeout =
            TransportFault::Network { message: "timed out".into(), transient: true };
        let bad_request = TransportFault::Status(400);

        assert_eq!(policy.should_retry(&timeout, 0), RetryDecision::Retry);
        assert_eq!(policy.should_retry(&bad_request, 0), RetryDecision::Stop);
    }
}

//! Client root
//!
//! [`FolioClient`] owns the transport and the observer registry; databases
//! and collections are cheap scoped views sharing both through one
//! [`RunnerContext`]. The transport is constructed exactly once, during
//! client construction, and handed by reference to every runner.

use std::sync::Arc;

use folio_common::RetryPolicy;
use folio_core::{CommandObserver, CommandTransport, ObserverRegistry, RunnerContext};
use folio_domain::{Error, Result};

use crate::config::{normalize_endpoint, FolioConfig};
use crate::database::Database;
use crate::transport::{HttpTransport, TransportFault};

/// Entry point for talking to a Folio Document API deployment.
#[derive(Clone)]
pub struct FolioClient {
    endpoint: String,
    config: FolioConfig,
    ctx: Arc<RunnerContext>,
}

impl FolioClient {
    /// Connect to an endpoint with the given token and configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] on a malformed endpoint or
    /// configuration, [`Error::Transport`] if the HTTP client cannot be
    /// built.
    pub fn new(
        endpoint: impl Into<String>,
        token: impl Into<String>,
        config: FolioConfig,
    ) -> Result<Self> {
        FolioClientBuilder::default()
            .endpoint(endpoint)
            .token(token)
            .config(config)
            .build()
    }

    /// Start building a client for fluent configuration.
    pub fn builder() -> FolioClientBuilder {
        FolioClientBuilder::default()
    }

    /// Scoped view over one keyspace.
    pub fn database(&self, keyspace: impl Into<String>) -> Database {
        Database::new(
            self.endpoint.clone(),
            keyspace.into(),
            self.config.clone(),
            Arc::clone(&self.ctx),
        )
    }

    /// Register an observer under a name; an existing observer with the
    /// same name is replaced.
    pub fn register_observer(&self, name: impl Into<String>, observer: Arc<dyn CommandObserver>) {
        self.ctx.observers.register(name, observer);
    }

    /// Remove an observer; returns whether one was registered.
    pub fn remove_observer(&self, name: &str) -> bool {
        self.ctx.observers.remove(name)
    }

    /// Endpoint this client talks to, normalized.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Configuration this client was built with.
    pub fn config(&self) -> &FolioConfig {
        &self.config
    }
}

/// Builder for [`FolioClient`].
#[derive(Default)]
pub struct FolioClientBuilder {
    endpoint: Option<String>,
    token: Option<String>,
    config: Option<FolioConfig>,
    retry_policy: Option<Arc<dyn RetryPolicy<TransportFault>>>,
    transport: Option<Arc<dyn CommandTransport>>,
}

impl FolioClientBuilder {
    /// Set the service endpoint (absolute http(s) URL).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the authentication token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the configuration; defaults apply otherwise.
    pub fn config(mut self, config: FolioConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the default retry policy, e.g. to restrict retries to
    /// read-only commands.
    pub fn retry_policy(mut self, policy: Arc<dyn RetryPolicy<TransportFault>>) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Replace the whole transport. Overrides `retry_policy`.
    pub fn transport(mut self, transport: Arc<dyn CommandTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when endpoint or token are missing or
    /// malformed, or when the configuration fails validation.
    pub fn build(self) -> Result<FolioClient> {
        let endpoint = self
            .endpoint
            .ok_or_else(|| Error::Validation("endpoint not set".to_string()))?;
        let token = self.token.ok_or_else(|| Error::Validation("token not set".to_string()))?;
        if token.trim().is_empty() {
            return Err(Error::Validation("token must not be empty".to_string()));
        }

        let config = self.config.unwrap_or_default();
        config.validate()?;
        let endpoint = normalize_endpoint(&endpoint)?;

        let transport: Arc<dyn CommandTransport> = match self.transport {
            Some(transport) => transport,
            None => {
                let policy = self
                    .retry_policy
                    .unwrap_or_else(crate::transport::default_retry_policy);
                Arc::new(HttpTransport::with_policy(&config, policy)?)
            }
        };

        let ctx = Arc::new(RunnerContext {
            transport,
            observers: Arc::new(ObserverRegistry::new()),
            token,
            user_agent: config.user_agent(),
            default_deadline: config.request_timeout,
        });

        Ok(FolioClient { endpoint, config, ctx })
    }
}

//! Command runner
//!
//! One runner per endpoint scope. Running a command is always the same
//! sequence: serialize, assemble headers, dispatch through the transport,
//! classify the envelope, freeze the execution record, fan it out to
//! observers, then return or fail. Observers are notified on every path,
//! including calls that never produced a response.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use folio_domain::constants::{
    CONTENT_TYPE_JSON, HEADER_ACCEPT, HEADER_AUTHORIZATION, HEADER_CONTENT_TYPE,
    HEADER_LEGACY_TOKEN, HEADER_REQUESTED_WITH, HEADER_REQUEST_ID, HEADER_USER_AGENT,
};
use folio_domain::{ApiResponse, Command, Error, ExecutionInfoBuilder, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::observer::ObserverRegistry;
use crate::port::{CommandTransport, TransportRequest};

/// State shared by every runner a client hands out: the one transport
/// instance, the observer registry and the credentials.
pub struct RunnerContext {
    /// Transport all commands are dispatched through.
    pub transport: Arc<dyn CommandTransport>,
    /// Observers notified after every call.
    pub observers: Arc<ObserverRegistry>,
    /// Bearer token presented on every request.
    pub token: String,
    /// User agent identifying client and caller.
    pub user_agent: String,
    /// Deadline applied when a command carries no override.
    pub default_deadline: Duration,
}

/// Executes commands against one collection- or database-scoped endpoint.
#[derive(Clone)]
pub struct CommandRunner {
    endpoint: String,
    ctx: Arc<RunnerContext>,
}

impl CommandRunner {
    /// Runner bound to an absolute endpoint URL.
    pub fn new(endpoint: impl Into<String>, ctx: Arc<RunnerContext>) -> Self {
        Self { endpoint: endpoint.into(), ctx }
    }

    /// Endpoint this runner posts to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Registry shared with the owning client.
    pub fn observers(&self) -> &Arc<ObserverRegistry> {
        &self.ctx.observers
    }

    /// Execute a command and return its envelope.
    ///
    /// # Errors
    ///
    /// [`Error::Transport`] when no usable response arrived, retries
    /// included; [`Error::Api`] when the envelope carries errors, regardless
    /// of HTTP status.
    #[instrument(skip(self, command), fields(command = %command.name(), endpoint = %self.endpoint))]
    pub async fn run(&self, command: &Command) -> Result<ApiResponse> {
        let mut recorder = ExecutionInfoBuilder::new(command);

        let request = TransportRequest {
            url: self.endpoint.clone(),
            body: command.wire_body(),
            headers: self.build_headers(command),
            timeout: command.deadline().unwrap_or(self.ctx.default_deadline),
        };

        let raw = match self.ctx.transport.roundtrip(request).await {
            Ok(raw) => raw,
            Err(error) => {
                self.ctx.observers.notify(Arc::new(recorder.build()));
                return Err(error);
            }
        };

        recorder.http_response(raw.status, raw.headers);

        let response: ApiResponse = match serde_json::from_str(&raw.body) {
            Ok(response) => response,
            Err(error) => {
                self.ctx.observers.notify(Arc::new(recorder.build()));
                return Err(Error::transport(
                    format!("unexpected response body (HTTP {}): {error}", raw.status),
                    false,
                ));
            }
        };

        recorder.api_response(&response);
        let info = Arc::new(recorder.build());
        self.ctx.observers.notify(Arc::clone(&info));

        if response.is_error() {
            return Err(Error::Api { info: Box::new((*info).clone()) });
        }

        debug!(status = raw.status, "command completed");
        Ok(response)
    }

    /// Execute a command and map the returned document(s) into `T`.
    ///
    /// Maps `data.document` when present, otherwise `data.documents` as an
    /// array.
    ///
    /// # Errors
    ///
    /// Everything [`Self::run`] returns, plus [`Error::Mapping`] when the
    /// response holds neither a document nor a document list, or the JSON
    /// does not fit `T`.
    pub async fn run_as<T: DeserializeOwned>(&self, command: &Command) -> Result<T> {
        let response = self.run(command).await?;

        let value = response
            .document()
            .cloned()
            .or_else(|| response.documents().map(|docs| Value::Array(docs.to_vec())))
            .ok_or_else(|| {
                Error::Mapping("response carries neither 'document' nor 'documents'".into())
            })?;

        serde_json::from_value(value)
            .map_err(|error| Error::Mapping(format!("response does not fit target type: {error}")))
    }

    fn build_headers(&self, command: &Command) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert(HEADER_CONTENT_TYPE.to_string(), CONTENT_TYPE_JSON.to_string());
        headers.insert(HEADER_ACCEPT.to_string(), CONTENT_TYPE_JSON.to_string());
        headers.insert(HEADER_USER_AGENT.to_string(), self.ctx.user_agent.clone());
        headers.insert(HEADER_REQUESTED_WITH.to_string(), self.ctx.user_agent.clone());
        headers.insert(HEADER_REQUEST_ID.to_string(), Uuid::new_v4().to_string());
        headers
            .insert(HEADER_AUTHORIZATION.to_string(), format!("Bearer {}", self.ctx.token));
        headers.insert(HEADER_LEGACY_TOKEN.to_string(), self.ctx.token.clone());
        for (name, value) in command.headers() {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }
}

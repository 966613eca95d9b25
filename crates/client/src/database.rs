//! Keyspace-scoped view
//!
//! A [`Database`] runs keyspace-level commands (collection metadata) and
//! hands out [`Collection`] views. It shares the client's transport and
//! observers through the same [`RunnerContext`].

use std::sync::Arc;

use folio_core::{CommandRunner, RunnerContext};
use folio_domain::{Command, Error, Result};
use serde_json::json;
use tracing::instrument;

use crate::collection::Collection;
use crate::config::FolioConfig;

/// One keyspace of a Folio deployment.
#[derive(Clone)]
pub struct Database {
    endpoint: String,
    keyspace: String,
    config: FolioConfig,
    ctx: Arc<RunnerContext>,
    runner: CommandRunner,
}

impl Database {
    pub(crate) fn new(
        endpoint: String,
        keyspace: String,
        config: FolioConfig,
        ctx: Arc<RunnerContext>,
    ) -> Self {
        let base_url = format!("{endpoint}/{}/{keyspace}", config.api_version);
        let runner = CommandRunner::new(base_url, Arc::clone(&ctx));
        Self { endpoint, keyspace, config, ctx, runner }
    }

    /// Keyspace name this view is scoped to.
    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    /// URL keyspace-level commands are posted to.
    pub fn base_url(&self) -> &str {
        self.runner.endpoint()
    }

    /// Scoped view over one collection.
    pub fn collection(&self, name: impl Into<String>) -> Collection {
        Collection::new(
            self.endpoint.clone(),
            self.keyspace.clone(),
            name.into(),
            self.config.clone(),
            Arc::clone(&self.ctx),
        )
    }

    /// Create a collection; succeeds when it already exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] when the service rejects the command,
    /// [`Error::Transport`] on exhausted retries.
    #[instrument(skip(self), fields(keyspace = %self.keyspace, collection = %name))]
    pub async fn create_collection(&self, name: &str) -> Result<()> {
        let command = Command::new("createCollection").with_field("name", json!(name));
        self.runner.run(&command).await?;
        Ok(())
    }

    /// Drop a collection and everything in it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] when the service rejects the command,
    /// [`Error::Transport`] on exhausted retries.
    #[instrument(skip(self), fields(keyspace = %self.keyspace, collection = %name))]
    pub async fn drop_collection(&self, name: &str) -> Result<()> {
        let command = Command::new("deleteCollection").with_field("name", json!(name));
        self.runner.run(&command).await?;
        Ok(())
    }

    /// Names of all collections in this keyspace.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] when the service rejects the command,
    /// [`Error::Mapping`] when the response lacks the collection list.
    #[instrument(skip(self), fields(keyspace = %self.keyspace))]
    pub async fn list_collection_names(&self) -> Result<Vec<String>> {
        let command = Command::new("findCollections");
        let response = self.runner.run(&command).await?;
        let names = response
            .status_value("collections")
            .cloned()
            .ok_or_else(|| Error::Mapping("response carries no collection list".to_string()))?;
        serde_json::from_value(names)
            .map_err(|error| Error::Mapping(format!("malformed collection list: {error}")))
    }
}

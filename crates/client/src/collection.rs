//! Collection-scoped operations
//!
//! Every method builds one or more [`Command`]s, runs them through the
//! shared [`CommandRunner`] and lifts the envelope into a typed result.
//! Multi-document operations go through the bulk executor; paged reads go
//! through [`FindCursor`].

use std::sync::Arc;

use folio_core::{
    build_find_command, partition, BulkExecutor, ChunkOutcome, CommandRunner, FindCursor,
    RunnerContext,
};
use folio_domain::{
    BulkWriteOptions, BulkWriteResult, Command, DeleteResult, Document, Error, FindOptions,
    InsertManyOptions, InsertManyResult, InsertOneResult, Page, Result, UpdateOptions,
    UpdateResult,
};
use serde_json::{json, Map, Value};
use tracing::instrument;

use crate::config::FolioConfig;

/// One collection of documents inside a keyspace.
#[derive(Clone)]
pub struct Collection {
    keyspace: String,
    name: String,
    config: FolioConfig,
    runner: CommandRunner,
}

impl Collection {
    pub(crate) fn new(
        endpoint: String,
        keyspace: String,
        name: String,
        config: FolioConfig,
        ctx: Arc<RunnerContext>,
    ) -> Self {
        let base_url = format!("{endpoint}/{}/{keyspace}/{name}", config.api_version);
        let runner = CommandRunner::new(base_url, ctx);
        Self { keyspace, name, config, runner }
    }

    /// Collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Keyspace this collection belongs to.
    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    /// URL collection commands are posted to.
    pub fn base_url(&self) -> &str {
        self.runner.endpoint()
    }

    /// Insert one document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] when the service rejects the document,
    /// [`Error::Transport`] on exhausted retries.
    #[instrument(skip(self, document), fields(collection = %self.name))]
    pub async fn insert_one(&self, document: &Document) -> Result<InsertOneResult> {
        let command = Command::new("insertOne").with_field("document", document.clone());
        let response = self.runner.run(&command).await?;
        let inserted_id = response
            .status_value("insertedIds")
            .and_then(Value::as_array)
            .and_then(|ids| ids.first())
            .cloned()
            .unwrap_or(Value::Null);
        Ok(InsertOneResult { inserted_id })
    }

    /// Insert many documents, chunked and executed under the given bulk
    /// discipline.
    ///
    /// Ordered runs stop at the first failing chunk; the error then carries
    /// the ids of every document inserted before it. Unordered runs attempt
    /// every chunk and aggregate all failures into one error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] on a bad option combination or a chunk
    /// size above the configured maximum, [`Error::Aggregated`] when one or
    /// more chunks fail.
    #[instrument(skip(self, documents, options), fields(collection = %self.name, documents = documents.len()))]
    pub async fn insert_many(
        &self,
        documents: Vec<Document>,
        options: &InsertManyOptions,
    ) -> Result<InsertManyResult> {
        options.validate()?;
        if documents.is_empty() {
            return Ok(InsertManyResult::default());
        }

        if options.chunk_size > self.config.max_chunk_size {
            return Err(Error::Validation(format!(
                "chunk_size {} exceeds the maximum of {}",
                options.chunk_size, self.config.max_chunk_size
            )));
        }
        let chunks = partition(documents, options.chunk_size);
        let payloads = chunks
            .iter()
            .map(|chunk| serde_json::to_value(chunk))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|error| Error::Validation(format!("unserializable document: {error}")))?;

        let ordered = options.ordered;
        let deadline = options.deadline;
        let runner = &self.runner;
        let payloads = &payloads;

        let executor = BulkExecutor::new(ordered, options.concurrency);
        let outcomes = executor
            .execute(payloads.len(), |index| async move {
                let mut command = Command::new("insertMany")
                    .with_field("documents", payloads[index].clone())
                    .with_field("options", json!({ "ordered": ordered }));
                if let Some(deadline) = deadline {
                    command = command.with_deadline(deadline);
                }
                let response = runner.run(&command).await?;
                Ok(ChunkOutcome::from_insert_response(index, response))
            })
            .await?;

        let inserted_ids =
            outcomes.into_iter().flat_map(|outcome| outcome.inserted_ids).collect();
        Ok(InsertManyResult { inserted_ids })
    }

    /// Lazy cursor over every document the filter matches.
    pub fn find(&self, filter: Value, options: FindOptions) -> FindCursor<Document> {
        FindCursor::new(self.runner.clone(), filter, options)
    }

    /// The first document the filter matches, if any.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] when the service rejects the query,
    /// [`Error::Mapping`] on a malformed response document.
    #[instrument(skip(self, filter), fields(collection = %self.name))]
    pub async fn find_one(&self, filter: Value) -> Result<Option<Document>> {
        let command = Command::new("findOne").with_field("filter", filter);
        let response = self.runner.run(&command).await?;
        match response.document() {
            Some(document) => {
                let document = serde_json::from_value(document.clone())
                    .map_err(|error| Error::Mapping(format!("malformed document: {error}")))?;
                Ok(Some(document))
            }
            None => Ok(None),
        }
    }

    /// One page of matching documents plus its continuation token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] when the service rejects the query,
    /// [`Error::Mapping`] on a malformed response document.
    #[instrument(skip(self, filter, options), fields(collection = %self.name))]
    pub async fn find_page(
        &self,
        filter: Value,
        options: &FindOptions,
    ) -> Result<Page<Document>> {
        let command = build_find_command(&filter, options);
        let response = self.runner.run(&command).await?;
        let raw = response.documents().map(<[Value]>::to_vec).unwrap_or_default();
        let mut results = Vec::with_capacity(raw.len());
        for value in raw {
            results.push(
                serde_json::from_value(value)
                    .map_err(|error| Error::Mapping(format!("malformed document: {error}")))?,
            );
        }
        Ok(Page::new(results, response.next_page_state().map(str::to_string)))
    }

    /// Update the first document the filter matches.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] when the service rejects the update.
    #[instrument(skip(self, filter, update, options), fields(collection = %self.name))]
    pub async fn update_one(
        &self,
        filter: Value,
        update: Value,
        options: &UpdateOptions,
    ) -> Result<UpdateResult> {
        let mut command =
            Command::new("updateOne").with_field("filter", filter).with_field("update", update);
        if options.upsert {
            command = command.with_field("options", json!({ "upsert": true }));
        }
        let response = self.runner.run(&command).await?;
        Ok(UpdateResult::from_response(&response))
    }

    /// Update every document the filter matches, following continuation
    /// tokens until the service reports the run complete.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] when the service rejects the update.
    #[instrument(skip(self, filter, update, options), fields(collection = %self.name))]
    pub async fn update_many(
        &self,
        filter: Value,
        update: Value,
        options: &UpdateOptions,
    ) -> Result<UpdateResult> {
        let mut total = UpdateResult::default();
        let mut page_state: Option<String> = None;

        loop {
            let mut wire_options = Map::new();
            if options.upsert {
                wire_options.insert("upsert".to_string(), Value::Bool(true));
            }
            if let Some(state) = &page_state {
                wire_options.insert("pageState".to_string(), state.clone().into());
            }

            let mut command = Command::new("updateMany")
                .with_field("filter", filter.clone())
                .with_field("update", update.clone());
            if !wire_options.is_empty() {
                command = command.with_field("options", Value::Object(wire_options));
            }

            let response = self.runner.run(&command).await?;
            let batch = UpdateResult::from_response(&response);
            total.matched_count += batch.matched_count;
            total.modified_count += batch.modified_count;
            if total.upserted_id.is_none() {
                total.upserted_id = batch.upserted_id;
            }

            match response.status_value("nextPageState").and_then(Value::as_str) {
                Some(state) => page_state = Some(state.to_string()),
                None => break,
            }
        }

        Ok(total)
    }

    /// Delete the first document the filter matches.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] when the service rejects the delete.
    #[instrument(skip(self, filter), fields(collection = %self.name))]
    pub async fn delete_one(&self, filter: Value) -> Result<DeleteResult> {
        let command = Command::new("deleteOne").with_field("filter", filter);
        let response = self.runner.run(&command).await?;
        Ok(DeleteResult { deleted_count: response.status_u64("deletedCount").unwrap_or(0) })
    }

    /// Delete every document the filter matches, repeating the command while
    /// the service reports more matching data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] when the service rejects the delete.
    #[instrument(skip(self, filter), fields(collection = %self.name))]
    pub async fn delete_many(&self, filter: Value) -> Result<DeleteResult> {
        let mut deleted_count = 0;
        loop {
            let command = Command::new("deleteMany").with_field("filter", filter.clone());
            let response = self.runner.run(&command).await?;
            deleted_count += response.status_u64("deletedCount").unwrap_or(0);
            if response.status_bool("moreData") != Some(true) {
                break;
            }
        }
        Ok(DeleteResult { deleted_count })
    }

    /// Count the documents the filter matches, up to `upper_bound`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when `upper_bound` is zero or exceeds
    /// the configured maximum, [`Error::TooManyResults`] when the true count
    /// exceeds `upper_bound` or the service capped the count itself.
    #[instrument(skip(self, filter), fields(collection = %self.name, upper_bound))]
    pub async fn count_documents(&self, filter: Value, upper_bound: u64) -> Result<u64> {
        if upper_bound == 0 {
            return Err(Error::Validation("upper_bound must be greater than 0".into()));
        }
        if upper_bound > self.config.max_documents_count {
            return Err(Error::Validation(format!(
                "upper_bound {upper_bound} exceeds the maximum of {}",
                self.config.max_documents_count
            )));
        }

        let command = Command::new("countDocuments").with_field("filter", filter);
        let response = self.runner.run(&command).await?;
        let count = response
            .status_u64("count")
            .ok_or_else(|| Error::Mapping("count response carries no count".to_string()))?;

        if response.status_bool("moreData") == Some(true) {
            return Err(Error::TooManyResults { count, upper_bound });
        }
        if count > upper_bound {
            return Err(Error::TooManyResults { count, upper_bound });
        }
        Ok(count)
    }

    /// Delete the first matching document and return it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] when the service rejects the command,
    /// [`Error::Mapping`] on a malformed response document.
    #[instrument(skip(self, filter), fields(collection = %self.name))]
    pub async fn find_one_and_delete(&self, filter: Value) -> Result<Option<Document>> {
        let command = Command::new("findOneAndDelete").with_field("filter", filter);
        let response = self.runner.run(&command).await?;
        match response.document() {
            Some(document) => {
                let document = serde_json::from_value(document.clone())
                    .map_err(|error| Error::Mapping(format!("malformed document: {error}")))?;
                Ok(Some(document))
            }
            None => Ok(None),
        }
    }

    /// Run a heterogeneous batch of commands under the given bulk
    /// discipline, one envelope per command.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] on a bad option combination,
    /// [`Error::Aggregated`] when one or more commands fail.
    #[instrument(skip(self, commands, options), fields(collection = %self.name, commands = commands.len()))]
    pub async fn bulk_write(
        &self,
        commands: Vec<Command>,
        options: &BulkWriteOptions,
    ) -> Result<BulkWriteResult> {
        options.validate()?;
        if commands.is_empty() {
            return Ok(BulkWriteResult::default());
        }

        let deadline = options.deadline;
        let runner = &self.runner;
        let commands = &commands;

        let executor = BulkExecutor::new(options.ordered, options.concurrency);
        let outcomes = executor
            .execute(commands.len(), |index| async move {
                let response = match (deadline, commands[index].deadline()) {
                    (Some(deadline), None) => {
                        runner.run(&commands[index].clone().with_deadline(deadline)).await?
                    }
                    _ => runner.run(&commands[index]).await?,
                };
                Ok(ChunkOutcome::from_response(index, response))
            })
            .await?;

        let responses = outcomes.into_iter().map(|outcome| outcome.response).collect();
        Ok(BulkWriteResult { responses })
    }
}

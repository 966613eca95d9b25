//! Operation options
//!
//! Plain structs with explicit defaults. Each carries a `validate` that the
//! engine calls before any request is built, so a bad combination fails the
//! whole call up front instead of part-way through a bulk run.

use std::time::Duration;

use serde_json::{Map, Value};

use crate::constants::{DEFAULT_INSERT_CONCURRENCY, DEFAULT_MAX_CHUNK_SIZE};
use crate::errors::{Error, Result};

/// Options for multi-document inserts.
#[derive(Debug, Clone)]
pub struct InsertManyOptions {
    /// Insert chunks strictly in input order, stopping at the first failure.
    pub ordered: bool,
    /// Maximum chunks in flight at once. Only meaningful when unordered.
    pub concurrency: usize,
    /// Documents per request.
    pub chunk_size: usize,
    /// Deadline override applied to each chunk command.
    pub deadline: Option<Duration>,
}

impl Default for InsertManyOptions {
    fn default() -> Self {
        Self {
            ordered: true,
            concurrency: DEFAULT_INSERT_CONCURRENCY,
            chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            deadline: None,
        }
    }
}

impl InsertManyOptions {
    /// Check the option combination before any request is sent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] on a zero chunk size or concurrency, or
    /// when ordered execution is combined with concurrent chunks.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Validation("chunk_size must be greater than 0".into()));
        }
        if self.concurrency == 0 {
            return Err(Error::Validation("concurrency must be greater than 0".into()));
        }
        if self.ordered && self.concurrency > 1 {
            return Err(Error::Validation(
                "ordered inserts cannot run concurrently; set ordered=false or concurrency=1"
                    .into(),
            ));
        }
        Ok(())
    }
}

/// Options for heterogeneous command batches.
#[derive(Debug, Clone)]
pub struct BulkWriteOptions {
    /// Run commands strictly in input order, stopping at the first failure.
    pub ordered: bool,
    /// Maximum commands in flight at once. Only meaningful when unordered.
    pub concurrency: usize,
    /// Deadline override applied to each command.
    pub deadline: Option<Duration>,
}

impl Default for BulkWriteOptions {
    fn default() -> Self {
        Self { ordered: true, concurrency: 1, deadline: None }
    }
}

impl BulkWriteOptions {
    /// Check the option combination before any request is sent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] on zero concurrency or when ordered
    /// execution is combined with concurrent commands.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::Validation("concurrency must be greater than 0".into()));
        }
        if self.ordered && self.concurrency > 1 {
            return Err(Error::Validation(
                "ordered bulk writes cannot run concurrently; set ordered=false or concurrency=1"
                    .into(),
            ));
        }
        Ok(())
    }
}

/// Options shaping a `find` query.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Sort clause, passed through verbatim.
    pub sort: Option<Value>,
    /// Projection clause, passed through verbatim.
    pub projection: Option<Value>,
    /// Number of documents to skip before returning results.
    pub skip: Option<u64>,
    /// Maximum number of documents to return overall.
    pub limit: Option<u64>,
    /// Continuation token from a previous page.
    pub page_state: Option<String>,
    /// Ask the service to report similarity scores alongside documents.
    pub include_similarity: Option<bool>,
}

impl FindOptions {
    /// Wire form of the nested `options` object, `None` when every knob is
    /// unset so the field can be omitted entirely.
    pub fn to_wire_options(&self) -> Option<Value> {
        let mut options = Map::new();
        if let Some(skip) = self.skip {
            options.insert("skip".to_string(), skip.into());
        }
        if let Some(limit) = self.limit {
            options.insert("limit".to_string(), limit.into());
        }
        if let Some(page_state) = &self.page_state {
            options.insert("pageState".to_string(), page_state.clone().into());
        }
        if let Some(include_similarity) = self.include_similarity {
            options.insert("includeSimilarity".to_string(), include_similarity.into());
        }
        if options.is_empty() {
            None
        } else {
            Some(Value::Object(options))
        }
    }

    /// Copy of these options pointing at a different page.
    #[must_use]
    pub fn with_page_state(&self, page_state: Option<String>) -> Self {
        let mut next = self.clone();
        next.page_state = page_state;
        next
    }
}

/// Options for update commands.
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Insert a new document when the filter matches nothing.
    pub upsert: bool,
}

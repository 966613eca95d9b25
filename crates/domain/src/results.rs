//! Typed results of collection operations

use serde_json::Value;

use crate::errors::{Error, Result};
use crate::response::ApiResponse;

/// Result of a single-document insert.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertOneResult {
    /// Identifier of the inserted document.
    pub inserted_id: Value,
}

/// Result of a multi-document insert.
///
/// Ids are grouped by chunk and input-ordered within each chunk; ordered
/// runs therefore return them in exact caller order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertManyResult {
    /// Identifiers of all inserted documents.
    pub inserted_ids: Vec<Value>,
}

/// Result of an update command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateResult {
    /// Documents the filter matched.
    pub matched_count: u64,
    /// Documents actually modified.
    pub modified_count: u64,
    /// Identifier created by an upsert, when one happened.
    pub upserted_id: Option<Value>,
}

impl UpdateResult {
    /// Read the update counters out of a response status.
    pub fn from_response(response: &ApiResponse) -> Self {
        Self {
            matched_count: response.status_u64("matchedCount").unwrap_or(0),
            modified_count: response.status_u64("modifiedCount").unwrap_or(0),
            upserted_id: response.status_value("upsertedId").cloned(),
        }
    }
}

/// Result of a delete command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteResult {
    /// Documents removed.
    pub deleted_count: u64,
}

/// Result of a heterogeneous command batch: one envelope per command.
#[derive(Debug, Clone, Default)]
pub struct BulkWriteResult {
    /// Envelopes in command order.
    pub responses: Vec<ApiResponse>,
}

/// One page of a query result with its continuation token.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Documents in this page.
    pub results: Vec<T>,
    /// Token for the next page, absent on the last page.
    pub page_state: Option<String>,
}

impl<T> Page<T> {
    /// Page carrying the given results and continuation token.
    pub fn new(results: Vec<T>, page_state: Option<String>) -> Self {
        Self { results, page_state }
    }

    /// The first result, when the page is non-empty.
    pub fn find_first(&self) -> Option<&T> {
        self.results.first()
    }

    /// Consume the page expecting exactly one result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalState`] when the page holds zero or more than
    /// one element.
    pub fn one(self) -> Result<T> {
        let mut results = self.results.into_iter();
        match (results.next(), results.next()) {
            (Some(only), None) => Ok(only),
            (None, _) => {
                Err(Error::IllegalState("expected exactly one result, page is empty".into()))
            }
            (Some(_), Some(_)) => {
                Err(Error::IllegalState("expected exactly one result, page holds several".into()))
            }
        }
    }

    /// Whether a further page exists.
    pub fn has_next(&self) -> bool {
        self.page_state.is_some()
    }
}

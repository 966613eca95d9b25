//! Folio client
//!
//! High-level entry point for the Folio Document API: an HTTP transport
//! with bounded retries, a command runner with an execution audit trail,
//! observer fan-out, bulk execution and paged cursors.
//!
//! ```no_run
//! use folio_client::{FolioClient, FolioConfig};
//! use folio_domain::Document;
//! use serde_json::json;
//!
//! # async fn demo() -> folio_domain::Result<()> {
//! let client = FolioClient::new("https://db.example.com", "token", FolioConfig::default())?;
//! let people = client.database("app").collection("people");
//!
//! let doc = Document::from_value(json!({"_id": 1, "name": "ann"}))?;
//! people.insert_one(&doc).await?;
//!
//! let found = people.find_one(json!({"name": "ann"})).await?;
//! # let _ = found;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod collection;
pub mod config;
pub mod database;
pub mod transport;

pub use client::{FolioClient, FolioClientBuilder};
pub use collection::Collection;
pub use config::FolioConfig;
pub use database::Database;
pub use transport::{default_retry_policy, HttpTransport, TransportFault};

// The pieces callers need alongside the client surface.
pub use folio_common::{policies, BackoffStrategy, RetryDecision, RetryOptions, RetryPolicy};
pub use folio_core::{CommandObserver, FindCursor, ObserverRegistry, TracingObserver};
pub use folio_domain::{
    filters, updates, BulkWriteOptions, BulkWriteResult, Command, DeleteResult, Document, Error,
    ExecutionInfo, FindOptions, InsertManyOptions, InsertManyResult, InsertOneResult, Page,
    Result, UpdateOptions, UpdateResult,
};

//! # Folio Domain
//!
//! Data model for the Folio Document API client.
//!
//! This crate contains:
//! - Wire-level types (commands, response envelope, documents)
//! - Operation options and result types
//! - Execution records used for observability
//! - Error types and Result definitions
//! - Filter and update expression helpers
//!
//! ## Architecture
//! - No dependencies on other Folio crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod command;
pub mod constants;
pub mod document;
pub mod errors;
pub mod execution;
pub mod options;
pub mod query;
pub mod response;
pub mod results;

// Re-export commonly used items
pub use command::Command;
pub use document::Document;
pub use errors::{ChunkFailure, Error, PartialBulk, Result};
pub use execution::{ExecutionInfo, ExecutionInfoBuilder};
pub use options::{BulkWriteOptions, FindOptions, InsertManyOptions, UpdateOptions};
pub use query::{filters, updates};
pub use response::{ApiData, ApiErrorDetail, ApiResponse};
pub use results::{
    BulkWriteResult, DeleteResult, InsertManyResult, InsertOneResult, Page, UpdateResult,
};

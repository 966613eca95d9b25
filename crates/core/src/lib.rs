//! # Folio Core
//!
//! The command execution engine behind the Folio client.
//!
//! This crate contains:
//! - The transport port the engine dispatches through
//! - The command runner (serialize, dispatch, classify, record, notify)
//! - The observer registry with isolated asynchronous fan-out
//! - The bulk executor for chunked ordered/unordered runs
//! - The paginated single-use cursor
//!
//! ## Architecture
//! - Pure engine logic, no HTTP or I/O beyond the transport port
//! - Adapters (reqwest, configuration, the public facade) live in
//!   `folio-client`

pub mod bulk;
pub mod cursor;
pub mod observer;
pub mod port;
pub mod runner;

// Re-export commonly used items
pub use bulk::{partition, BulkExecutor, ChunkOutcome};
pub use cursor::{build_find_command, FindCursor};
pub use observer::{CommandObserver, ObserverRegistry, TracingObserver};
pub use port::{CommandTransport, TransportRequest, TransportResponse};
pub use runner::{CommandRunner, RunnerContext};

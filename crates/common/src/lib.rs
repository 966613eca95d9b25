//! # Folio Common
//!
//! Shared resilience primitives for the Folio client crates.
//!
//! This crate contains the retry policy machinery: backoff strategies,
//! retry decisions and the policy trait the transport consults between
//! attempts. It is pure computation; sleeping and I/O stay with the caller.
//!
//! ## Architecture
//! - No dependencies on other Folio crates
//! - No async runtime requirement

pub mod retry;

// Re-export commonly used items
pub use retry::{policies, BackoffStrategy, RetryDecision, RetryError, RetryOptions, RetryPolicy};

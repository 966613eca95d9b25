//! Observer registry
//!
//! Observers receive one [`ExecutionInfo`] per top-level call, success or
//! failure. Notification is fire-and-forget: each observer runs in its own
//! task, panics are caught and logged, and nothing an observer does can
//! change what the caller sees.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use folio_domain::ExecutionInfo;
use futures::FutureExt;
use tracing::{debug, warn};

/// Receives execution records after every command.
#[async_trait]
pub trait CommandObserver: Send + Sync {
    /// Called once per top-level call with the finished record.
    async fn on_command(&self, info: Arc<ExecutionInfo>);
}

/// Name-keyed set of observers, safe for concurrent mutation while a
/// notification pass is in flight.
#[derive(Default)]
pub struct ObserverRegistry {
    observers: DashMap<String, Arc<dyn CommandObserver>>,
}

impl ObserverRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer under a name, replacing any previous observer
    /// with the same name.
    pub fn register(&self, name: impl Into<String>, observer: Arc<dyn CommandObserver>) {
        self.observers.insert(name.into(), observer);
    }

    /// Remove an observer by name. Returns whether one was registered.
    pub fn remove(&self, name: &str) -> bool {
        self.observers.remove(name).is_some()
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether no observers are registered.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Fan the record out to every registered observer, one task each.
    ///
    /// Returns immediately; the caller never waits for observers and never
    /// learns whether one failed. A panicking observer is logged and the
    /// others still run.
    pub fn notify(&self, info: Arc<ExecutionInfo>) {
        for entry in self.observers.iter() {
            let name = entry.key().clone();
            let observer = Arc::clone(entry.value());
            let info = Arc::clone(&info);
            tokio::spawn(async move {
                if AssertUnwindSafe(observer.on_command(info)).catch_unwind().await.is_err() {
                    warn!(observer = %name, "command observer panicked; record dropped for it");
                }
            });
        }
    }
}

/// Observer logging one line per executed command.
#[derive(Debug, Default, Clone)]
pub struct TracingObserver;

#[async_trait]
impl CommandObserver for TracingObserver {
    async fn on_command(&self, info: Arc<ExecutionInfo>) {
        debug!(
            command = info.command().name(),
            http_status = info.http_status(),
            errors = info.error_details().len(),
            elapsed_ms = info.elapsed().as_millis() as u64,
            "command executed"
        );
    }
}

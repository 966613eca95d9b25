//! Bulk executor
//!
//! Chunked execution with two disciplines. Ordered runs are strictly
//! sequential and stop at the first failing chunk, so everything before the
//! failure is applied and everything after it never leaves the client.
//! Unordered runs attempt every chunk, bounded by a concurrency gate, and
//! report all failures in one aggregated error alongside the successes.

use std::future::Future;
use std::sync::Arc;

use folio_domain::{ApiResponse, ChunkFailure, Error, PartialBulk, Result};
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::debug;

/// Split items into chunks of at most `chunk_size`, preserving input order
/// across chunk boundaries.
pub fn partition<T>(items: Vec<T>, chunk_size: usize) -> Vec<Vec<T>> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::with_capacity(items.len().div_ceil(chunk_size));
    let mut rest = items;
    while rest.len() > chunk_size {
        let tail = rest.split_off(chunk_size);
        chunks.push(rest);
        rest = tail;
    }
    if !rest.is_empty() {
        chunks.push(rest);
    }
    chunks
}

/// Result of one successfully executed chunk.
#[derive(Debug, Clone)]
pub struct ChunkOutcome {
    /// Position of the chunk in the partitioned input, zero-based.
    pub chunk_index: usize,
    /// Identifiers reported under `status.insertedIds`, input-ordered.
    pub inserted_ids: Vec<Value>,
    /// Full envelope of the chunk.
    pub response: ApiResponse,
}

impl ChunkOutcome {
    /// Outcome of an insert chunk, lifting the ids out of the status.
    pub fn from_insert_response(chunk_index: usize, response: ApiResponse) -> Self {
        let inserted_ids = response
            .status_value("insertedIds")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Self { chunk_index, inserted_ids, response }
    }

    /// Outcome of a non-insert chunk; carries only the envelope.
    pub fn from_response(chunk_index: usize, response: ApiResponse) -> Self {
        Self { chunk_index, inserted_ids: Vec::new(), response }
    }
}

/// Runs pre-partitioned chunks under one of the two bulk disciplines.
#[derive(Debug, Clone, Copy)]
pub struct BulkExecutor {
    ordered: bool,
    concurrency: usize,
}

impl BulkExecutor {
    /// Executor with the given discipline. `concurrency` only matters for
    /// unordered runs and is clamped to at least 1.
    pub fn new(ordered: bool, concurrency: usize) -> Self {
        Self { ordered, concurrency: concurrency.max(1) }
    }

    /// Run `chunk_count` chunks through `run_chunk`.
    ///
    /// On success the outcomes come back in chunk order. On failure the
    /// error is [`Error::Aggregated`], carrying every completed chunk's
    /// successes plus per-chunk failure detail.
    ///
    /// # Errors
    ///
    /// [`Error::Aggregated`] as soon as one chunk fails (ordered) or after
    /// every chunk was attempted and at least one failed (unordered).
    pub async fn execute<F, Fut>(&self, chunk_count: usize, run_chunk: F) -> Result<Vec<ChunkOutcome>>
    where
        F: Fn(usize) -> Fut + Send + Sync,
        Fut: Future<Output = Result<ChunkOutcome>> + Send,
    {
        if self.ordered {
            self.execute_ordered(chunk_count, run_chunk).await
        } else {
            self.execute_unordered(chunk_count, run_chunk).await
        }
    }

    async fn execute_ordered<F, Fut>(&self, chunk_count: usize, run_chunk: F) -> Result<Vec<ChunkOutcome>>
    where
        F: Fn(usize) -> Fut + Send + Sync,
        Fut: Future<Output = Result<ChunkOutcome>> + Send,
    {
        let mut outcomes = Vec::with_capacity(chunk_count);
        for index in 0..chunk_count {
            match run_chunk(index).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(error) => {
                    debug!(chunk = index, "ordered bulk run stopped at failing chunk");
                    return Err(aggregate(outcomes, vec![to_chunk_failure(index, &error)]));
                }
            }
        }
        Ok(outcomes)
    }

    async fn execute_unordered<F, Fut>(
        &self,
        chunk_count: usize,
        run_chunk: F,
    ) -> Result<Vec<ChunkOutcome>>
    where
        F: Fn(usize) -> Fut + Send + Sync,
        Fut: Future<Output = Result<ChunkOutcome>> + Send,
    {
        let gate = Arc::new(Semaphore::new(self.concurrency));
        let run_chunk = &run_chunk;

        let runs = (0..chunk_count).map(|index| {
            let gate = Arc::clone(&gate);
            async move {
                let Ok(_permit) = gate.acquire().await else {
                    return (index, Err(Error::IllegalState("bulk concurrency gate closed".into())));
                };
                (index, run_chunk(index).await)
            }
        });

        let mut outcomes = Vec::with_capacity(chunk_count);
        let mut failures = Vec::new();
        for (index, result) in futures::future::join_all(runs).await {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(error) => failures.push(to_chunk_failure(index, &error)),
            }
        }

        if failures.is_empty() {
            Ok(outcomes)
        } else {
            debug!(failed = failures.len(), total = chunk_count, "unordered bulk run had failures");
            failures.sort_by_key(|failure| failure.chunk_index);
            Err(aggregate(outcomes, failures))
        }
    }
}

fn to_chunk_failure(chunk_index: usize, error: &Error) -> ChunkFailure {
    let errors = match error {
        Error::Api { info } => info.error_details().to_vec(),
        _ => Vec::new(),
    };
    ChunkFailure { chunk_index, message: error.to_string(), errors }
}

fn aggregate(outcomes: Vec<ChunkOutcome>, failures: Vec<ChunkFailure>) -> Error {
    let mut partial = PartialBulk::default();
    for outcome in outcomes {
        partial.inserted_ids.extend(outcome.inserted_ids);
        partial.responses.push(outcome.response);
    }
    Error::Aggregated { partial: Box::new(partial), failures }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn outcome(index: usize, ids: Vec<i64>) -> ChunkOutcome {
        let response: ApiResponse =
            serde_json::from_value(json!({ "status": { "insertedIds": ids } })).unwrap();
        ChunkOutcome::from_insert_response(index, response)
    }

    #[test]
    fn partition_preserves_order_and_remainder() {
        let chunks = partition(vec![1, 2, 3, 4, 5], 2);
        assert_eq!(chunks, vec![vec![1, 2], vec![3, 4], vec![5]]);

        let exact = partition(vec![1, 2, 3, 4], 2);
        assert_eq!(exact, vec![vec![1, 2], vec![3, 4]]);

        let empty: Vec<Vec<i32>> = partition(Vec::<i32>::new(), 3);
        assert!(empty.is_empty());
    }

    #[test]
    fn insert_outcome_lifts_ids_from_status() {
        let outcome = outcome(0, vec![1, 2]);
        assert_eq!(outcome.inserted_ids, vec![json!(1), json!(2)]);
    }

    #[tokio::test]
    async fn ordered_run_stops_at_first_failure() {
        let executor = BulkExecutor::new(true, 1);
        let result = executor
            .execute(3, |index| async move {
                match index {
                    0 => Ok(outcome(0, vec![1, 2])),
                    1 => Err(Error::transport("connection reset", true)),
                    _ => Ok(outcome(index, vec![9])),
                }
            })
            .await;

        match result {
            Err(Error::Aggregated { partial, failures }) => {
                // Chunk 0 landed, chunk 2 never ran.
                assert_eq!(partial.inserted_ids, vec![json!(1), json!(2)]);
                assert_eq!(partial.responses.len(), 1);
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].chunk_index, 1);
            }
            other => panic!("expected aggregated error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unordered_run_attempts_every_chunk() {
        let executor = BulkExecutor::new(false, 2);
        let result = executor
            .execute(4, |index| async move {
                if index == 1 {
                    Err(Error::transport("boom", true))
                } else {
                    Ok(outcome(index, vec![index as i64]))
                }
            })
            .await;

        match result {
            Err(Error::Aggregated { partial, failures }) => {
                // Every chunk accounted for exactly once.
                assert_eq!(partial.responses.len(), 3);
                assert_eq!(failures.len(), 1);
                assert_eq!(partial.responses.len() + failures.len(), 4);
                assert_eq!(failures[0].chunk_index, 1);
            }
            other => panic!("expected aggregated error, got {other:?}"),
        }
    }

    #[test]
    fn unordered_success_returns_all_outcomes_in_chunk_order() {
        tokio_test::block_on(async {
            let executor = BulkExecutor::new(false, 3);
            let outcomes = executor
                .execute(5, |index| async move { Ok(outcome(index, vec![index as i64])) })
                .await
                .unwrap();

            let indexes: Vec<usize> = outcomes.iter().map(|o| o.chunk_index).collect();
            assert_eq!(indexes, vec![0, 1, 2, 3, 4]);
        });
    }
}

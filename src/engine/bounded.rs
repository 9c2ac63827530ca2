// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};
use tracing::Instrument;

use crate::config::consts::DEFAULT_MAX_CONCURRENCY_FALLBACK;

/// Why a bounded task produced no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFailure<E> {
    /// The operation completed with its own error.
    Failed(E),
    /// The operation panicked (or its task was otherwise lost) before settling.
    Panicked(String),
}

impl<E: fmt::Display> fmt::Display for TaskFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskFailure::Failed(error) => write!(f, "{}", error),
            TaskFailure::Panicked(reason) => write!(f, "task panicked: {}", reason),
        }
    }
}

/// Runs a batch of independent async operations with at most `max_concurrency`
/// in flight, and settles every one of them.
///
/// ## Concurrency Control
/// - One tokio task per item, each gated by a `tokio::sync::Semaphore` permit
/// - A permit is released the moment an operation settles, so the next queued
///   item starts immediately; in-flight count stays at the limit while work remains
/// - `max_concurrency = 1` is fully sequential; `>= items.len()` is fully parallel
///
/// ## Error Handling
/// - An operation's `Err` is recorded for that item only; siblings keep running
/// - A panic is caught at the task boundary and recorded as [`TaskFailure::Panicked`]
/// - Nothing short-circuits: the call returns only after every item has settled
///
/// Knows nothing about graphs; any bounded fan-out can use it.
#[derive(Debug, Clone)]
pub struct BoundedExecutor {
    max_concurrency: usize,
}

impl BoundedExecutor {
    /// Create an executor with the specified concurrency limit (at least 1).
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1), // Ensure at least 1
        }
    }

    /// Create an executor sized to the number of available CPU cores.
    pub fn with_available_parallelism() -> Self {
        let concurrency = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(DEFAULT_MAX_CONCURRENCY_FALLBACK);
        Self::new(concurrency)
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Run `op` for every item and return `(item, result)` pairs in input order.
    ///
    /// `op` is called once per item up front to build its future; the future
    /// itself does not start until a permit is available, so it must not do
    /// its work eagerly inside `op`.
    ///
    /// Tasks live in a [`JoinSet`]: dropping the returned future before it
    /// settles aborts every task still queued or running.
    pub async fn run_all<K, T, E, F, Fut>(
        &self,
        items: Vec<K>,
        mut op: F,
    ) -> Vec<(K, Result<T, TaskFailure<E>>)>
    where
        K: Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
        F: FnMut(&K) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();
        let mut positions: HashMap<Id, usize> = HashMap::with_capacity(items.len());

        for (position, item) in items.iter().enumerate() {
            let operation = op(item);
            let semaphore_clone = semaphore.clone();

            let handle = tasks.spawn(
                async move {
                    let _permit = match semaphore_clone.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => {
                            return Err(TaskFailure::Panicked(format!(
                                "concurrency gate closed: {}",
                                e
                            )))
                        }
                    };
                    operation.await.map_err(TaskFailure::<E>::Failed)
                }
                .in_current_span(),
            );

            positions.insert(handle.id(), position);
        }

        // Settle in completion order; a join error is recorded against its own item
        let mut settled: Vec<Option<Result<T, TaskFailure<E>>>> =
            items.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next_with_id().await {
            let (id, result) = match joined {
                Ok((id, result)) => (id, result),
                Err(join_error) => (
                    join_error.id(),
                    Err(TaskFailure::Panicked(describe_join_error(join_error))),
                ),
            };
            if let Some(&position) = positions.get(&id) {
                settled[position] = Some(result);
            }
        }

        items
            .into_iter()
            .zip(settled)
            .map(|(item, result)| {
                let result = result
                    .unwrap_or_else(|| Err(TaskFailure::Panicked("task result lost".to_string())));
                (item, result)
            })
            .collect()
    }
}

fn describe_join_error(join_error: JoinError) -> String {
    if join_error.is_panic() {
        panic_message(join_error.into_panic())
    } else {
        join_error.to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

//! The two ways this crate talks to many servers: ask everyone and wait (bounded), or ask one at a
//! time until someone says yes.

use futures::future::join_all;
use std::future::Future;
use tokio::time::Duration;

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum FanoutError<E: std::error::Error + 'static> {
    #[error("{0}")]
    Failed(#[source] E),
    #[error("timed out")]
    TimedOut,
}

/// Runs `call` for every item concurrently, each bounded by `timeout`, and waits for all of them.
/// Outcomes are returned in input order. A timed-out call is reported, never awaited further.
pub async fn wait_all_with_timeout<K, F, Fut, T, E>(
    items: Vec<K>,
    timeout: Duration,
    call: F,
) -> Vec<(K, Result<T, FanoutError<E>>)>
where
    K: Clone,
    F: Fn(K) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error + 'static,
{
    let calls = items.into_iter().map(|item| {
        let call_future = call(item.clone());
        async move {
            let outcome = match tokio::time::timeout(timeout, call_future).await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => Err(FanoutError::Failed(e)),
                Err(_elapsed) => Err(FanoutError::TimedOut),
            };
            (item, outcome)
        }
    });

    join_all(calls).await
}

/// Outcome of trying items one at a time: the winner, if any, and every failure before it.
#[derive(Debug, Eq, PartialEq)]
pub struct Attempts<K, T, E> {
    pub success: Option<(K, T)>,
    pub failures: Vec<(K, E)>,
}

/// Tries `call` on each item in order and stops at the first success.
pub async fn first_success<K, F, Fut, T, E>(items: Vec<K>, mut call: F) -> Attempts<K, T, E>
where
    K: Clone,
    F: FnMut(K) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut failures = Vec::with_capacity(items.len());
    for item in items {
        match call(item.clone()).await {
            Ok(value) => {
                return Attempts {
                    success: Some((item, value)),
                    failures,
                }
            }
            Err(e) => failures.push((item, e)),
        }
    }

    Attempts {
        success: None,
        failures,
    }
}

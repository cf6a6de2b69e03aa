use std::future::Future;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::Semaphore;

use super::types::TaskResult;

/// Drive one stage's task futures with bounded concurrency.
///
/// At most `max_in_flight` futures run at once; the rest queue and are
/// dispatched as slots free. The call returns only after every future has
/// settled, which is what gives the engine its inter-stage read barrier.
/// Results are returned in completion order; callers key them by task id.
pub async fn run_bounded<Fut>(futures: Vec<Fut>, max_in_flight: usize) -> Vec<TaskResult>
where
    Fut: Future<Output = TaskResult>,
{
    let semaphore = Semaphore::new(max_in_flight.max(1));

    let mut in_flight: FuturesUnordered<_> = futures
        .into_iter()
        .map(|fut| {
            let semaphore = &semaphore;
            async move {
                // The semaphore lives for the whole call and is never
                // closed, so acquisition only fails if that changes.
                let _permit = semaphore.acquire().await.ok();
                fut.await
            }
        })
        .collect();

    let mut results = Vec::with_capacity(in_flight.len());
    while let Some(result) = in_flight.next().await {
        results.push(result);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn runs_everything_and_respects_the_bound() {
        let in_flight = AtomicUsize::new(0);
        let max_seen = AtomicUsize::new(0);

        let futures: Vec<_> = (0..8)
            .map(|i| {
                let in_flight = &in_flight;
                let max_seen = &max_seen;
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    TaskResult::succeeded(format!("t{i}"), json!(i), Utc::now(), 10, 1)
                }
            })
            .collect();

        let results = run_bounded(futures, 3).await;
        assert_eq!(results.len(), 8);
        assert!(max_seen.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn zero_limit_is_treated_as_one() {
        let futures = vec![async { TaskResult::succeeded("t0", json!(0), Utc::now(), 0, 1) }];
        let results = run_bounded(futures, 0).await;
        assert_eq!(results.len(), 1);
    }
}

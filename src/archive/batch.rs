//! Batched execution with bounded concurrency.

use futures::future::join_all;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Run `op` over `items` in batches of `batch_size`.
///
/// Items within a batch run concurrently; batches run one after another with
/// `delay` between them. Results come back in input order.
pub async fn run_batched<'a, I, T, F, Fut>(
    items: &'a [I],
    batch_size: usize,
    delay: Duration,
    op: F,
) -> Vec<T>
where
    F: Fn(&'a I) -> Fut,
    Fut: Future<Output = T>,
{
    let mut results = Vec::with_capacity(items.len());

    for (index, batch) in items.chunks(batch_size.max(1)).enumerate() {
        if index > 0 && !delay.is_zero() {
            sleep(delay).await;
        }
        results.extend(join_all(batch.iter().map(&op)).await);
    }

    results
}

//! Bounded worker pool for one level of the cascade.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

use crate::error::{EngineError, Result};

/// Output of one job: its value, or the panic message if it panicked.
pub(crate) type JobResult<T> = std::result::Result<T, String>;

/// Run `jobs` concurrently with at most `limit` in flight.
///
/// Returns outputs in the same order as `jobs`, and only once every job has
/// finished. That is the barrier between levels. A panicking job is
/// contained to its own slot.
pub(crate) async fn run_bounded<T, F>(jobs: Vec<F>, limit: usize) -> Result<Vec<JobResult<T>>>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut tasks = JoinSet::new();
    let count = jobs.len();

    for (slot, job) in jobs.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let output = tokio::spawn(job).await.map_err(panic_message);
            (slot, output)
        });
    }

    let mut outputs: Vec<Option<JobResult<T>>> = (0..count).map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        let (slot, output) = joined.map_err(|e| EngineError::Worker(e.to_string()))?;
        outputs[slot] = Some(output);
    }

    outputs
        .into_iter()
        .map(|output| output.ok_or_else(|| EngineError::Worker("job produced no output".into())))
        .collect()
}

fn panic_message(error: JoinError) -> String {
    if !error.is_panic() {
        return error.to_string();
    }
    let payload = error.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "job panicked".to_string()
    }
}

/*!
 * Wave-based task scheduling for part uploads.
 *
 * Tasks run in consecutive waves of at most K: every task in a wave is
 * launched concurrently, and the next wave does not start until the whole
 * wave has settled. This is a bulkhead, not a work-stealing pool - a slot
 * freed by a fast task is not refilled mid-wave. The first failure in a
 * settled wave stops scheduling and propagates (fail-fast); completed
 * earlier waves are not rolled back.
 */

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future;
use log::debug;

use crate::errors::UploadError;

/// Cooperative cancellation handle shared between a session and its caller.
///
/// Cancelling prevents new waves from starting; tasks already in flight run
/// to completion or natural failure.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a new, un-cancelled flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs an ordered list of fallible tasks in fixed-size concurrent waves
#[derive(Debug, Clone)]
pub struct WaveScheduler {
    /// Maximum number of tasks in flight at once
    concurrency: usize,
}

impl WaveScheduler {
    /// Create a scheduler with the given concurrency cap
    pub fn new(concurrency: usize) -> Self {
        assert!(concurrency >= 1, "concurrency cap must be at least 1");
        Self { concurrency }
    }

    /// The configured concurrency cap
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run all tasks, at most `concurrency` at a time, preserving order.
    ///
    /// Returns the task outputs in input order, or the first error observed
    /// in the first wave that failed. The failing wave settles completely
    /// before the error propagates, so no task is abandoned mid-flight.
    pub async fn run<T, Fut>(
        &self,
        tasks: Vec<Fut>,
        cancel: &CancelFlag,
    ) -> Result<Vec<T>, UploadError>
    where
        Fut: Future<Output = Result<T, UploadError>>,
    {
        let total = tasks.len();
        let mut results = Vec::with_capacity(total);
        let mut remaining = tasks.into_iter();
        let mut wave_index = 0usize;

        loop {
            let wave: Vec<Fut> = remaining.by_ref().take(self.concurrency).collect();
            if wave.is_empty() {
                break;
            }

            if cancel.is_cancelled() {
                debug!("Cancellation requested before wave {}", wave_index + 1);
                return Err(UploadError::Cancelled);
            }

            debug!(
                "Launching wave {} with {} task(s) ({}/{} settled)",
                wave_index + 1,
                wave.len(),
                results.len(),
                total
            );

            // The whole wave settles before any error is inspected
            let settled = future::join_all(wave).await;
            for outcome in settled {
                results.push(outcome?);
            }

            wave_index += 1;
        }

        Ok(results)
    }
}

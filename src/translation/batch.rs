/*!
 * Adaptive batch processing.
 *
 * A generic, resumable batch stepper over an ordered item list. The batch
 * size halves when the work function fails and returns to its initial value
 * after a run of consecutive successes; at minimum size a failing batch is
 * handed to an infallible fallback so the run always terminates. Exactly one
 * batch is in flight at a time - the next batch size is a function of the
 * previous batch's outcome.
 */

use std::ops::Range;
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use log::{debug, warn};

/// Batch sizing parameters, immutable per run
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Batch size used while the backend is healthy
    pub initial_size: usize,

    /// Smallest batch size the processor will shrink to
    pub min_size: usize,

    /// Consecutive successes required to restore the initial size
    pub required_successes: u32,

    /// Delay between settled batches in milliseconds
    pub retry_delay_ms: u64,
}

impl BatchConfig {
    /// Check the `1 <= min_size <= initial_size` invariant
    pub fn validate(&self) -> Result<()> {
        if self.min_size < 1 {
            bail!("minimum batch size must be at least 1");
        }
        if self.min_size > self.initial_size {
            bail!(
                "minimum batch size ({}) cannot exceed initial batch size ({})",
                self.min_size,
                self.initial_size
            );
        }
        Ok(())
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            initial_size: 50,
            min_size: 1,
            required_successes: 3,
            retry_delay_ms: 1000,
        }
    }
}

/// Mutable cursor state of one processing run.
///
/// Owned exclusively by one processor instance; never share it across
/// concurrent runs over the same items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRunState {
    /// Index of the first unprocessed item
    pub cursor: usize,

    /// Batch size the next step will attempt
    pub current_batch_size: usize,

    /// Successes observed since the last failure
    pub consecutive_successes: u32,
}

impl BatchRunState {
    fn new(config: &BatchConfig) -> Self {
        Self {
            cursor: 0,
            current_batch_size: config.initial_size,
            consecutive_successes: 0,
        }
    }
}

/// Work and fallback functions driving the processor.
///
/// `process` may fail; `fallback` may not - it is the terminal recovery for
/// a batch that keeps failing at minimum size, and must produce an output
/// the consumer can accept in place of the real one.
#[async_trait]
pub trait BatchWorker<T: Sync>: Send + Sync {
    /// Result type yielded per settled batch
    type Output: Send;

    /// Process one batch
    async fn process(&self, batch: &[T]) -> Result<Self::Output>;

    /// Produce the safe default output for an unprocessable batch
    async fn fallback(&self, batch: &[T]) -> Self::Output;
}

/// Outcome of one processor step
#[derive(Debug)]
pub enum BatchStep<R> {
    /// The batch succeeded; the cursor advanced past `range`
    Completed {
        /// Item range this batch covered
        range: Range<usize>,
        /// The work function's output
        output: R,
    },

    /// The batch failed at minimum size and the fallback output was
    /// accepted; the cursor advanced past `range` regardless
    Recovered {
        /// Item range this batch covered
        range: Range<usize>,
        /// The fallback output
        output: R,
    },

    /// The batch failed above minimum size; the same items will be retried
    /// at `batch_size` on the next step
    Shrunk {
        /// Batch size the next step will use
        batch_size: usize,
    },

    /// All items have been processed
    Done,
}

/// Pull-based adaptive batch stepper over a borrowed item list
pub struct AdaptiveBatchProcessor<'a, T, W>
where
    T: Sync,
    W: BatchWorker<T>,
{
    items: &'a [T],
    worker: &'a W,
    config: BatchConfig,
    state: BatchRunState,
}

impl<'a, T, W> AdaptiveBatchProcessor<'a, T, W>
where
    T: Sync,
    W: BatchWorker<T>,
{
    /// Create a processor over `items`, validating the config
    pub fn new(items: &'a [T], worker: &'a W, config: BatchConfig) -> Result<Self> {
        config.validate()?;
        let state = BatchRunState::new(&config);
        Ok(Self {
            items,
            worker,
            config,
            state,
        })
    }

    /// Current cursor state
    pub fn state(&self) -> &BatchRunState {
        &self.state
    }

    /// Whether the run has consumed every item
    pub fn is_done(&self) -> bool {
        self.state.cursor >= self.items.len()
    }

    /// Execute one step: attempt the batch at the current cursor.
    ///
    /// Suspends at the work-function call and at the inter-batch delay.
    /// Consumers may simply stop calling `step` to cancel; a call already
    /// in flight cannot be interrupted.
    pub async fn step(&mut self) -> BatchStep<W::Output> {
        if self.is_done() {
            return BatchStep::Done;
        }

        let start = self.state.cursor;
        let end = (start + self.state.current_batch_size).min(self.items.len());
        let batch = &self.items[start..end];

        match self.worker.process(batch).await {
            Ok(output) => {
                self.state.cursor = end;
                self.state.consecutive_successes += 1;

                if self.state.current_batch_size < self.config.initial_size
                    && self.state.consecutive_successes >= self.config.required_successes
                {
                    debug!(
                        "Restoring batch size to {} after {} consecutive successes",
                        self.config.initial_size, self.state.consecutive_successes
                    );
                    self.state.current_batch_size = self.config.initial_size;
                    self.state.consecutive_successes = 0;
                }

                self.pause_between_batches().await;

                BatchStep::Completed {
                    range: start..end,
                    output,
                }
            }
            Err(e) => {
                self.state.consecutive_successes = 0;

                if self.state.current_batch_size > self.config.min_size {
                    let halved = (self.state.current_batch_size / 2).max(self.config.min_size);
                    warn!(
                        "Batch of {} item(s) failed ({}); retrying at size {}",
                        end - start,
                        e,
                        halved
                    );
                    self.state.current_batch_size = halved;
                    BatchStep::Shrunk { batch_size: halved }
                } else {
                    warn!(
                        "Batch of {} item(s) failed at minimum size ({}); accepting fallback output",
                        end - start,
                        e
                    );
                    let output = self.worker.fallback(batch).await;
                    self.state.cursor = end;
                    BatchStep::Recovered {
                        range: start..end,
                        output,
                    }
                }
            }
        }
    }

    async fn pause_between_batches(&self) {
        if !self.is_done() && self.config.retry_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
        }
    }
}

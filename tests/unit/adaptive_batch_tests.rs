/*!
 * Tests for the adaptive batch processor
 *
 * Batch size halves (floored, clamped to the minimum) on failure without
 * advancing the cursor, returns to the initial size after enough
 * consecutive successes, and at minimum size a failing batch is absorbed
 * by the fallback so the run always terminates.
 */

use anyhow::{Result, bail};
use async_trait::async_trait;
use parking_lot::Mutex;

use lingoflow::translation::{AdaptiveBatchProcessor, BatchConfig, BatchStep, BatchWorker};

/// Worker echoing batches, scripted to fail on demand
#[derive(Default)]
struct ScriptedWorker {
    /// Fail this many process calls before succeeding
    fail_first: Mutex<usize>,
    /// Fail any batch containing this value
    poison: Option<i32>,
    /// (first item, batch len) per process call, in order
    calls: Mutex<Vec<(Option<i32>, usize)>>,
}

impl ScriptedWorker {
    fn failing_first(n: usize) -> Self {
        Self {
            fail_first: Mutex::new(n),
            ..Self::default()
        }
    }

    fn poisoned(value: i32) -> Self {
        Self {
            poison: Some(value),
            ..Self::default()
        }
    }

    fn batch_sizes(&self) -> Vec<usize> {
        self.calls.lock().iter().map(|(_, len)| *len).collect()
    }
}

#[async_trait]
impl BatchWorker<i32> for ScriptedWorker {
    type Output = Vec<i32>;

    async fn process(&self, batch: &[i32]) -> Result<Self::Output> {
        self.calls.lock().push((batch.first().copied(), batch.len()));

        {
            let mut remaining = self.fail_first.lock();
            if *remaining > 0 {
                *remaining -= 1;
                bail!("scripted failure");
            }
        }

        if let Some(poison) = self.poison {
            if batch.contains(&poison) {
                bail!("scripted failure: batch contains {}", poison);
            }
        }

        Ok(batch.to_vec())
    }

    async fn fallback(&self, batch: &[i32]) -> Self::Output {
        // Negate so tests can tell fallback output from real output
        batch.iter().map(|v| -v).collect()
    }
}

fn config(initial: usize, min: usize, required: u32) -> BatchConfig {
    BatchConfig {
        initial_size: initial,
        min_size: min,
        required_successes: required,
        retry_delay_ms: 0,
    }
}

/// Drive a processor to completion, returning every yielded output
async fn drain(
    processor: &mut AdaptiveBatchProcessor<'_, i32, ScriptedWorker>,
) -> Vec<BatchStep<Vec<i32>>> {
    let mut steps = Vec::new();
    loop {
        match processor.step().await {
            BatchStep::Done => break,
            step => steps.push(step),
        }
    }
    steps
}

#[tokio::test]
async fn test_step_withNoFailures_shouldBatchAs50_50_20() {
    let items: Vec<i32> = (1..=120).collect();
    let worker = ScriptedWorker::default();
    let mut processor =
        AdaptiveBatchProcessor::new(&items, &worker, config(50, 1, 3)).unwrap();

    let steps = drain(&mut processor).await;

    assert_eq!(worker.batch_sizes(), vec![50, 50, 20]);
    assert_eq!(steps.len(), 3);
    assert!(steps.iter().all(|s| matches!(s, BatchStep::Completed { .. })));
}

#[tokio::test]
async fn test_step_onFailure_shouldHalveSizeWithoutAdvancingCursor() {
    let items: Vec<i32> = (1..=100).collect();
    let worker = ScriptedWorker::failing_first(1);
    let mut processor =
        AdaptiveBatchProcessor::new(&items, &worker, config(40, 5, 3)).unwrap();

    let step = processor.step().await;
    assert!(matches!(step, BatchStep::Shrunk { batch_size: 20 }));
    assert_eq!(processor.state().cursor, 0, "cursor must not advance");

    let step = processor.step().await;
    assert!(matches!(step, BatchStep::Completed { .. }));

    // Same items re-presented at the smaller size
    let calls = worker.calls.lock().clone();
    assert_eq!(calls[0], (Some(1), 40));
    assert_eq!(calls[1], (Some(1), 20));
}

#[tokio::test]
async fn test_step_halving_shouldFloorButClampAtMinSize() {
    let items: Vec<i32> = (1..=50).collect();
    let worker = ScriptedWorker::failing_first(2);
    let mut processor =
        AdaptiveBatchProcessor::new(&items, &worker, config(9, 3, 3)).unwrap();

    // 9 -> 4 (floor) -> clamped to 3
    assert!(matches!(
        processor.step().await,
        BatchStep::Shrunk { batch_size: 4 }
    ));
    assert!(matches!(
        processor.step().await,
        BatchStep::Shrunk { batch_size: 3 }
    ));
    assert_eq!(processor.state().current_batch_size, 3);
}

#[tokio::test]
async fn test_step_afterRequiredSuccesses_shouldRestoreInitialSize() {
    let items: Vec<i32> = (1..=100).collect();
    let worker = ScriptedWorker::failing_first(1);
    let mut processor =
        AdaptiveBatchProcessor::new(&items, &worker, config(8, 1, 2)).unwrap();

    // Fail once: 8 -> 4
    assert!(matches!(processor.step().await, BatchStep::Shrunk { batch_size: 4 }));

    // Two consecutive successes restore the initial size exactly
    assert!(matches!(processor.step().await, BatchStep::Completed { .. }));
    assert_eq!(processor.state().current_batch_size, 4);
    assert!(matches!(processor.step().await, BatchStep::Completed { .. }));
    assert_eq!(processor.state().current_batch_size, 8);
    assert_eq!(processor.state().consecutive_successes, 0);

    // And the next batch actually uses it
    assert!(matches!(processor.step().await, BatchStep::Completed { .. }));
    assert_eq!(*worker.batch_sizes().last().unwrap(), 8);
}

#[tokio::test]
async fn test_step_failingAtMinSize_shouldFallBackAndAdvance() {
    let items: Vec<i32> = (1..=4).collect();
    let worker = ScriptedWorker::poisoned(2);
    let mut processor =
        AdaptiveBatchProcessor::new(&items, &worker, config(1, 1, 3)).unwrap();

    // Item 1 succeeds; item 2 is poisoned and falls back; 3 and 4 succeed
    let steps = drain(&mut processor).await;

    assert_eq!(steps.len(), 4);
    match &steps[1] {
        BatchStep::Recovered { range, output } => {
            assert_eq!(*range, 1..2);
            assert_eq!(output, &vec![-2]);
        }
        other => panic!("expected Recovered for item 2, got {:?}", other),
    }
    assert!(processor.is_done());
}

#[tokio::test]
async fn test_step_withAlwaysFailingWorker_shouldTerminateViaFallbacks() {
    let items: Vec<i32> = (1..=10).collect();
    let worker = ScriptedWorker::failing_first(usize::MAX);
    let mut processor =
        AdaptiveBatchProcessor::new(&items, &worker, config(4, 1, 3)).unwrap();

    let steps = drain(&mut processor).await;

    // Every item ends up in some fallback batch, so the run terminates
    let recovered: usize = steps
        .iter()
        .filter_map(|s| match s {
            BatchStep::Recovered { range, .. } => Some(range.len()),
            _ => None,
        })
        .sum();
    assert_eq!(recovered, 10);
    assert!(processor.is_done());
}

#[tokio::test]
async fn test_step_withEmptyItems_shouldBeDoneImmediately() {
    let items: Vec<i32> = Vec::new();
    let worker = ScriptedWorker::default();
    let mut processor =
        AdaptiveBatchProcessor::new(&items, &worker, config(4, 1, 3)).unwrap();

    assert!(matches!(processor.step().await, BatchStep::Done));
    assert_eq!(worker.batch_sizes().len(), 0);
}

#[tokio::test]
async fn test_new_withInvalidConfig_shouldFail() {
    let items: Vec<i32> = (1..=4).collect();
    let worker = ScriptedWorker::default();

    let result = AdaptiveBatchProcessor::new(&items, &worker, config(2, 5, 3));
    assert!(result.is_err());
}

#[tokio::test]
async fn test_step_finalShortBatch_shouldOnlyTakeRemainingItems() {
    let items: Vec<i32> = (1..=7).collect();
    let worker = ScriptedWorker::default();
    let mut processor =
        AdaptiveBatchProcessor::new(&items, &worker, config(5, 1, 3)).unwrap();

    drain(&mut processor).await;

    assert_eq!(worker.batch_sizes(), vec![5, 2]);
}

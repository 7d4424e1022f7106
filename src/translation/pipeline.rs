/*!
 * Sentence translation pipeline.
 *
 * Drives a task's sentences through the adaptive batch processor: the work
 * function frames a batch as a positional JSON map, calls the translation
 * backend, validates the returned cardinality, and persists every item
 * before the cursor advances. Batches that keep failing at minimum size
 * degrade to identity output - the raw text is stored as the translation -
 * so the run always terminates. Sentences that already carry a translation
 * are skipped on load, making interrupted runs resumable.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result, anyhow, bail};
use futures_util::stream::{self, StreamExt};
use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::errors::TranslationError;
use crate::providers::TranslationBackend;
use crate::store::{SentenceRecord, SentenceStore};

use super::batch::{AdaptiveBatchProcessor, BatchConfig, BatchStep, BatchWorker};
use super::prompts::{self, PromptTemplate};

/// How many persistence writes a settled batch issues concurrently
const PERSIST_CONCURRENCY: usize = 8;

/// Cumulative progress reported after each settled batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineProgress {
    /// Sentences carrying a translation so far, fallback included
    pub translated: usize,

    /// Total sentences in the task
    pub total: usize,
}

/// One sentence's outcome within a settled batch
#[derive(Debug, Clone)]
pub struct TranslatedSentence {
    /// Record id in the sentence store
    pub id: String,

    /// Position within the task's transcript
    pub index: i64,

    /// The text that was stored as the translation
    pub text: String,

    /// Whether the identity fallback produced this text
    pub via_fallback: bool,
}

/// Summary of a finished pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// Total sentences in the task
    pub total: usize,

    /// Sentences already translated before this run started
    pub skipped: usize,

    /// Sentences translated by the backend during this run
    pub translated: usize,

    /// Sentences that degraded to identity output
    pub fallback: usize,

    /// Settled batches, fallback batches included
    pub batches: usize,

    /// Times the batch size was halved
    pub shrink_events: usize,
}

/// Settings for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Source language name or code, used in the system prompt
    pub source_language: String,

    /// Target language name or code, used in the system prompt
    pub target_language: String,

    /// Batch sizing parameters
    pub batch: BatchConfig,

    /// System prompt template
    pub template: PromptTemplate,
}

impl PipelineSettings {
    /// Create settings for a language pair with default batching
    pub fn new(source_language: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            source_language: source_language.into(),
            target_language: target_language.into(),
            batch: BatchConfig::default(),
            template: PromptTemplate::default(),
        }
    }
}

/// Translates the sentences of one task through a pluggable backend
pub struct TranslationPipeline {
    backend: Arc<dyn TranslationBackend>,
    store: Arc<dyn SentenceStore>,
    settings: PipelineSettings,
}

impl TranslationPipeline {
    /// Create a pipeline over the given backend and store
    pub fn new(
        backend: Arc<dyn TranslationBackend>,
        store: Arc<dyn SentenceStore>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            backend,
            store,
            settings,
        }
    }

    /// Translate every pending sentence of `task_id`.
    ///
    /// Progress is reported after each settled batch as cumulative counts
    /// over the whole task, so a resumed run starts from the baseline of
    /// already-translated sentences rather than zero.
    pub async fn run<F>(&self, task_id: &str, on_progress: F) -> Result<PipelineReport>
    where
        F: Fn(PipelineProgress) + Send + Sync + 'static,
    {
        let sentences = self
            .store
            .list_by_task(task_id)
            .await
            .with_context(|| format!("failed to load sentences for task '{}'", task_id))?;

        let total = sentences.len();
        let mut pending: Vec<SentenceRecord> =
            sentences.into_iter().filter(|s| s.is_pending()).collect();
        // The store returns rows ordered by index; keep that order inviolate
        pending.sort_by_key(|s| s.index);

        let skipped = total - pending.len();
        if skipped > 0 {
            info!(
                "Task '{}': resuming with {} of {} sentence(s) already translated",
                task_id, skipped, total
            );
        }

        let mut report = PipelineReport {
            total,
            skipped,
            ..PipelineReport::default()
        };

        if pending.is_empty() {
            on_progress(PipelineProgress {
                translated: total,
                total,
            });
            return Ok(report);
        }

        let worker = SentenceBatchWorker {
            backend: Arc::clone(&self.backend),
            store: Arc::clone(&self.store),
            system_prompt: self
                .settings
                .template
                .render(&self.settings.source_language, &self.settings.target_language),
            progress: AtomicUsize::new(skipped),
            total,
            on_progress: Box::new(on_progress),
            store_failure: Mutex::new(None),
        };

        let mut processor =
            AdaptiveBatchProcessor::new(&pending, &worker, self.settings.batch.clone())?;

        loop {
            let step = processor.step().await;

            // A persistence failure for accepted output is a store problem,
            // not a translation problem: shrinking and re-translating would
            // risk double writes, so the run stops here instead
            if let Some(reason) = worker.store_failure.lock().take() {
                bail!("failed to persist translated batch: {}", reason);
            }

            match step {
                BatchStep::Completed { output, .. } => {
                    report.batches += 1;
                    report.translated += output.len();
                }
                BatchStep::Recovered { output, .. } => {
                    report.batches += 1;
                    report.fallback += output.len();
                }
                BatchStep::Shrunk { .. } => {
                    report.shrink_events += 1;
                }
                BatchStep::Done => break,
            }
        }

        info!(
            "Task '{}': {} translated, {} fallback, {} skipped ({} batch(es), {} shrink(s))",
            task_id,
            report.translated,
            report.fallback,
            report.skipped,
            report.batches,
            report.shrink_events
        );

        Ok(report)
    }
}

/// Batch worker binding the backend, the store and progress accounting
struct SentenceBatchWorker {
    backend: Arc<dyn TranslationBackend>,
    store: Arc<dyn SentenceStore>,
    system_prompt: String,
    progress: AtomicUsize,
    total: usize,
    on_progress: Box<dyn Fn(PipelineProgress) + Send + Sync>,
    /// Set when accepted output could not be persisted; checked by the run
    /// loop after every step
    store_failure: Mutex<Option<String>>,
}

impl SentenceBatchWorker {
    /// Persist a batch's results concurrently; writes are independent rows.
    /// Returns the first error, after every write has been issued.
    async fn persist_all(&self, outputs: &[TranslatedSentence]) -> Result<()> {
        let pending: Vec<(String, String)> = outputs
            .iter()
            .map(|item| (item.id.clone(), item.text.clone()))
            .collect();
        let results: Vec<Result<()>> = stream::iter(pending)
            .map(|(id, text)| {
                let store = Arc::clone(&self.store);
                async move { store.update_translation(&id, &text).await }
            })
            .buffer_unordered(PERSIST_CONCURRENCY)
            .collect()
            .await;

        for result in results {
            result?;
        }
        Ok(())
    }

    fn bump_progress(&self, settled: usize) {
        let translated = self.progress.fetch_add(settled, Ordering::SeqCst) + settled;
        (self.on_progress)(PipelineProgress {
            translated,
            total: self.total,
        });
    }
}

#[async_trait::async_trait]
impl BatchWorker<SentenceRecord> for SentenceBatchWorker {
    type Output = Vec<TranslatedSentence>;

    async fn process(&self, batch: &[SentenceRecord]) -> Result<Self::Output> {
        let texts: Vec<&str> = batch.iter().map(|s| s.raw_text.as_str()).collect();
        let user_prompt = prompts::build_user_prompt(&texts);

        let translation = self
            .backend
            .translate(&self.system_prompt, &user_prompt)
            .await
            .map_err(TranslationError::Provider)?;

        // The backend must return exactly one entry per batch position; a
        // shape mismatch is indistinguishable from a garbled response and
        // is handled by the same shrink-and-retry path as a transport error
        if translation.output.len() != batch.len() {
            return Err(TranslationError::BatchShapeMismatch {
                expected: batch.len(),
                got: translation.output.len(),
            }
            .into());
        }

        let mut outputs = Vec::with_capacity(batch.len());
        for (position, sentence) in batch.iter().enumerate() {
            let text = translation
                .output
                .get(&position.to_string())
                .ok_or_else(|| anyhow!("missing key '{}' in translated batch", position))?;
            outputs.push(TranslatedSentence {
                id: sentence.id.clone(),
                index: sentence.index,
                text: text.clone(),
                via_fallback: false,
            });
        }

        if let Err(e) = self.persist_all(&outputs).await {
            *self.store_failure.lock() = Some(e.to_string());
            return Err(e);
        }
        self.bump_progress(outputs.len());

        debug!("Translated batch of {} sentence(s)", outputs.len());
        Ok(outputs)
    }

    async fn fallback(&self, batch: &[SentenceRecord]) -> Self::Output {
        let mut outputs = Vec::with_capacity(batch.len());

        for sentence in batch {
            // Identity fallback: store the raw text so the run can finish.
            // A failed write here must not abort the run; one sentence's
            // storage failure is logged and swallowed.
            if let Err(e) = self
                .store
                .update_translation(&sentence.id, &sentence.raw_text)
                .await
            {
                warn!(
                    "Failed to persist fallback for sentence '{}': {}",
                    sentence.id, e
                );
            }
            outputs.push(TranslatedSentence {
                id: sentence.id.clone(),
                index: sentence.index,
                text: sentence.raw_text.clone(),
                via_fallback: true,
            });
        }

        self.bump_progress(outputs.len());
        outputs
    }
}
